// src/lib.rs

//! chanstat: channel statistics and registration status reports

pub mod cache;
pub mod enrichment;
pub mod error;
pub mod extractors;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod registration;
pub mod report;
pub mod utils;
