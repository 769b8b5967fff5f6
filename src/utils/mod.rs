//! Utility functions and helpers.

pub mod http;
pub mod process;
pub mod url;
