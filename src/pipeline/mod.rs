//! Link processing pipeline.
//!
//! - `processor`: the orchestrator turning links into ordered report rows
//! - `skip`: which links bypass the registration check
//! - `estimate`: rough processing time for a batch

pub mod estimate;
pub mod processor;
pub mod skip;

pub use estimate::estimate_processing_time;
pub use processor::LinkProcessor;
pub use skip::{SkipPolicy, SkipReason};
