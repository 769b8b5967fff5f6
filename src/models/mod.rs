// src/models/mod.rs

//! Domain models for the channel statistics pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod channel;
mod config;
mod report;

// Re-export all public types
pub use channel::{ChannelInfo, ERROR_FOLLOWERS, ERROR_NAME, Platform, RegistrationStatus, UNKNOWN_NAME};
pub use config::{
    CacheConfig, Config, HttpConfig, InstagramConfig, ProcessorConfig, ScriptConfig,
    TelegramBackend, TelegramConfig, TgStatConfig,
};
pub use report::{ENGAGEMENT_HEADER, HEADER, Report, ResultRow, RunStats};
