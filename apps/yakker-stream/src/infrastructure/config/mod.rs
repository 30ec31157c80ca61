//! Configuration Module
//!
//! Environment-driven configuration for the stream server and dashboard.

mod settings;

pub use settings::{
    AuthValue, ConfigError, FeedSettings, MIN_CLI_REFRESH, OutputSettings, StreamConfig,
    extract_auth_value,
};
