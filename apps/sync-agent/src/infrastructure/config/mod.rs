//! Configuration Module
//!
//! Configuration loading for the sync agent.

mod settings;

pub use settings::{AgentConfig, ConfigError, ReconnectSettings, SessionToken};
