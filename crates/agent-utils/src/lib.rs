//! Shared utilities for agent-rs
//!
//! This crate provides common functionality used across the agent-rs workspace,
//! including logging setup, application configuration, and YAML loading.

pub mod config;
pub mod logging;
pub mod yaml;

pub use config::{Config, ConfigError, LogFormat};
pub use logging::{init_tracing, init_tracing_with};
pub use yaml::{load_yaml_file, parse_yaml};
