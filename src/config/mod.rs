//! Configuration management for the server configurator
//!
//! A single TOML file holds window, logging, engine, export and HTTP server
//! settings. CLI flags override individual values at startup.

pub mod settings;

// Re-export commonly used types
pub use settings::Config;
