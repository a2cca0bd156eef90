/// Database configuration and connection management
pub mod database;

/// Commission rate loading from config.toml
pub mod commission;
