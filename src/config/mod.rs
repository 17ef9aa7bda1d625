/// Database configuration and connection management
pub mod database;

/// Seed field definitions loaded from config.toml
pub mod fields;

/// Certificate document storage settings from environment variables
pub mod storage;
