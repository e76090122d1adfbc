use std::env;
use anyhow::{Context, Result};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The port the server listens on.
    pub port: u16,
    /// How many coaches the stats endpoint reports.
    pub top_coaches_limit: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            top_coaches_limit: env::var("TOP_COACHES_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid TOP_COACHES_LIMIT")?,
        })
    }
}
