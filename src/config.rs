//! Environment configuration loading and validation.
//!
//! Fails fast with a clear error message at startup rather than panicking
//! deep inside a handler if configuration is missing or malformed.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = env::var("DB_PATH").unwrap_or_else(|_| "./data".to_string());
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port_raw = env::var("SERVER_PORT").unwrap_or_else(|_| "36379".to_string());

        let port: u16 = port_raw
            .parse()
            .with_context(|| format!("invalid SERVER_PORT '{port_raw}': must be a number 0-65535"))?;

        Ok(Self { db_path, host, port })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn log(&self) {
        tracing::info!(
            db_path = %self.db_path,
            host = %self.host,
            port = self.port,
            "resolved configuration"
        );
    }
}
