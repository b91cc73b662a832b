//! Runtime configuration, read from the environment (and `.env` if present).

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;

use crate::logging::LogFormat;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "accounts.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl ServerConfig {
    /// Load `.env`, then read `SERVER_HOST`, `SERVER_PORT`, `DATABASE_PATH`
    /// and `LOG_FORMAT`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid SERVER_PORT: {:?}", raw))?,
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port,
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow!("invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}
