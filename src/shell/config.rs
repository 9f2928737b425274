// Application configuration read from `.env` and the process environment.
//
// HELLO_ROUTER_HOST          bind address of the management API (default 0.0.0.0)
// HELLO_ROUTER_PORT          port of the management API (default 8080)
// HELLO_ROUTER_BACKLOG_SIZE  events kept by the backlog tracer (default 100)

use crate::shared::infrastructure::engine::backlog::DEFAULT_BACKLOG_SIZE;
use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;

pub const HOST_KEY: &str = "HELLO_ROUTER_HOST";
pub const PORT_KEY: &str = "HELLO_ROUTER_PORT";
pub const BACKLOG_SIZE_KEY: &str = "HELLO_ROUTER_BACKLOG_SIZE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backlog_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            backlog_size: DEFAULT_BACKLOG_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = non_empty(&vars, HOST_KEY) {
            config.host = host.to_string();
        }
        if let Some(port) = non_empty(&vars, PORT_KEY) {
            config.port = parse(PORT_KEY, port)?;
        }
        if let Some(size) = non_empty(&vars, BACKLOG_SIZE_KEY) {
            config.backlog_size = parse(BACKLOG_SIZE_KEY, size)?;
            if config.backlog_size == 0 {
                return Err(ConfigError::Invalid {
                    key: BACKLOG_SIZE_KEY,
                    value: size.to_string(),
                });
            }
        }
        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: HOST_KEY,
                value: self.host.clone(),
            })
    }
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
