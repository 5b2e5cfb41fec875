use std::{env, net::{SocketAddr, ToSocketAddrs as _}, path::PathBuf};

use sea_orm::ConnectOptions;
use thiserror::Error;
use tracing::info;

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    pub export_dir: PathBuf,
}

/// Read before the subscriber exists, so nothing here is logged
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub retention: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment `{0}` is required to be set")]
    Missing(&'static str),
    #[error("environment `{name}` is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

pub fn load_logging() -> Result<LogConfig, ConfigError> {
    let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

    let retention = match env::var("LOG_RETENTION") {
        Ok(var) => var.parse::<usize>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| ConfigError::Invalid { name: "LOG_RETENTION", reason: format!("`{var}` is not a positive number") })?,
        Err(_) => 14,
    };

    Ok(LogConfig { log_dir: log_dir.into(), retention })
}

pub fn load() -> Result<Config, ConfigError> {
    Ok(Config {
        host_address: load_host_address()?,
        database_opt: load_database_opt(),
        jwt_key: load_jwt_key()?,
        export_dir: load_export_dir(),
    })
}

fn load_host_address() -> Result<SocketAddr, ConfigError> {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    parse_host_address(&var)
}

/// The shell serves a single local front end, so anything but loopback is refused
fn parse_host_address(var: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid { name: "HOST_ADDRESS", reason };

    let address = var.to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid(format!("unable to resolve `{var}`")))?;

    if !address.ip().is_loopback() {
        return Err(invalid(format!("`{address}` is not a loopback address")));
    }

    Ok(address)
}

fn load_database_opt() -> ConnectOptions {
    info!("Loading environment `DATABASE_URL`");

    let var = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://payroll.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(var);
    options.max_connections(1);

    options
}

fn load_jwt_key() -> Result<String, ConfigError> {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))
}

fn load_export_dir() -> PathBuf {
    info!("Loading environment `EXPORT_DIR`");

    env::var("EXPORT_DIR").unwrap_or_else(|_| "exports".to_string()).into()
}
