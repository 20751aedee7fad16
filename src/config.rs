use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::{intake::DEFAULT_MAX_SKIDS, runtime::handle::RuntimeConfig};

/// Path value selecting an ephemeral in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: PathBuf,
    pub vendor_file: PathBuf,
    pub log_level: String,
    pub verify_scan_checksum: bool,
    pub max_skids_per_batch: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let listen_addr = std::env::var("SKIDLOG_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("invalid SKIDLOG_LISTEN_ADDR")?;

        let db_path = std::env::var("SKIDLOG_DB_PATH")
            .unwrap_or_else(|_| "skidlog.db".to_string())
            .into();

        let vendor_file = std::env::var("SKIDLOG_VENDOR_FILE")
            .unwrap_or_else(|_| "vendor.csv".to_string())
            .into();

        let log_level = std::env::var("SKIDLOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let verify_scan_checksum = std::env::var("SKIDLOG_VERIFY_SCAN_CHECKSUM")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let max_skids_per_batch = match std::env::var("SKIDLOG_MAX_SKIDS") {
            Ok(v) => v.parse().context("invalid SKIDLOG_MAX_SKIDS")?,
            Err(_) => DEFAULT_MAX_SKIDS,
        };

        Ok(Self {
            listen_addr,
            db_path,
            vendor_file,
            log_level,
            verify_scan_checksum,
            max_skids_per_batch,
        })
    }

    pub fn in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_DB
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            verify_scan_checksum: self.verify_scan_checksum,
            max_skids_per_batch: self.max_skids_per_batch,
            ..RuntimeConfig::default()
        }
    }
}
