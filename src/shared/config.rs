use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub max_retries: u32,
    pub probe_interval_secs: u64,
    pub probe_timeout_secs: u64,
    pub drain_on_reconnect: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                connection_timeout: 30,
            },
            remote: RemoteConfig {
                endpoint: "http://localhost:8000/api".to_string(),
                request_timeout_secs: 5,
            },
            sync: SyncConfig {
                max_retries: 3,
                probe_interval_secs: 30,
                probe_timeout_secs: 5,
                drain_on_reconnect: true,
            },
        }
    }
}

fn default_database_url() -> String {
    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join("fleetdesk");
    format!("sqlite:{}", dir.join("fleetdesk.db").display())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FLEETDESK_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v;
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_DATABASE_MAX_CONNECTIONS") {
            if let Some(value) = parse_u32(&v) {
                cfg.database.max_connections = value;
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_REMOTE_ENDPOINT") {
            if !v.trim().is_empty() {
                cfg.remote.endpoint = v.trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_REMOTE_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.request_timeout_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_SYNC_MAX_RETRIES") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.max_retries = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_PROBE_INTERVAL_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.probe_interval_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_PROBE_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.probe_timeout_secs = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("FLEETDESK_DRAIN_ON_RECONNECT") {
            cfg.sync.drain_on_reconnect = parse_bool(&v, cfg.sync.drain_on_reconnect);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.endpoint.trim().is_empty() {
            return Err("Remote endpoint must not be empty".to_string());
        }
        if self.remote.request_timeout_secs == 0 {
            return Err("Remote request_timeout_secs must be greater than 0".to_string());
        }
        if self.sync.max_retries == 0 {
            return Err("Sync max_retries must be greater than 0".to_string());
        }
        if self.sync.probe_interval_secs == 0 {
            return Err("Sync probe_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_connections_rejected() {
        let mut cfg = AppConfig::default();
        cfg.database.max_connections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool("yes", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("banana", true));
    }
}
