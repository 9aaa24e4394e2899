use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which persistence backend the appointment store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub seed_data_path: Option<String>,
    pub server_host: IpAddr,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            seed_data_path: None,
            server_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|value| match value.parse::<StorageBackend>() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    warn!("{}, falling back to {}", e, defaults.storage_backend);
                    None
                }
            })
            .unwrap_or(defaults.storage_backend);

        let config = Self {
            storage_backend,
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    if storage_backend == StorageBackend::Supabase {
                        warn!("SUPABASE_URL not set, using empty value");
                    }
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    if storage_backend == StorageBackend::Supabase {
                        warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    }
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            seed_data_path: env::var("SEED_DATA_PATH").ok().filter(|p| !p.is_empty()),
            server_host: env::var("SERVER_HOST")
                .ok()
                .and_then(|host| {
                    host.parse().map_err(|_| warn!("SERVER_HOST '{}' is not an IP address, using default", host)).ok()
                })
                .unwrap_or(defaults.server_host),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| {
                    port.parse().map_err(|_| warn!("SERVER_PORT '{}' is not a port number, using default", port)).ok()
                })
                .unwrap_or(defaults.server_port),
        };

        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase backend selected but not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }
}
