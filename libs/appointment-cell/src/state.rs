// libs/appointment-cell/src/state.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use shared_config::{AppConfig, StorageBackend};

use crate::store::{AppointmentStore, ClinicDirectory, InMemoryStore, SupabaseStore};

/// Store handles shared by every request.
#[derive(Clone)]
pub struct AppointmentState {
    pub appointments: Arc<dyn AppointmentStore>,
    pub directory: Arc<dyn ClinicDirectory>,
}

impl AppointmentState {
    pub fn new(appointments: Arc<dyn AppointmentStore>, directory: Arc<dyn ClinicDirectory>) -> Self {
        Self { appointments, directory }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self::new(store.clone(), store)
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        match config.storage_backend {
            StorageBackend::Supabase if config.is_supabase_configured() => {
                info!("Using Supabase storage at {}", config.supabase_url);
                let store = Arc::new(SupabaseStore::new(config));
                Ok(Self::new(store.clone(), store))
            }
            backend => {
                if backend == StorageBackend::Supabase {
                    warn!("Supabase storage requested but not configured, falling back to in-memory storage");
                }

                let store = match &config.seed_data_path {
                    Some(path) => InMemoryStore::from_seed_file(path)
                        .with_context(|| format!("Failed to load seed data from {}", path))?,
                    None => {
                        warn!("No SEED_DATA_PATH set, in-memory directory starts empty");
                        InMemoryStore::new()
                    }
                };

                info!("Using in-memory storage");
                Ok(Self::in_memory(Arc::new(store)))
            }
        }
    }
}
