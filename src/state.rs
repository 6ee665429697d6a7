use std::sync::Arc;
use std::time::Instant;

use crate::{
    config::{Config, StoreBackend},
    error::Result,
    middleware::rate_limit::RateLimiter,
    store::{
        BlobHandle, MemoryBlobStore, MemoryStore, RestBlobStore, RestStore, StoreHandle,
    },
};

/// Table clients at both privilege levels
///
/// `admin` uses the service key and bypasses row-level policies; `anon`
/// is subject to them. Public reads go through `anon`, user lookups and
/// writes behind a principal through `admin`.
#[derive(Clone)]
pub struct StoreClients {
    pub admin: StoreHandle,
    pub anon: StoreHandle,
}

/// Bucket clients, split the same way as [`StoreClients`].
#[derive(Clone)]
pub struct BlobClients {
    pub admin: BlobHandle,
    pub anon: BlobHandle,
}

/// Application state shared across all HTTP handlers
///
/// Everything here is immutable after startup except the rate-limit
/// windows, which live behind the limiter's own map.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: StoreClients,
    pub blobs: BlobClients,
    pub rate_limiter: Arc<RateLimiter>,
    /// Process start, reported as uptime by the health endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState from already constructed clients
    pub fn new(config: Config, stores: StoreClients, blobs: BlobClients) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        Self {
            config: Arc::new(config),
            stores,
            blobs,
            rate_limiter,
            started_at: Instant::now(),
        }
    }

    /// Builds the clients for the configured backend
    ///
    /// The memory backend shares one table map and one bucket between both
    /// privilege levels.
    pub fn from_config(config: Config) -> Result<Self> {
        let (stores, blobs) = match config.store.backend {
            StoreBackend::Rest => (
                StoreClients {
                    admin: Arc::new(RestStore::new(&config.store, true)?),
                    anon: Arc::new(RestStore::new(&config.store, false)?),
                },
                BlobClients {
                    admin: Arc::new(RestBlobStore::new(&config.store, true)?),
                    anon: Arc::new(RestBlobStore::new(&config.store, false)?),
                },
            ),
            StoreBackend::Memory => {
                let tables: StoreHandle = Arc::new(MemoryStore::with_default_tables());
                let bucket: BlobHandle =
                    Arc::new(MemoryBlobStore::new(&config.store.url, &config.store.bucket));
                (
                    StoreClients {
                        admin: Arc::clone(&tables),
                        anon: tables,
                    },
                    BlobClients {
                        admin: Arc::clone(&bucket),
                        anon: bucket,
                    },
                )
            }
        };

        tracing::info!(backend = ?config.store.backend, "Store clients ready");
        Ok(Self::new(config, stores, blobs))
    }
}
