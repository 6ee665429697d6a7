pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod queries;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;

pub use app::build_router;
pub use config::Config;
pub use error::{Error, Result};
pub use state::{AppState, BlobClients, StoreClients};

/// Load configuration from environment variables
pub fn load_config() -> std::result::Result<Config, Box<dyn std::error::Error>> {
    Ok(Config::load()?)
}
