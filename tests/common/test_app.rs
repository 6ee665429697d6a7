use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use reqwest::{redirect::Policy, Client};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tutor_attendance::{
    build_router,
    config::StoreBackend,
    store::{MemoryBlobStore, MemoryStore},
    AppState, BlobClients, Config, StoreClients,
};

pub const TEST_JWT_SECRET: &str = "integration-test-signing-secret-0123456789";

/// Knobs for a [`TestApp`]
pub struct TestAppOptions {
    pub environment: String,
    pub max_requests: u32,
    /// Replaces the in-memory table store, e.g. with a failing one
    pub stores: Option<StoreClients>,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            environment: "test".to_string(),
            max_requests: 10_000,
            stores: None,
        }
    }
}

impl TestAppOptions {
    pub fn rate_limited(max_requests: u32) -> Self {
        Self {
            max_requests,
            ..Default::default()
        }
    }

    pub fn with_stores(environment: &str, stores: StoreClients) -> Self {
        Self {
            environment: environment.to_string(),
            stores: Some(stores),
            ..Default::default()
        }
    }
}

/// HTTP test application wrapper
///
/// Runs the full router on a random port over in-memory stores. Each test
/// gets its own server, stores and upload directory.
pub struct TestApp {
    /// Server base URL (e.g., "http://127.0.0.1:54321")
    pub address: String,
    /// Client with a cookie jar, like a browser
    pub client: Client,
    /// Client without cookies, like an API consumer
    pub api_client: Client,
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub bucket: Arc<MemoryBlobStore>,
    upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::new_with_options(TestAppOptions::default()).await
    }

    /// # How it works:
    /// 1. Builds a config for the memory backend with a temp upload dir
    /// 2. Binds to port 0 (OS assigns random available port)
    /// 3. Starts the server in a background task with connect info
    /// 4. Waits 100ms for the server to be ready
    pub async fn new_with_options(options: TestAppOptions) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

        let mut config = Config::default();
        config.environment = options.environment;
        config.store.backend = StoreBackend::Memory;
        config.server.upload_dir = upload_dir.path().to_string_lossy().to_string();
        config.jwt.secret = TEST_JWT_SECRET.to_string().into();
        config.rate_limit.max_requests = options.max_requests;

        let store = Arc::new(MemoryStore::with_default_tables());
        let bucket = Arc::new(MemoryBlobStore::new(&config.store.url, &config.store.bucket));

        let stores = options.stores.unwrap_or_else(|| StoreClients {
            admin: store.clone(),
            anon: store.clone(),
        });
        let blobs = BlobClients {
            admin: bucket.clone(),
            anon: bucket.clone(),
        };

        let app = build_router(AppState::new(config.clone(), stores, blobs));

        // Bind to random port (port 0 tells OS to assign available port)
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Give server time to start
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let api_client = Client::builder()
            .redirect(Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            address,
            client,
            api_client,
            config,
            store,
            bucket,
            upload_dir,
        }
    }

    /// Get the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// Files left behind in the upload directory
    pub fn spooled_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
