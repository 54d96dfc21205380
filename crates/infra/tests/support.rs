use std::path::PathBuf;
use std::sync::Once;

use serde_json::json;
use socialcontext_core::SocialContextClient;
use socialcontext_domain::ClientConfig;
use socialcontext_infra::build_client;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const APP_ID: &str = "app-under-test";
pub const APP_SECRET: &str = "c3VwZXItc2VjcmV0";

/// Mock service plus a temporary token store that lives for the test.
pub struct TestService {
    pub server: MockServer,
    _temp_dir: TempDir,
    pub store_path: PathBuf,
}

/// Route `tracing` output through the test harness (`RUST_LOG` selects).
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

impl TestService {
    pub async fn start() -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let store_path = temp_dir.path().join("tokens.db");
        Self { server: MockServer::start().await, _temp_dir: temp_dir, store_path }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_root: self.server.uri(),
            client_id: Some(APP_ID.to_string()),
            client_secret: Some(APP_SECRET.to_string()),
            token_store_path: Some(self.store_path.clone()),
            timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    pub fn client(&self) -> SocialContextClient {
        build_client(&self.config()).expect("client should build")
    }

    /// Issue `access_token` for every token request, `expected` times.
    pub async fn mount_token(&self, access_token: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path("/v0.1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn requests_to(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == route)
            .count()
    }
}
