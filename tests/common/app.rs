use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use tokio::sync::broadcast;

use trainingx_backend::adaptive::config::AdaptiveConfig;
use trainingx_backend::adaptive::AdaptiveEngine;
use trainingx_backend::config::{AdaptiveEnvConfig, CoachConfig, Config, RateLimitConfig};
use trainingx_backend::matching::catalog::Catalog;
use trainingx_backend::routes::build_router;
use trainingx_backend::state::AppState;
use trainingx_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

/// Knobs the HTTP tests vary.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub api_limit: u64,
    pub coach_enabled: bool,
    pub coach_mock: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            api_limit: 1000,
            coach_enabled: false,
            coach_mock: true,
        }
    }
}

// Config is built directly; set_var would race across test threads.
fn test_config(sled_path: String, options: &TestOptions) -> Config {
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        catalog_path: None,
        cors_origin: "http://localhost:5173".to_string(),
        trust_proxy: false,
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: options.api_limit,
        },
        adaptive: AdaptiveEnvConfig {
            user_k_factor: 32.0,
            item_k_ratio: 0.5,
            stretch_offset: 100.0,
            deck_size: 24,
        },
        coach: CoachConfig {
            enabled: options.coach_enabled,
            mock: options.coach_mock,
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 2,
        },
    }
}

pub async fn spawn_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("trainingx-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string(), &options);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let adaptive = Arc::new(AdaptiveEngine::new(
        AdaptiveConfig::from_env(&config.adaptive),
        store.clone(),
    ));
    let catalog = Arc::new(Catalog::bundled().expect("bundled catalog"));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(store, adaptive, catalog, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    spawn_with(TestOptions::default()).await
}
