use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tempfile::TempDir;

use adaptive_backend::adaptive::config::AdaptiveConfig;
use adaptive_backend::adaptive::directory::PlayerDirectory;
use adaptive_backend::adaptive::orchestrator::SessionOrchestrator;
use adaptive_backend::config::{AdaptiveEnvConfig, Config};
use adaptive_backend::routes::build_router;
use adaptive_backend::state::AppState;
use adaptive_backend::store::Store;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<Store>,
    pub config: Config,
    _temp_dir: TempDir,
}

fn test_config(sled_path: String, store_timeout_ms: u64) -> Config {
    // 直接构造 Config，避免 set_var 在并行测试中产生竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path,
        cors_origin: "http://localhost:5173".to_string(),
        store_timeout_ms,
        adaptive: AdaptiveEnvConfig::default(),
    }
}

/// Routes backed by a fresh sled store; the orchestrator reads through
/// `directory` when given, otherwise through the store itself.
fn build(directory: Option<Arc<dyn PlayerDirectory>>, store_timeout_ms: u64) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("adaptive-test.sled");
    let config = test_config(sled_path.to_string_lossy().to_string(), store_timeout_ms);

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    store.run_migrations().expect("run migrations");

    let directory = directory.unwrap_or_else(|| store.clone() as Arc<dyn PlayerDirectory>);
    let orchestrator = Arc::new(
        SessionOrchestrator::new(
            AdaptiveConfig::from_env(&config.adaptive),
            directory,
            Duration::from_millis(config.store_timeout_ms),
        )
        .expect("orchestrator"),
    );

    let state = AppState::new(store.clone(), orchestrator, &config);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        store,
        config,
        _temp_dir: temp_dir,
    }
}

pub async fn spawn_test_app() -> TestApp {
    build(None, 2000)
}

pub async fn spawn_with_directory(directory: Arc<dyn PlayerDirectory>, store_timeout_ms: u64) -> TestApp {
    build(Some(directory), store_timeout_ms)
}
