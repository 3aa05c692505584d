use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::time::Duration;

use crate::adaptive::config::AdaptiveConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub store_timeout_ms: u64,
    pub adaptive: AdaptiveEnvConfig,
}

/// Calibration overrides; anything not listed keeps the built-in default.
#[derive(Debug, Clone)]
pub struct AdaptiveEnvConfig {
    pub expected_time_secs: f64,
    pub high_threshold: f64,
    pub mid_threshold: f64,
    pub pool_cap: usize,
    pub default_k: usize,
    pub kmeans_seed: u64,
    pub kmeans_max_iterations: usize,
}

impl Default for AdaptiveEnvConfig {
    fn default() -> Self {
        let defaults = AdaptiveConfig::default();
        Self {
            expected_time_secs: defaults.irt.expected_time_secs,
            high_threshold: defaults.irt.high_threshold,
            mid_threshold: defaults.irt.mid_threshold,
            pool_cap: defaults.matchmaking.pool_cap,
            default_k: defaults.matchmaking.default_k,
            kmeans_seed: defaults.kmeans.seed,
            kmeans_max_iterations: defaults.kmeans.max_iterations,
        }
    }
}

impl AdaptiveEnvConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            expected_time_secs: env_or_parse("IRT_EXPECTED_TIME_SECS", d.expected_time_secs),
            high_threshold: env_or_parse("IRT_HIGH_THRESHOLD", d.high_threshold),
            mid_threshold: env_or_parse("IRT_MID_THRESHOLD", d.mid_threshold),
            pool_cap: env_or_parse("MATCHMAKING_POOL_CAP", d.pool_cap),
            default_k: env_or_parse("MATCHMAKING_DEFAULT_K", d.default_k),
            kmeans_seed: env_or_parse("KMEANS_SEED", d.kmeans_seed),
            kmeans_max_iterations: env_or_parse("KMEANS_MAX_ITERATIONS", d.kmeans_max_iterations),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/adaptive.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            store_timeout_ms: env_or_parse("STORE_TIMEOUT_MS", 2000_u64),
            adaptive: AdaptiveEnvConfig::from_env(),
        }
    }

    /// Service-level checks; engine calibration is validated separately.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be > 0".to_string());
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "HOST",
            "PORT",
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "STORE_TIMEOUT_MS",
            "IRT_EXPECTED_TIME_SECS",
            "IRT_HIGH_THRESHOLD",
            "MATCHMAKING_DEFAULT_K",
            "KMEANS_SEED",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.store_timeout(), Duration::from_millis(2000));
        assert_eq!(cfg.adaptive.default_k, 3);
        assert_eq!(cfg.adaptive.kmeans_seed, 42);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("STORE_TIMEOUT_MS", "250");
        env::set_var("IRT_HIGH_THRESHOLD", "0.35");
        env::set_var("KMEANS_SEED", "7");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.store_timeout_ms, 250);
        assert_eq!(cfg.adaptive.high_threshold, 0.35);
        assert_eq!(cfg.adaptive.kmeans_seed, 7);
        clear_keys(managed_keys());
    }

    #[test]
    fn zero_store_timeout_is_rejected() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        assert!(Config::from_env().validate().is_ok());
        env::set_var("STORE_TIMEOUT_MS", "0");
        let err = Config::from_env().validate().unwrap_err();
        assert!(err.contains("STORE_TIMEOUT_MS"));
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("MATCHMAKING_DEFAULT_K", "x");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.adaptive.default_k, 3);
        clear_keys(managed_keys());
    }

    #[test]
    fn bool_flags_accept_common_spellings() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ENABLE_FILE_LOGS", "yes");
        assert!(Config::from_env().enable_file_logs);
        env::set_var("ENABLE_FILE_LOGS", "off");
        assert!(!Config::from_env().enable_file_logs);
        clear_keys(managed_keys());
    }

    #[test]
    fn env_overrides_reach_engine_config() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("IRT_EXPECTED_TIME_SECS", "90");
        let cfg = Config::from_env();
        let adaptive = AdaptiveConfig::from_env(&cfg.adaptive);
        assert_eq!(adaptive.irt.expected_time_secs, 90.0);
        assert!(adaptive.validate().is_ok());
        clear_keys(managed_keys());
    }
}
