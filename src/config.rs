use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    /// Opportunity catalog JSON; the bundled catalog is used when unset.
    pub catalog_path: Option<String>,
    pub cors_origin: String,
    pub trust_proxy: bool,
    pub rate_limit: RateLimitConfig,
    pub adaptive: AdaptiveEnvConfig,
    pub coach: CoachConfig,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u64,
}

#[derive(Debug, Clone)]
pub struct AdaptiveEnvConfig {
    pub user_k_factor: f64,
    pub item_k_ratio: f64,
    pub stretch_offset: f64,
    pub deck_size: usize,
}

#[derive(Clone)]
pub struct CoachConfig {
    pub enabled: bool,
    pub mock: bool,
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for CoachConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoachConfig")
            .field("enabled", &self.enabled)
            .field("mock", &self.mock)
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
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
            sled_path: env_or("SLED_PATH", "./data/trainingx.sled"),
            catalog_path: env::var("CATALOG_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty()),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            trust_proxy: env_or_bool("TRUST_PROXY", false),
            rate_limit: RateLimitConfig {
                window_secs: env_or_parse("RATE_LIMIT_WINDOW_SECS", 900_u64),
                max_requests: env_or_parse("RATE_LIMIT_MAX", 500_u64),
            },
            adaptive: AdaptiveEnvConfig {
                user_k_factor: env_or_parse("ADAPTIVE_USER_K_FACTOR", 32.0_f64),
                item_k_ratio: env_or_parse("ADAPTIVE_ITEM_K_RATIO", 0.5_f64),
                stretch_offset: env_or_parse("ADAPTIVE_STRETCH_OFFSET", 100.0_f64),
                deck_size: env_or_parse(
                    "ADAPTIVE_DECK_SIZE",
                    crate::constants::DEFAULT_DECK_SIZE,
                ),
            },
            coach: CoachConfig {
                enabled: env_or_bool("COACH_ENABLED", false),
                mock: env_or_bool("COACH_MOCK", true),
                api_url: env_or("COACH_API_URL", "https://api.openai.com/v1"),
                api_key: env_or("COACH_API_KEY", ""),
                model: env_or("COACH_MODEL", "gpt-4o-mini"),
                timeout_secs: env_or_parse("COACH_TIMEOUT_SECS", 30_u64),
            },
        }
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
            "RATE_LIMIT_MAX",
            "CATALOG_PATH",
            "ADAPTIVE_USER_K_FACTOR",
            "ADAPTIVE_DECK_SIZE",
            "COACH_ENABLED",
            "COACH_TIMEOUT_SECS",
            "COACH_MOCK",
            "COACH_API_KEY",
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
        assert_eq!(cfg.rate_limit.max_requests, 500);
        assert!(cfg.catalog_path.is_none());
        assert_eq!(cfg.adaptive.user_k_factor, 32.0);
        assert_eq!(cfg.adaptive.deck_size, 24);
        assert!(!cfg.coach.enabled);
        assert!(cfg.coach.mock);
    }

    #[test]
    fn parses_numeric_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "4000");
        env::set_var("RATE_LIMIT_MAX", "100");
        env::set_var("COACH_TIMEOUT_SECS", "42");
        env::set_var("ADAPTIVE_USER_K_FACTOR", "24.5");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.coach.timeout_secs, 42);
        assert_eq!(cfg.adaptive.user_k_factor, 24.5);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("ADAPTIVE_DECK_SIZE", "-3");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.adaptive.deck_size, 24);
    }

    #[test]
    fn blank_catalog_path_means_bundled() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("CATALOG_PATH", "  ");
        assert!(Config::from_env().catalog_path.is_none());
        env::set_var("CATALOG_PATH", "/srv/catalog.json");
        assert_eq!(
            Config::from_env().catalog_path.as_deref(),
            Some("/srv/catalog.json")
        );
    }

    #[test]
    fn coach_key_is_redacted_in_debug() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("COACH_API_KEY", "sk-secret-value");
        env::set_var("COACH_ENABLED", "true");
        env::set_var("COACH_MOCK", "false");

        let cfg = Config::from_env();
        assert!(cfg.coach.enabled);
        assert!(!cfg.coach.mock);
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-secret-value"));
        assert!(rendered.contains("REDACTED"));
    }
}
