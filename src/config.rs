//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. A `.env` file is honoured for local
//! development.

use chrono::NaiveTime;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which `RosterStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Roster entry registered at startup if its handle is not yet tracked.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub handle: String,
    pub name: String,
    pub email: Option<String>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Base URL of the Codeforces API (no trailing slash)
    pub codeforces_api_url: String,
    /// Attempts per retried request
    pub fetch_max_attempts: u32,
    /// Fixed delay between retried attempts
    pub fetch_retry_delay: Duration,
    /// Transport timeout for a single HTTP attempt
    pub http_timeout: Duration,
    /// Size of the single submissions page requested per sync
    pub submissions_page_size: u32,
    /// Lookback used by the inactivity check
    pub inactivity_days: i64,
    /// Daily sweep trigger (UTC)
    pub sweep_time: NaiveTime,
    /// Also reconcile contest and submission history during the sweep
    pub sweep_refresh_history: bool,
    pub default_contest_window_days: i64,
    pub default_submission_window_days: i64,
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    pub seed_user: Option<SeedUser>,
}

impl Config {
    /// Config for tests: in-memory store, no retry delay worth waiting on.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            codeforces_api_url: "http://localhost:9/api".to_string(),
            fetch_max_attempts: 3,
            fetch_retry_delay: Duration::from_millis(10),
            http_timeout: Duration::from_secs(5),
            submissions_page_size: 10_000,
            inactivity_days: 7,
            sweep_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
            sweep_refresh_history: false,
            default_contest_window_days: 90,
            default_submission_window_days: 30,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            seed_user: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = parse_var("STORE_BACKEND", StoreBackend::Firestore)?;
        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        let sweep_time = match env::var("SWEEP_TIME") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
                ConfigError::Invalid {
                    name: "SWEEP_TIME",
                    value: raw,
                }
            })?,
            Err(_) => NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
        };

        let seed_user = env::var("SEED_HANDLE")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .map(|handle| SeedUser {
                name: env::var("SEED_NAME").unwrap_or_else(|_| handle.clone()),
                email: env::var("SEED_EMAIL").ok(),
                handle,
            });

        Ok(Self {
            port: parse_var("PORT", 8080)?,
            codeforces_api_url: env::var("CODEFORCES_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://codeforces.com/api".to_string()),
            fetch_max_attempts: parse_var("FETCH_MAX_ATTEMPTS", 3)?,
            fetch_retry_delay: Duration::from_millis(parse_var("FETCH_RETRY_DELAY_MS", 2000)?),
            http_timeout: Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", 30)?),
            submissions_page_size: parse_var("SUBMISSIONS_PAGE_SIZE", 10_000)?,
            inactivity_days: parse_days("INACTIVITY_DAYS", 7)?,
            sweep_time,
            sweep_refresh_history: parse_var("SWEEP_REFRESH_HISTORY", false)?,
            default_contest_window_days: parse_days("DEFAULT_CONTEST_WINDOW_DAYS", 90)?,
            default_submission_window_days: parse_days("DEFAULT_SUBMISSION_WINDOW_DAYS", 30)?,
            store_backend,
            gcp_project_id,
            seed_user,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_var`], for day counts that must be at least 1.
fn parse_days(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    let days = parse_var(name, default)?;
    if days < 1 {
        return Err(ConfigError::Invalid {
            name,
            value: days.to_string(),
        });
    }
    Ok(days)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
