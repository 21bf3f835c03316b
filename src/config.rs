//! Service configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::service::WorkflowSettings;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model used for JSON-mode calls.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";

/// Top-level service configuration.
///
/// Loaded once at startup via [`RouterConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Minimum idle connections in the pool.
    pub database_min_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Short-circuit every LLM call to its hard-coded mock (`TP_USE_MOCKS`).
    pub use_mocks: bool,

    /// Gemini API key. Without one the service stays in mock mode.
    pub gemini_api_key: Option<String>,

    /// Gemini REST base URL.
    pub gemini_base_url: String,

    /// Gemini model name.
    pub gemini_model: String,

    /// Timeout for a single LLM request.
    pub llm_timeout_secs: u64,

    /// Maximum number of pending tasks dispatched per orchestrator run.
    pub orchestrator_batch_size: u32,

    /// How far back the loop tick looks for unclassified messages.
    pub loop_lookback_minutes: i64,

    /// Seconds between background loop runs (0 = disabled).
    pub loop_interval_secs: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Per-request timeout applied by the HTTP layer.
    pub request_timeout_secs: u64,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl RouterConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let database_url = non_empty_env("DATABASE_URL");
        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);
        let database_min_connections = parse_env("DATABASE_MIN_CONNECTIONS", 2);
        let database_connect_timeout_secs = parse_env("DATABASE_CONNECT_TIMEOUT_SECS", 5);

        let use_mocks = parse_mock_flag(std::env::var("TP_USE_MOCKS").ok().as_deref());
        let gemini_api_key = non_empty_env("GEMINI_API_KEY");
        let gemini_base_url = non_empty_env("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let gemini_model =
            non_empty_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let llm_timeout_secs = parse_env("LLM_TIMEOUT_SECS", 60);

        let orchestrator_batch_size = parse_env("ORCHESTRATOR_BATCH_SIZE", 5);
        let loop_lookback_minutes = parse_env("LOOP_LOOKBACK_MINUTES", 15);
        let loop_interval_secs = parse_env("LOOP_INTERVAL_SECS", 0);

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 120);
        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            database_min_connections,
            database_connect_timeout_secs,
            use_mocks,
            gemini_api_key,
            gemini_base_url,
            gemini_model,
            llm_timeout_secs,
            orchestrator_batch_size,
            loop_lookback_minutes,
            loop_interval_secs,
            event_bus_capacity,
            request_timeout_secs,
            json_logs,
        })
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// LLM request timeout as a [`Duration`].
    #[must_use]
    pub const fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Scheduler period, or `None` when the background loop is disabled.
    #[must_use]
    pub const fn loop_interval(&self) -> Option<Duration> {
        if self.loop_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.loop_interval_secs))
        }
    }

    /// Service tunables derived from this configuration.
    #[must_use]
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            orchestrator_batch_size: self.orchestrator_batch_size.max(1),
            loop_lookback: chrono::Duration::minutes(self.loop_lookback_minutes.max(0)),
        }
    }
}

/// Interprets the `TP_USE_MOCKS` value. Unset means mocks on; otherwise only
/// a case-insensitive `"true"` enables them.
#[must_use]
pub fn parse_mock_flag(value: Option<&str>) -> bool {
    value.unwrap_or("true").eq_ignore_ascii_case("true")
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
