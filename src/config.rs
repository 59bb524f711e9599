//! Environment-driven configuration. Every field has a default matching the
//! out-of-the-box behavior; operators override by setting the matching
//! upper-snake-case environment variable.

#[derive(Debug, Clone)]
pub struct Config {
    pub worker_count: usize,
    pub queue_maxsize: usize,
    pub max_attempts: u32,
    pub retry_base_delay_secs: f64,
    pub retry_max_delay_secs: f64,
    pub retention_days: i64,
    pub cleanup_interval_hours: u64,
    pub db_path: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Builds configuration from the process environment, falling back to
    /// documented defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            worker_count: env_parse("WORKER_COUNT", 10),
            queue_maxsize: env_parse("QUEUE_MAXSIZE", 1000),
            max_attempts: env_parse("MAX_ATTEMPTS", 5),
            retry_base_delay_secs: env_parse("RETRY_BASE_DELAY", 5.0),
            retry_max_delay_secs: env_parse("RETRY_MAX_DELAY", 300.0),
            retention_days: env_parse("RETENTION_DAYS", 30),
            cleanup_interval_hours: env_parse("CLEANUP_INTERVAL_HOURS", 1),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "/data/events.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            log_format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 10,
            queue_maxsize: 1000,
            max_attempts: 5,
            retry_base_delay_secs: 5.0,
            retry_max_delay_secs: 300.0,
            retention_days: 30,
            cleanup_interval_hours: 1,
            db_path: "/data/events.db".to_string(),
            log_level: "INFO".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
