use std::time::Duration;

const DEFAULT_DB_URL: &str = "sqlite://covid_etl.db?mode=rwc";
const DEFAULT_API_BASE_URL: &str = "https://api.api-ninjas.com/v1/covid19";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    /// Read settings from the process environment (after `.env` is loaded)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            db_url: non_empty("DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            api_base_url: non_empty("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_key: non_empty("API_KEY"),
            http_timeout: Duration::from_secs(
                non_empty("HTTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        }
    }
}
