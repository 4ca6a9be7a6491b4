// Startup configuration, read once from the environment.
//
// Telegram destinations are not here: they live in the spreadsheet and are
// read on every notification.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Where the Google service-account key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleKey {
    /// The key JSON itself (`GOOGLE_CREDENTIALS`).
    Inline(String),
    /// Path to the key file (`GOOGLE_SERVICE_ACCOUNT_KEY`).
    File(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub api_user: String,
    pub api_pass: String,
    pub seed_token: Option<String>,
    pub calendar_id: String,
    pub sheet_id: String,
    pub google_key: GoogleKey,
    pub listen_addr: SocketAddr,
    pub request_timeout: Duration,
    pub sync_interval: Option<Duration>,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &self.api_url)
            .field("api_user", &self.api_user)
            .field("calendar_id", &self.calendar_id)
            .field("sheet_id", &self.sheet_id)
            .field("listen_addr", &self.listen_addr)
            .field("request_timeout", &self.request_timeout)
            .field("sync_interval", &self.sync_interval)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("Missing {} environment variable", key));

        let google_key = match (get("GOOGLE_CREDENTIALS"), get("GOOGLE_SERVICE_ACCOUNT_KEY")) {
            (Some(json), _) => GoogleKey::Inline(json),
            (None, Some(path)) => GoogleKey::File(path),
            (None, None) => {
                bail!("Neither GOOGLE_CREDENTIALS nor GOOGLE_SERVICE_ACCOUNT_KEY is set")
            }
        };

        let listen_addr = match (get("LISTEN_ADDR"), get("PORT")) {
            (Some(addr), _) => addr,
            (None, Some(port)) => format!("0.0.0.0:{}", port),
            (None, None) => DEFAULT_LISTEN_ADDR.to_string(),
        };
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address '{}'", listen_addr))?;

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("Invalid REQUEST_TIMEOUT_SECS '{}'", secs))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let sync_interval = match get("SYNC_INTERVAL_HOURS") {
            Some(hours) => {
                let hours: u64 = hours
                    .parse()
                    .with_context(|| format!("Invalid SYNC_INTERVAL_HOURS '{}'", hours))?;
                if hours == 0 {
                    bail!("SYNC_INTERVAL_HOURS must be at least 1");
                }
                let Some(secs) = hours.checked_mul(60 * 60) else {
                    bail!("SYNC_INTERVAL_HOURS '{}' is too large", hours);
                };
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_url: require("API_URL")?,
            api_user: require("API_USER")?,
            api_pass: require("API_PASS")?,
            seed_token: get("TOKEN"),
            calendar_id: require("GOOGLE_CALENDAR_ID")?,
            sheet_id: require("GOOGLE_SHEET_ID")?,
            google_key,
            listen_addr,
            request_timeout: Duration::from_secs(request_timeout),
            sync_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("API_URL", "https://cases.example"),
            ("API_USER", "bot"),
            ("API_PASS", "secret"),
            ("GOOGLE_CALENDAR_ID", "court@group.calendar.google.com"),
            ("GOOGLE_SHEET_ID", "sheet-1"),
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/etc/key.json"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> anyhow::Result<AppConfig> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.sync_interval, None);
        assert_eq!(config.seed_token, None);
        assert_eq!(config.google_key, GoogleKey::File("/etc/key.json".to_string()));
    }

    #[test]
    fn test_overrides() {
        let mut vars = base();
        vars.insert("PORT", "8080");
        vars.insert("REQUEST_TIMEOUT_SECS", "5");
        vars.insert("SYNC_INTERVAL_HOURS", "6");
        vars.insert("TOKEN", "  ");
        vars.insert("GOOGLE_CREDENTIALS", "{\"client_email\":\"x\"}");

        let config = load(&vars).unwrap();

        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.sync_interval, Some(Duration::from_secs(6 * 3600)));
        assert_eq!(config.seed_token, None);
        assert!(matches!(config.google_key, GoogleKey::Inline(_)));
    }

    #[test]
    fn test_missing_required_value() {
        let mut vars = base();
        vars.remove("API_PASS");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("API_PASS"));
    }

    #[test]
    fn test_missing_google_key() {
        let mut vars = base();
        vars.remove("GOOGLE_SERVICE_ACCOUNT_KEY");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = load(&base()).unwrap();
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_huge_interval_rejected() {
        let mut vars = base();
        vars.insert("SYNC_INTERVAL_HOURS", "18446744073709551615");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut vars = base();
        vars.insert("SYNC_INTERVAL_HOURS", "0");
        assert!(load(&vars).is_err());
    }
}
