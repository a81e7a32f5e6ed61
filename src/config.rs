use std::env;
use std::time::Duration;

/// Browser-style identification sent with feed requests. Some feed hosts
/// (RSSHub mirrors among them) reject default client signatures outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings for the keyword extraction backend (OpenAI-compatible API).
/// Without an API key extraction is disabled and enrichment degrades to
/// "no keywords".
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            model: "Qwen/Qwen3-8B".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub database_url: String,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub max_redirects: usize,
    pub collect_interval_secs: u64,
    pub startup_delay_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub extraction: ExtractionConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://hotspot.db?mode=rwc".to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            fetch_timeout_secs: 15,
            max_redirects: 5,
            collect_interval_secs: 3600,
            startup_delay_secs: 10,
            shutdown_timeout_secs: 5,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything absent or malformed. No secrets are hardcoded; the extraction
    /// API key only ever comes from `SILICONFLOW_API_KEY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let extraction = ExtractionConfig {
            api_key: env::var("SILICONFLOW_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: env::var("SILICONFLOW_BASE_URL")
                .unwrap_or(defaults.extraction.base_url),
            model: env::var("SILICONFLOW_MODEL").unwrap_or(defaults.extraction.model),
        };

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            user_agent: defaults.user_agent,
            fetch_timeout_secs: env_u64("COLLECT_FETCH_TIMEOUT_SECONDS", defaults.fetch_timeout_secs),
            max_redirects: defaults.max_redirects,
            collect_interval_secs: env_u64("COLLECT_INTERVAL_SECONDS", defaults.collect_interval_secs),
            startup_delay_secs: env_u64("COLLECT_STARTUP_DELAY_SECONDS", defaults.startup_delay_secs),
            shutdown_timeout_secs: env_u64(
                "COLLECT_SHUTDOWN_TIMEOUT_SECONDS",
                defaults.shutdown_timeout_secs,
            ),
            extraction,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn collect_interval(&self) -> Duration {
        Duration::from_secs(self.collect_interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
