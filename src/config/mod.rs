use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Public prefix for issued links, without a trailing slash
    pub link_prefix: String,
    pub redirect_mode: RedirectMode,
    pub geoip: GeoIpConfig,
    pub notify: NotifyConfig,
    pub visit_log: VisitLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Where `GET /t/{id}` sends the visitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectMode {
    /// Capture server-side, then redirect straight to the decoy URL
    #[default]
    Decoy,
    /// Redirect to `<prefix>/track/<id>`; the page there reports via `/api/track`
    TrackingPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// Base URL of the lookup service; the IP is appended as a path segment
    pub api_url: String,
    pub timeout_secs: u64,
    /// Zero disables the lookup cache
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub telegram: Option<TelegramConfig>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitLogConfig {
    pub path: String,
}

impl GeoIpConfig {
    pub const DEFAULT_API_URL: &'static str = "http://ip-api.com/json";

    const fn default_timeout_secs() -> u64 {
        3
    }

    const fn default_cache_ttl_secs() -> u64 {
        900
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            timeout_secs: Self::default_timeout_secs(),
            cache_ttl_secs: Self::default_cache_ttl_secs(),
        }
    }
}

impl NotifyConfig {
    const fn default_timeout_secs() -> u64 {
        5
    }
}

impl TelegramConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.telegram.org";
}

impl RedirectMode {
    fn parse_lenient(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "decoy" | "direct" => RedirectMode::Decoy,
            "tracking-page" | "tracking_page" | "page" => RedirectMode::TrackingPage,
            other => {
                tracing::warn!(
                    "Unknown REDIRECT_MODE '{other}', falling back to 'decoy'. Supported values: decoy, tracking-page"
                );
                RedirectMode::Decoy
            }
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    match env_non_empty(key) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{v}'")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let link_prefix = std::env::var("LINK_PREFIX")
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string();

        let redirect_mode = env_non_empty("REDIRECT_MODE")
            .map(|v| RedirectMode::parse_lenient(&v))
            .unwrap_or_default();

        let geoip = GeoIpConfig {
            api_url: env_non_empty("GEOIP_API_URL")
                .unwrap_or_else(|| GeoIpConfig::DEFAULT_API_URL.to_string()),
            timeout_secs: env_u64("GEOIP_TIMEOUT_SECS", GeoIpConfig::default_timeout_secs())?,
            cache_ttl_secs: env_u64(
                "GEOIP_CACHE_TTL_SECS",
                GeoIpConfig::default_cache_ttl_secs(),
            )?,
        };

        let telegram = match (
            env_non_empty("TELEGRAM_BOT_TOKEN"),
            env_non_empty("TELEGRAM_CHAT_ID"),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                api_base: env_non_empty("TELEGRAM_API_BASE")
                    .unwrap_or_else(|| TelegramConfig::DEFAULT_API_BASE.to_string()),
                bot_token,
                chat_id,
            }),
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID is set; notifications are disabled"
                );
                None
            }
            (None, None) => None,
        };

        let notify = NotifyConfig {
            telegram,
            timeout_secs: env_u64("NOTIFY_TIMEOUT_SECS", NotifyConfig::default_timeout_secs())?,
        };

        let visit_log = VisitLogConfig {
            path: env_non_empty("VISIT_LOG_PATH").unwrap_or_else(|| "log.txt".to_string()),
        };

        Ok(Config {
            server: ServerConfig { host, port },
            link_prefix,
            redirect_mode,
            geoip,
            notify,
            visit_log,
        })
    }
}
