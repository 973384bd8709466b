use std::{env, time::Duration};

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::stations::{is_country_code, normalize_country};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; SM-G975F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
const DEFAULT_CURATED_STATIONS: &str =
    "mg:rdj,mg:rnm,mg:rta,mg:viva,mg:mbs,mg:tvm,mg:antsiva,mg:lazan,mg:fm-plus,mg:radiodon";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub port: u16,
    pub default_country: String,
    pub allow_insecure_transports: bool,
    pub http: SourceHttpConfig,
    pub online_radio_box: OnlineRadioBoxConfig,
    pub radio_browser: RadioBrowserConfig,
    pub curated: CuratedConfig,
    pub resolver: ResolverConfig,
}

/// Settings shared by every outbound source request.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHttpConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnlineRadioBoxConfig {
    pub player_base_url: String,
    pub catalog_base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadioBrowserConfig {
    pub default_base_url: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CuratedConfig {
    pub stations: Vec<CuratedStation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuratedStation {
    pub country: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolverConfig {
    pub deadline_ms: u64,
    pub curated_first: bool,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let port = env_u16("PORT", 5000)?;
        let default_country = normalize_country(
            &env::var("DEFAULT_COUNTRY").unwrap_or_else(|_| "mg".to_string()),
        );
        if !is_country_code(&default_country) {
            return Err(ConfigError::Message(
                "DEFAULT_COUNTRY must be a two-letter country code".into(),
            ));
        }
        let allow_insecure_transports = env_bool("ALLOW_INSECURE_TRANSPORT").unwrap_or(false);
        let http = SourceHttpConfig::from_env()?;
        let online_radio_box = OnlineRadioBoxConfig::from_env()?;
        let radio_browser = RadioBrowserConfig::from_env(allow_insecure_transports)?;
        let curated = CuratedConfig::from_env()?;
        let resolver = ResolverConfig::from_env()?;

        Ok(Self {
            port,
            default_country,
            allow_insecure_transports,
            http,
            online_radio_box,
            radio_browser,
            curated,
            resolver,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            default_country: "mg".to_string(),
            allow_insecure_transports: false,
            http: SourceHttpConfig::default(),
            online_radio_box: OnlineRadioBoxConfig::default(),
            radio_browser: RadioBrowserConfig::default(),
            curated: CuratedConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl SourceHttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms = env_u64("SOURCE_TIMEOUT_MS", 12_000)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Message(
                "SOURCE_TIMEOUT_MS must be greater than zero".into(),
            ));
        }
        let user_agent =
            env::var("SOURCE_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Message(
                "SOURCE_USER_AGENT cannot be blank".into(),
            ));
        }
        Ok(Self {
            timeout_ms,
            user_agent,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SourceHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 12_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl OnlineRadioBoxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            player_base_url: env::var("ONLINE_RADIO_BOX_PLAYER_URL")
                .unwrap_or_else(|_| "http://p.onlineradiobox.com".to_string()),
            catalog_base_url: env::var("ONLINE_RADIO_BOX_CATALOG_URL")
                .unwrap_or_else(|_| "https://onlineradiobox.com".to_string()),
        };
        for (key, value) in [
            ("ONLINE_RADIO_BOX_PLAYER_URL", &config.player_base_url),
            ("ONLINE_RADIO_BOX_CATALOG_URL", &config.catalog_base_url),
        ] {
            parse_base_url(key, value)?;
        }
        Ok(config)
    }
}

impl Default for OnlineRadioBoxConfig {
    fn default() -> Self {
        Self {
            player_base_url: "http://p.onlineradiobox.com".to_string(),
            catalog_base_url: "https://onlineradiobox.com".to_string(),
        }
    }
}

impl RadioBrowserConfig {
    fn from_env(allow_insecure_transports: bool) -> Result<Self, ConfigError> {
        const DEFAULT_BASE_URL: &str = "https://de2.api.radio-browser.info";

        let config = Self {
            default_base_url: env::var("RADIO_BROWSER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            limit: env_u32("RADIO_BROWSER_LIMIT", 200)?,
        };

        let base_url = parse_base_url("RADIO_BROWSER_BASE_URL", &config.default_base_url)?;
        if base_url.scheme() != "https" && !allow_insecure_transports {
            return Err(ConfigError::Message(
                "Radio Browser endpoints must use HTTPS unless ALLOW_INSECURE_TRANSPORT=true"
                    .into(),
            ));
        }
        Ok(config)
    }
}

impl Default for RadioBrowserConfig {
    fn default() -> Self {
        Self {
            default_base_url: "https://de2.api.radio-browser.info".to_string(),
            limit: 200,
        }
    }
}

impl CuratedConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw =
            env::var("CURATED_STATIONS").unwrap_or_else(|_| DEFAULT_CURATED_STATIONS.to_string());
        Ok(Self {
            stations: parse_curated_stations(&raw)?,
        })
    }
}

impl Default for CuratedConfig {
    fn default() -> Self {
        Self {
            stations: parse_curated_stations(DEFAULT_CURATED_STATIONS).unwrap_or_default(),
        }
    }
}

impl ResolverConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            deadline_ms: env_u64("RESOLVE_DEADLINE_MS", 45_000)?,
            curated_first: env_bool("RESOLVER_CURATED_FIRST").unwrap_or(false),
        })
    }

    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_ms > 0).then(|| Duration::from_millis(self.deadline_ms))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 45_000,
            curated_first: false,
        }
    }
}

fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Message(format!("{key} is not a valid URL: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Message(format!(
            "{key} must use http or https, got {other}"
        ))),
    }
}

/// Parses `cc:id` pairs separated by commas. Entries without a country use `mg`.
pub fn parse_curated_stations(raw: &str) -> Result<Vec<CuratedStation>, ConfigError> {
    let mut stations = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (country, id) = match entry.split_once(':') {
            Some((country, id)) => (normalize_country(country), id.trim().to_ascii_lowercase()),
            None => ("mg".to_string(), entry.to_ascii_lowercase()),
        };
        if !is_country_code(&country) || id.is_empty() {
            return Err(ConfigError::Message(format!(
                "CURATED_STATIONS entry '{entry}' must look like cc:station-id"
            )));
        }
        stations.push(CuratedStation { country, id });
    }
    Ok(stations)
}

fn env_u16(key: &str, default: u16) -> Result<u16, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be a valid u16"))),
        Err(_) => Ok(default),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be a valid u32"))),
        Err(_) => Ok(default),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Message(format!("{key} must be a valid u64"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str) -> Option<bool> {
    match env::var(key) {
        Ok(value) => match value.to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Err(_) => None,
    }
}
