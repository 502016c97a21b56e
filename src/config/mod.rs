//! Configuration management for pickdraw
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::Game;

/// Default results page for Pick 3
pub const DEFAULT_PICK3_URL: &str = "https://floridalottery.com/games/draw-games/pick-3";

/// Default results page for Pick 4
pub const DEFAULT_PICK4_URL: &str = "https://floridalottery.com/games/draw-games/pick-4";

/// Desktop browser user agent used when rendering
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Results page locations
    pub sources: SourcesConfig,

    /// Page rendering configuration
    pub renderer: RendererConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ingestion behaviour
    pub ingest: IngestConfig,

    /// Downstream notification configuration
    pub notifications: NotificationsConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Results page URLs per game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub pick3_url: String,
    pub pick4_url: String,
}

impl SourcesConfig {
    pub fn url_for(&self, game: Game) -> &str {
        match game {
            Game::Pick3 => &self.pick3_url,
            Game::Pick4 => &self.pick4_url,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            pick3_url: DEFAULT_PICK3_URL.to_string(),
            pick4_url: DEFAULT_PICK4_URL.to_string(),
        }
    }
}

/// Rendering backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererBackend {
    /// Headless browser driven over the WebDriver protocol
    Webdriver,
    /// Plain HTTP fetch without script execution
    Http,
}

/// Page rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub backend: RendererBackend,

    /// WebDriver endpoint (chromedriver, geckodriver, selenium)
    pub webdriver_url: String,

    /// Browser name requested from the driver (chrome, firefox)
    pub browser: String,

    /// Explicit browser binary; the driver's default when unset
    pub browser_binary: Option<PathBuf>,

    pub headless: bool,

    pub user_agent: String,

    /// Budget for navigation including network quiescence
    pub navigation_timeout_secs: u64,

    /// How long network activity must stay quiet
    pub network_idle_ms: u64,

    /// Selector waited for before snapshotting
    pub wait_selector: Option<String>,

    /// Best-effort wait for `wait_selector`
    pub selector_timeout_secs: u64,

    /// Extra delay after the selector wait for client-side rendering
    pub settle_delay_ms: u64,

    /// Polling interval for idle and selector checks
    pub poll_interval_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: RendererBackend::Webdriver,
            webdriver_url: String::from("http://localhost:9515"),
            browser: String::from("chrome"),
            browser_binary: None,
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout_secs: 30,
            network_idle_ms: 500,
            wait_selector: Some(crate::parser::selectors::CARD.to_string()),
            selector_timeout_secs: 15,
            settle_delay_ms: 2000,
            poll_interval_ms: 100,
        }
    }
}

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Postgres,
    Postgrest,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// PostgreSQL connection string
    pub postgres_url: String,

    /// Maximum pool size
    pub pool_size: usize,

    /// PostgREST base URL (e.g. a Supabase project URL)
    pub postgrest_url: String,

    /// PostgREST API key
    pub postgrest_key: Option<String>,

    /// Table holding draw rows
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sqlite_path: PathBuf::from("data/draws.db"),
            postgres_url: String::from("postgresql://localhost/pickdraw"),
            pool_size: 5,
            postgrest_url: String::from("http://localhost:3000"),
            postgrest_key: None,
            table: String::from("games"),
        }
    }
}

/// Ingestion behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Look up the natural key before inserting
    pub precheck: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { precheck: true }
    }
}

/// Downstream notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Webhook receiving the run summary; disabled when unset
    pub webhook_url: Option<String>,

    /// Bearer token for the webhook
    pub webhook_token: Option<String>,

    pub timeout_secs: u64,

    pub max_retries: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            webhook_token: None,
            timeout_secs: 10,
            max_retries: 0,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PICKDRAW_PICK3_URL") {
            config.sources.pick3_url = url;
        }
        if let Ok(url) = std::env::var("PICKDRAW_PICK4_URL") {
            config.sources.pick4_url = url;
        }

        let renderer = &mut config.renderer;
        if let Ok(backend) = std::env::var("PICKDRAW_RENDERER") {
            renderer.backend = match backend.to_ascii_lowercase().as_str() {
                "webdriver" => RendererBackend::Webdriver,
                "http" => RendererBackend::Http,
                other => anyhow::bail!("Unknown renderer backend: {other}"),
            };
        }
        if let Ok(url) = std::env::var("PICKDRAW_WEBDRIVER_URL") {
            renderer.webdriver_url = url;
        }
        if let Ok(browser) = std::env::var("PICKDRAW_BROWSER") {
            renderer.browser = browser;
        }
        if let Ok(binary) = std::env::var("PICKDRAW_BROWSER_BINARY") {
            renderer.browser_binary = Some(binary.into());
        }
        if let Some(headless) = env_bool("PICKDRAW_HEADLESS") {
            renderer.headless = headless;
        }
        if let Ok(agent) = std::env::var("PICKDRAW_USER_AGENT") {
            renderer.user_agent = agent;
        }
        if let Some(secs) = env_parse("PICKDRAW_NAVIGATION_TIMEOUT") {
            renderer.navigation_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("PICKDRAW_SELECTOR_TIMEOUT") {
            renderer.selector_timeout_secs = secs;
        }
        if let Some(ms) = env_parse("PICKDRAW_NETWORK_IDLE_MS") {
            renderer.network_idle_ms = ms;
        }
        if let Some(ms) = env_parse("PICKDRAW_SETTLE_DELAY_MS") {
            renderer.settle_delay_ms = ms;
        }

        let database = &mut config.database;
        if let Ok(backend) = std::env::var("PICKDRAW_STORE") {
            database.backend = match backend.to_ascii_lowercase().as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "postgres" => StoreBackend::Postgres,
                "postgrest" | "supabase" => StoreBackend::Postgrest,
                other => anyhow::bail!("Unknown store backend: {other}"),
            };
        }
        if let Ok(path) = std::env::var("PICKDRAW_SQLITE_PATH") {
            database.sqlite_path = path.into();
        }
        if let Ok(url) = std::env::var("POSTGRES_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            database.postgres_url = url;
        }
        if let Some(size) = env_parse("PICKDRAW_POOL_SIZE") {
            database.pool_size = size;
        }
        if let Ok(url) = std::env::var("PICKDRAW_POSTGREST_URL") {
            database.postgrest_url = url;
        }
        if let Ok(key) = std::env::var("PICKDRAW_POSTGREST_KEY") {
            database.postgrest_key = Some(key);
        }
        if let Ok(table) = std::env::var("PICKDRAW_TABLE") {
            database.table = table;
        }

        if let Some(precheck) = env_bool("PICKDRAW_INGEST_PRECHECK") {
            config.ingest.precheck = precheck;
        }

        if let Ok(url) = std::env::var("PICKDRAW_WEBHOOK_URL") {
            config.notifications.webhook_url = Some(url);
        }
        if let Ok(token) = std::env::var("PICKDRAW_WEBHOOK_TOKEN") {
            config.notifications.webhook_token = Some(token);
        }

        if let Ok(host) = std::env::var("PICKDRAW_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_parse("PICKDRAW_PORT") {
            config.server.port = port;
        }

        if let Ok(level) = std::env::var("PICKDRAW_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("PICKDRAW_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for game in Game::ALL {
            let url = self.sources.url_for(game);
            url::Url::parse(url).with_context(|| format!("Invalid {game} source URL: {url}"))?;
        }

        if self.renderer.backend == RendererBackend::Webdriver {
            url::Url::parse(&self.renderer.webdriver_url)
                .with_context(|| {
                    format!("Invalid WebDriver URL: {}", self.renderer.webdriver_url)
                })?;
        }

        if self.renderer.navigation_timeout_secs == 0 {
            anyhow::bail!("navigation_timeout_secs must be greater than 0");
        }

        if self.renderer.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        if self.database.pool_size == 0 {
            anyhow::bail!("pool_size must be greater than 0");
        }

        if self.database.table.is_empty()
            || !self
                .database
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!("table must be a plain identifier: {}", self.database.table);
        }

        if let Some(url) = &self.notifications.webhook_url {
            url::Url::parse(url).with_context(|| format!("Invalid webhook URL: {url}"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_source_urls() {
        let config = Config::default();
        assert_eq!(config.sources.url_for(Game::Pick3), DEFAULT_PICK3_URL);
        assert_eq!(config.sources.url_for(Game::Pick4), DEFAULT_PICK4_URL);
    }

    #[test]
    fn test_invalid_table_name() {
        let mut config = Config::default();
        config.database.table = "games; drop table x".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_webhook_url() {
        let mut config = Config::default();
        config.notifications.webhook_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_navigation_timeout() {
        let mut config = Config::default();
        config.renderer.navigation_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [renderer]
            backend = "http"

            [database]
            backend = "postgrest"
            postgrest_url = "https://example.supabase.co"
            "#,
        )
        .unwrap();

        assert_eq!(config.renderer.backend, RendererBackend::Http);
        assert_eq!(config.renderer.navigation_timeout_secs, 30);
        assert_eq!(config.database.backend, StoreBackend::Postgrest);
        assert_eq!(config.database.table, "games");
        assert!(config.ingest.precheck);
    }
}
