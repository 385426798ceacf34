use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateways: GatewaysConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::parse(&contents)
    }

    /// Parse config from YAML text, expanding `${VAR}` references first.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        if expanded.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_saphyr::from_str(&expanded)?)
    }
}

/// Default config file name.
pub const DEFAULT_CONFIG_FILE: &str = "gamescout.yaml";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

fn default_handler_timeout() -> u64 {
    300
}

fn default_catalog_url() -> String {
    "https://api.rawg.io/api/games".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_genres_url() -> String {
    "https://rawg.io/genres".to_string()
}

fn default_heading_selector() -> String {
    "div.heading".to_string()
}

fn default_releases_url() -> String {
    "https://rawg.io/video-game-releases".to_string()
}

fn default_release_entry_selector() -> String {
    "div.game-card-medium".to_string()
}

fn default_release_date_selector() -> String {
    // Class name is misspelled on the source page.
    "div.game-card-about__desription".to_string()
}

fn default_release_entry_index() -> usize {
    1
}

fn default_upcoming_url() -> String {
    "https://stopgame.ru/games".to_string()
}

fn default_upcoming_image_selector() -> String {
    "img._image_1u499_16".to_string()
}

fn default_upcoming_date_selector() -> String {
    "span._release-date_1u499_387".to_string()
}

fn default_upcoming_max_items() -> usize {
    4
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variable references in a string.
///
/// Supported syntax:
/// - `${VAR}` - required, errors if not set
/// - `${VAR:-default}` - falls back to `default` (may be empty)
/// - `$$` - literal `$`
///
/// A `$` not followed by `{` or `$` is kept as-is. Nested references are not
/// expanded.
///
/// ```yaml
/// gateways:
///   telegram:
///     bot_token: ${TELEGRAM_BOT_TOKEN}
/// sources:
///   catalog:
///     api_key: ${RAWG_API_KEY:-}
/// ```
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            result.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            result.push_str(&resolve_var_reference(&tail[..end])?);
            rest = &tail[end + 1..];
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

/// Resolve the body of a `${...}` reference (`NAME` or `NAME:-default`).
fn resolve_var_reference(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_string()),
        (Err(_), None) => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

// ============================================================================
// GatewaysConfig
// ============================================================================

/// Configuration for chat gateways.
#[derive(Debug, Default, Deserialize)]
pub struct GatewaysConfig {
    /// Telegram gateway configuration.
    #[serde(default)]
    pub telegram: Option<TelegramGatewayConfig>,
}

/// Configuration for the Telegram gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramGatewayConfig {
    /// Whether the gateway is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Telegram bot token from @BotFather.
    pub bot_token: String,
}

// ============================================================================
// SourcesConfig
// ============================================================================

/// Configuration for the external data sources.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Per-request timeout for every source.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// User agent header; defaults to `gamescout/<version>`.
    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub genres: GenreListConfig,

    #[serde(default)]
    pub releases: ReleasesConfig,

    #[serde(default)]
    pub upcoming: UpcomingConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            user_agent: None,
            catalog: CatalogConfig::default(),
            genres: GenreListConfig::default(),
            releases: ReleasesConfig::default(),
            upcoming: UpcomingConfig::default(),
        }
    }
}

/// Game catalog REST API (queried by genre).
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// API key sent as the `key` query parameter.
    #[serde(default)]
    pub api_key: String,

    /// Maximum number of titles surfaced per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: String::new(),
            max_results: default_max_results(),
        }
    }
}

/// Genre listing page (used by "Help").
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListConfig {
    #[serde(default = "default_genres_url")]
    pub url: String,

    #[serde(default = "default_heading_selector")]
    pub selector: String,
}

impl Default for GenreListConfig {
    fn default() -> Self {
        Self {
            url: default_genres_url(),
            selector: default_heading_selector(),
        }
    }
}

/// Release listing page (used by `/latest`).
#[derive(Debug, Clone, Deserialize)]
pub struct ReleasesConfig {
    #[serde(default = "default_releases_url")]
    pub url: String,

    #[serde(default = "default_release_entry_selector")]
    pub entry_selector: String,

    #[serde(default = "default_heading_selector")]
    pub title_selector: String,

    #[serde(default = "default_release_date_selector")]
    pub date_selector: String,

    /// Which entry counts as the latest release. The first block on the page
    /// is a promo header, so this is 1 rather than 0.
    #[serde(default = "default_release_entry_index")]
    pub entry_index: usize,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            url: default_releases_url(),
            entry_selector: default_release_entry_selector(),
            title_selector: default_heading_selector(),
            date_selector: default_release_date_selector(),
            entry_index: default_release_entry_index(),
        }
    }
}

/// Upcoming-releases page with cover images and release dates.
#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingConfig {
    #[serde(default = "default_upcoming_url")]
    pub url: String,

    #[serde(default = "default_upcoming_image_selector")]
    pub image_selector: String,

    #[serde(default = "default_upcoming_date_selector")]
    pub date_selector: String,

    /// Number of leading images/dates taken from the page.
    #[serde(default = "default_upcoming_max_items")]
    pub max_items: usize,
}

impl Default for UpcomingConfig {
    fn default() -> Self {
        Self {
            url: default_upcoming_url(),
            image_selector: default_upcoming_image_selector(),
            date_selector: default_upcoming_date_selector(),
            max_items: default_upcoming_max_items(),
        }
    }
}

// ============================================================================
// ConversationConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Give up on the image-count prompt after this many invalid answers in a
    /// row. Unset means keep asking forever.
    #[serde(default)]
    pub max_count_attempts: Option<u32>,

    /// Upper bound on handling one inbound message, adapters included.
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_seconds: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_count_attempts: None,
            handler_timeout_seconds: default_handler_timeout(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
