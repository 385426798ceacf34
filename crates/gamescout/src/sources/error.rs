use thiserror::Error;

/// Failure while talking to an external data source.
///
/// These never reach the user directly: adapters log them and report the
/// source as unavailable.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Parse a CSS selector from configuration.
pub(crate) fn parse_selector(selector: &str) -> Result<scraper::Selector, SourceError> {
    scraper::Selector::parse(selector).map_err(|e| SourceError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
