use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::build_info;
use crate::config::SourcesConfig;
use crate::genre::GenreQuery;

use super::error::parse_selector;
use super::{
    CatalogOutcome, GameSources, GenreListing, ImageBatchOutcome, ReleaseDigest,
    ReleaseSelectors, SourceError, UpcomingSelectors, parse_catalog, parse_genres,
    parse_image_batch, parse_release_digest,
};

/// Maximum bytes read from any upstream page (4 MB).
const MAX_BODY_BYTES: usize = 4 * 1_048_576;

/// [`GameSources`] backed by the public catalog API and scraped pages.
///
/// One HTTP client is shared by all adapters. No request is retried.
pub struct WebSources {
    client: reqwest::Client,
    catalog_url: url::Url,
    api_key: String,
    max_results: usize,
    genres_url: String,
    genre_selector: scraper::Selector,
    releases_url: String,
    release_selectors: ReleaseSelectors,
    release_entry_index: usize,
    upcoming_url: String,
    upcoming_selectors: UpcomingSelectors,
    upcoming_max_items: usize,
}

impl WebSources {
    /// Build the adapters from configuration.
    ///
    /// Fails on a malformed catalog URL or CSS selector.
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(build_info::default_user_agent);
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        let catalog_url =
            url::Url::parse(&config.catalog.base_url).map_err(|source| SourceError::InvalidUrl {
                url: config.catalog.base_url.clone(),
                source,
            })?;

        let releases = &config.releases;
        let upcoming = &config.upcoming;

        Ok(Self {
            client,
            catalog_url,
            api_key: config.catalog.api_key.clone(),
            max_results: config.catalog.max_results,
            genres_url: config.genres.url.clone(),
            genre_selector: parse_selector(&config.genres.selector)?,
            releases_url: releases.url.clone(),
            release_selectors: ReleaseSelectors::parse(
                &releases.entry_selector,
                &releases.title_selector,
                &releases.date_selector,
            )?,
            release_entry_index: releases.entry_index,
            upcoming_url: upcoming.url.clone(),
            upcoming_selectors: UpcomingSelectors::parse(
                &upcoming.image_selector,
                &upcoming.date_selector,
            )?,
            upcoming_max_items: upcoming.max_items,
        })
    }

    fn catalog_request_url(&self, genre: &GenreQuery) -> url::Url {
        let mut url = self.catalog_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("genres", &genre.normalized);
            if !self.api_key.is_empty() {
                query.append_pair("key", &self.api_key);
            }
        }
        url
    }

    async fn fetch_catalog(&self, genre: &GenreQuery) -> Result<CatalogOutcome, SourceError> {
        let url = self.catalog_request_url(genre);
        let body = self.fetch_text(url.as_str()).await?;
        parse_catalog(&body, self.max_results)
    }

    /// GET a URL and return the body as text, failing on non-success status.
    async fn fetch_text(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                // Never log the API key
                url: redact_query(url),
                status,
            });
        }

        let body = read_limited_body(response, MAX_BODY_BYTES).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl GameSources for WebSources {
    async fn query_catalog(&self, genre: &GenreQuery) -> CatalogOutcome {
        match self.fetch_catalog(genre).await {
            Ok(outcome) => {
                debug!(genre = %genre.normalized, outcome = ?outcome, "Catalog queried");
                outcome
            }
            Err(e) => {
                warn!(genre = %genre.normalized, error = %e, "Catalog query failed");
                CatalogOutcome::Unavailable
            }
        }
    }

    async fn list_genres(&self) -> GenreListing {
        let html = match self.fetch_text(&self.genres_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to fetch genre listing");
                return GenreListing::Unavailable;
            }
        };

        let genres = parse_genres(&html, &self.genre_selector);
        if genres.is_empty() {
            warn!(url = %self.genres_url, "Genre listing page had no genres");
            return GenreListing::Unavailable;
        }
        GenreListing::Genres(genres)
    }

    async fn latest_release(&self) -> ReleaseDigest {
        let html = match self.fetch_text(&self.releases_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to fetch release listing");
                return ReleaseDigest::Unavailable;
            }
        };

        match parse_release_digest(&html, &self.release_selectors, self.release_entry_index) {
            Some(entry) => ReleaseDigest::Latest(entry),
            None => {
                warn!(
                    url = %self.releases_url,
                    entry_index = self.release_entry_index,
                    "Release listing had no usable entry"
                );
                ReleaseDigest::Unavailable
            }
        }
    }

    async fn upcoming_images(&self, requested: u32) -> ImageBatchOutcome {
        let html = match self.fetch_text(&self.upcoming_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to fetch upcoming releases");
                return ImageBatchOutcome::Unavailable;
            }
        };

        let outcome = parse_image_batch(
            &html,
            &self.upcoming_selectors,
            self.upcoming_max_items,
            requested,
        );
        if outcome == ImageBatchOutcome::Unavailable {
            warn!(url = %self.upcoming_url, "Upcoming releases page had no images");
        }
        outcome
    }
}

/// Read response body up to a byte limit.
async fn read_limited_body(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, reqwest::Error> {
    use futures::StreamExt;

    let mut stream = response.bytes_stream();
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let remaining = limit.saturating_sub(body.len());
        if remaining == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
    }

    Ok(body)
}

/// Strip the query string from a URL for logging.
fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?..."),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources_with_key(key: &str) -> WebSources {
        let mut config = SourcesConfig::default();
        config.catalog.api_key = key.to_string();
        WebSources::new(&config).unwrap()
    }

    #[test]
    fn catalog_url_uses_normalized_genre_and_key() {
        let sources = sources_with_key("secret");
        let genre = GenreQuery::from_input("Action").unwrap();
        assert_eq!(
            sources.catalog_request_url(&genre).as_str(),
            "https://api.rawg.io/api/games?genres=action&key=secret"
        );
    }

    #[test]
    fn catalog_url_escapes_free_text() {
        let sources = sources_with_key("");
        let genre = GenreQuery::from_input("Massively Multiplayer").unwrap();
        assert_eq!(
            sources.catalog_request_url(&genre).as_str(),
            "https://api.rawg.io/api/games?genres=massively+multiplayer"
        );
    }

    #[test]
    fn new_rejects_bad_selector() {
        let mut config = SourcesConfig::default();
        config.upcoming.image_selector = "img[".to_string();
        assert!(matches!(
            WebSources::new(&config),
            Err(SourceError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn new_rejects_bad_catalog_url() {
        let mut config = SourcesConfig::default();
        config.catalog.base_url = "not a url".to_string();
        assert!(matches!(
            WebSources::new(&config),
            Err(SourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn redact_query_hides_parameters() {
        assert_eq!(
            redact_query("https://api.rawg.io/api/games?genres=action&key=secret"),
            "https://api.rawg.io/api/games?..."
        );
        assert_eq!(redact_query("https://rawg.io/genres"), "https://rawg.io/genres");
    }
}
