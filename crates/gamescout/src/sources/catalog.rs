use serde::Deserialize;

use super::{CatalogOutcome, CatalogResult, SourceError};

/// Parse a catalog API response body.
///
/// Keeps at most `max_results` titles in source order, skipping entries
/// without a name. An empty or missing `results` array means the genre has
/// no games.
pub fn parse_catalog(body: &str, max_results: usize) -> Result<CatalogOutcome, SourceError> {
    let response: CatalogResponse = serde_json::from_str(body)?;

    let titles: Vec<String> = response
        .results
        .into_iter()
        .filter_map(|game| game.name)
        .take(max_results)
        .collect();

    if titles.is_empty() {
        return Ok(CatalogOutcome::NoResults);
    }
    Ok(CatalogOutcome::Found(CatalogResult { titles }))
}

// ============================================================================
// Private Types
// ============================================================================

#[derive(Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    results: Vec<CatalogGame>,
}

#[derive(Deserialize)]
struct CatalogGame {
    #[serde(default)]
    name: Option<String>,
}
