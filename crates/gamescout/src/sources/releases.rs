use scraper::{Html, Selector};

use super::ReleaseDigestEntry;
use super::error::{SourceError, parse_selector};
use super::genres::element_text;

/// Selectors for the release listing page.
#[derive(Debug, Clone)]
pub struct ReleaseSelectors {
    pub entry: Selector,
    pub title: Selector,
    pub date: Selector,
}

impl ReleaseSelectors {
    pub fn parse(entry: &str, title: &str, date: &str) -> Result<Self, SourceError> {
        Ok(Self {
            entry: parse_selector(entry)?,
            title: parse_selector(title)?,
            date: parse_selector(date)?,
        })
    }
}

/// Pick the release entry at `entry_index` from the listing page.
///
/// Returns `None` when the page has too few entries or the chosen entry lacks
/// a title or date.
pub fn parse_release_digest(
    html: &str,
    selectors: &ReleaseSelectors,
    entry_index: usize,
) -> Option<ReleaseDigestEntry> {
    let document = Html::parse_document(html);
    let entry = document.select(&selectors.entry).nth(entry_index)?;

    let title = entry
        .select(&selectors.title)
        .next()
        .map(|e| element_text(&e))
        .filter(|t| !t.is_empty())?;
    let release_date = entry
        .select(&selectors.date)
        .next()
        .map(|e| element_text(&e))
        .filter(|d| !d.is_empty())?;

    Some(ReleaseDigestEntry {
        title,
        release_date,
    })
}
