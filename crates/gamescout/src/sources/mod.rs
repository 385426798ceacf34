//! External data sources.
//!
//! Each adapter turns one upstream response into a typed outcome. Transport
//! errors, bad statuses and empty scrapes all end up as an `Unavailable`
//! variant; "no results" is kept distinct so the reply can suggest another
//! query instead of blaming the source.
//!
//! The HTML and JSON parsers are plain functions over the response body.
//! [`WebSources`] does the HTTP part and is the production [`GameSources`].

mod catalog;
mod error;
mod genres;
mod releases;
mod upcoming;
mod web;

use std::fmt;

use async_trait::async_trait;

use crate::genre::GenreQuery;

pub use catalog::parse_catalog;
pub use error::SourceError;
pub use genres::parse_genres;
pub use releases::{ReleaseSelectors, parse_release_digest};
pub use upcoming::{UpcomingSelectors, parse_image_batch};
pub use web::WebSources;

/// The data sources the dispatcher can consult.
///
/// Every method resolves to an outcome rather than an error.
#[async_trait]
pub trait GameSources: Send + Sync {
    /// Query the game catalog by genre.
    async fn query_catalog(&self, genre: &GenreQuery) -> CatalogOutcome;

    /// Fetch the list of genre names shown by "Help".
    async fn list_genres(&self) -> GenreListing;

    /// Fetch the latest release from the release listing.
    async fn latest_release(&self) -> ReleaseDigest;

    /// Fetch up to `requested` upcoming-release images.
    async fn upcoming_images(&self, requested: u32) -> ImageBatchOutcome;
}

// ============================================================================
// Catalog
// ============================================================================

/// Titles returned by the catalog, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogResult {
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogOutcome {
    Found(CatalogResult),
    /// The catalog answered but had nothing for this genre.
    NoResults,
    Unavailable,
}

// ============================================================================
// Genre listing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreListing {
    Genres(Vec<String>),
    Unavailable,
}

// ============================================================================
// Release digest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDigestEntry {
    pub title: String,
    pub release_date: String,
}

impl fmt::Display for ReleaseDigestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.release_date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseDigest {
    Latest(ReleaseDigestEntry),
    Unavailable,
}

// ============================================================================
// Image batch
// ============================================================================

/// One upcoming release: cover image plus its release date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatchEntry {
    pub image_url: String,
    pub release_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch {
    pub entries: Vec<ImageBatchEntry>,
    /// How many entries the page offers at most.
    pub available: usize,
    /// The user asked for more than `available`.
    pub exceeded_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBatchOutcome {
    Batch(ImageBatch),
    Unavailable,
}
