//! Common test utilities.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use gamescout::dispatch::{ConversationPolicy, Dispatcher};
use gamescout::genre::GenreQuery;
use gamescout::session::SessionKey;
use gamescout::sources::{
    CatalogOutcome, CatalogResult, GameSources, GenreListing, ImageBatch, ImageBatchEntry,
    ImageBatchOutcome, ReleaseDigest,
};

/// A source call recorded by [`FakeSources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Catalog { normalized: String },
    Genres,
    Latest,
    Upcoming { requested: u32 },
}

/// In-memory [`GameSources`] with canned outcomes that records every call.
pub struct FakeSources {
    catalog: Mutex<CatalogOutcome>,
    genres: Mutex<GenreListing>,
    latest: Mutex<ReleaseDigest>,
    /// Entries on the fake upcoming page; `None` means the page is down.
    upcoming: Mutex<Option<Vec<ImageBatchEntry>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeSources {
    pub fn new() -> Self {
        Self {
            catalog: Mutex::new(CatalogOutcome::NoResults),
            genres: Mutex::new(GenreListing::Unavailable),
            latest: Mutex::new(ReleaseDigest::Unavailable),
            upcoming: Mutex::new(Some(upcoming_entries(4))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_catalog_titles(self, titles: &[&str]) -> Self {
        self.set_catalog(CatalogOutcome::Found(CatalogResult {
            titles: titles.iter().map(|t| t.to_string()).collect(),
        }));
        self
    }

    pub fn set_catalog(&self, outcome: CatalogOutcome) {
        *self.catalog.lock().unwrap() = outcome;
    }

    pub fn set_genres(&self, listing: GenreListing) {
        *self.genres.lock().unwrap() = listing;
    }

    pub fn set_latest(&self, digest: ReleaseDigest) {
        *self.latest.lock().unwrap() = digest;
    }

    pub fn set_upcoming(&self, entries: Option<Vec<ImageBatchEntry>>) {
        *self.upcoming.lock().unwrap() = entries;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GameSources for FakeSources {
    async fn query_catalog(&self, genre: &GenreQuery) -> CatalogOutcome {
        self.record(Call::Catalog {
            normalized: genre.normalized.clone(),
        });
        self.catalog.lock().unwrap().clone()
    }

    async fn list_genres(&self) -> GenreListing {
        self.record(Call::Genres);
        self.genres.lock().unwrap().clone()
    }

    async fn latest_release(&self) -> ReleaseDigest {
        self.record(Call::Latest);
        self.latest.lock().unwrap().clone()
    }

    async fn upcoming_images(&self, requested: u32) -> ImageBatchOutcome {
        self.record(Call::Upcoming { requested });
        let Some(entries) = self.upcoming.lock().unwrap().clone() else {
            return ImageBatchOutcome::Unavailable;
        };
        let available = entries.len();
        let requested = requested as usize;
        ImageBatchOutcome::Batch(ImageBatch {
            entries: entries.into_iter().take(requested).collect(),
            available,
            exceeded_available: requested > available,
        })
    }
}

/// `count` upcoming entries with predictable urls and dates.
pub fn upcoming_entries(count: usize) -> Vec<ImageBatchEntry> {
    (1..=count)
        .map(|i| ImageBatchEntry {
            image_url: format!("https://img.example/{i}.jpg"),
            release_date: format!("{i} June 2026"),
        })
        .collect()
}

/// Dispatcher over `sources` with the default (unbounded) policy.
pub fn dispatcher(sources: Arc<FakeSources>) -> Dispatcher {
    Dispatcher::new(sources, ConversationPolicy::default())
}

pub fn test_key() -> SessionKey {
    SessionKey::new("test", "chat-1", "user-1")
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve_fixtures(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
