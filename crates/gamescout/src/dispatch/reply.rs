//! Outbound replies and the user-facing texts.

use gamescout_gateway_protocol::ReplyKeyboard;

use crate::genre::GenreQuery;
use crate::sources::{CatalogOutcome, GenreListing, ImageBatchOutcome, ReleaseDigest};

// Keyboard labels. Pressing a button sends the label back as text.
pub const FIND_GAME: &str = "Find a game";
pub const UPCOMING_RELEASES: &str = "Upcoming releases";
pub const HELP: &str = "Help";
pub const ACTION: &str = "Action";
pub const INDIE: &str = "Indie";
pub const SHOOTER: &str = "Shooter";
pub const OTHER: &str = "Other";
pub const BACK: &str = "Back";

pub const WELCOME: &str = "Hi! Choose what you are looking for.";
pub const WENT_BACK: &str = "You went back.";
pub const CHOOSE_GENRE: &str = "Choose a game genre:";
pub const ENTER_GENRE: &str = "Please enter your genre:";
pub const ASK_IMAGE_COUNT: &str = "How many releases would you like to see?";
pub const INVALID_COUNT: &str = "Please enter a valid number.";
pub const TOO_MANY_INVALID_COUNTS: &str = "Too many invalid answers, back to the main menu.";
pub const CATALOG_UNAVAILABLE: &str =
    "Something went wrong with the game catalog, please try again later.";
pub const GENRES_UNAVAILABLE: &str = "Failed to fetch genres.";
pub const RELEASE_UNAVAILABLE: &str = "Couldn't get information about the latest release.";
pub const UPCOMING_UNAVAILABLE: &str = "Couldn't load upcoming releases, please try again later.";
pub const HANDLER_TIMEOUT: &str = "Sorry, that took too long. Please try again.";

/// One message sent back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text {
        text: String,
        keyboard: Option<ReplyKeyboard>,
    },
    Photo {
        url: String,
        caption: Option<String>,
    },
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Outbound::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn text_with_keyboard(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Outbound::Text {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    /// Text content, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Outbound::Text { text, .. } => Some(text),
            Outbound::Photo { .. } => None,
        }
    }
}

/// Everything produced for one inbound message, in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub items: Vec<Outbound>,
}

impl Reply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            items: vec![Outbound::text(text)],
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: ReplyKeyboard) -> Self {
        Self {
            items: vec![Outbound::text_with_keyboard(text, keyboard)],
        }
    }

    pub fn push(&mut self, item: Outbound) {
        self.items.push(item);
    }

    pub fn extend(&mut self, other: Reply) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All text messages, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().filter_map(Outbound::as_text).collect()
    }

    /// Number of photos in the reply.
    pub fn photo_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, Outbound::Photo { .. }))
            .count()
    }
}

pub fn main_menu() -> ReplyKeyboard {
    ReplyKeyboard::single_row([FIND_GAME, UPCOMING_RELEASES, HELP])
}

pub fn genre_menu() -> ReplyKeyboard {
    ReplyKeyboard::single_row([ACTION, INDIE, SHOOTER, OTHER, BACK])
}

// ============================================================================
// Outcome rendering
// ============================================================================

pub fn render_catalog(genre: &GenreQuery, outcome: &CatalogOutcome) -> Reply {
    match outcome {
        CatalogOutcome::Found(result) => Reply::text(format!(
            "Here are some games in the '{genre}' genre:\n\n{}",
            result.titles.join("\n")
        )),
        CatalogOutcome::NoResults => Reply::text(format!(
            "No games found in the '{genre}' genre. Try another genre."
        )),
        CatalogOutcome::Unavailable => Reply::text(CATALOG_UNAVAILABLE),
    }
}

pub fn render_genres(listing: &GenreListing) -> Reply {
    match listing {
        GenreListing::Genres(genres) => Reply::text(format!(
            "Not every genre is listed here, but here are some you can find:\n{}",
            genres.join("\n")
        )),
        GenreListing::Unavailable => Reply::text(GENRES_UNAVAILABLE),
    }
}

pub fn render_release(digest: &ReleaseDigest) -> Reply {
    match digest {
        ReleaseDigest::Latest(entry) => Reply::text(format!("Latest release: {entry}")),
        ReleaseDigest::Unavailable => Reply::text(RELEASE_UNAVAILABLE),
    }
}

pub fn render_images(outcome: &ImageBatchOutcome) -> Reply {
    let batch = match outcome {
        ImageBatchOutcome::Batch(batch) => batch,
        ImageBatchOutcome::Unavailable => return Reply::text(UPCOMING_UNAVAILABLE),
    };

    let mut reply = Reply::new();
    for entry in &batch.entries {
        reply.push(Outbound::Photo {
            url: entry.image_url.clone(),
            caption: Some(format!("Release date - {}", entry.release_date)),
        });
    }
    if batch.exceeded_available {
        reply.push(Outbound::text(format!(
            "Unfortunately, we only have release dates for {} games.",
            batch.available
        )));
    }
    reply
}
