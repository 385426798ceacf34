//! The conversation state machine.
//!
//! [`transition`] is a pure function of the current session and one inbound
//! text. It never touches the network: anything needing a data source is
//! returned as an [`Action`] for the dispatcher to execute.
//!
//! | Flow                  | Input                 | Next flow             | Effect                |
//! |-----------------------|-----------------------|-----------------------|-----------------------|
//! | any                   | `/start`              | Idle                  | welcome + main menu   |
//! | any                   | Back                  | Idle                  | "went back" + menu    |
//! | Idle                  | Find a game           | Idle                  | genre menu            |
//! | Idle                  | Action/Indie/Shooter  | Idle                  | catalog query         |
//! | Idle                  | Other                 | AwaitingCustomGenre   | genre prompt          |
//! | Idle                  | Help                  | Idle                  | genre listing         |
//! | Idle                  | Upcoming releases     | AwaitingImageCount    | count prompt          |
//! | Idle                  | anything else         | (as AwaitingImageCount) | default route       |
//! | AwaitingCustomGenre   | text                  | Idle                  | catalog query         |
//! | AwaitingImageCount    | positive integer      | Idle                  | image batch           |
//! | AwaitingImageCount    | anything else         | AwaitingImageCount    | validation message    |

use crate::genre::GenreQuery;
use crate::session::{Flow, Session};

use super::reply::{self, Reply};

/// Knobs that change how the machine treats repeated bad input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationPolicy {
    /// Leave the image-count prompt after this many invalid answers in a row.
    /// `None` keeps asking forever.
    pub max_count_attempts: Option<u32>,
}

/// What the dispatcher has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send this reply; nothing else to fetch.
    Reply(Reply),
    QueryCatalog(GenreQuery),
    ListGenres,
    FetchImages(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub action: Action,
}

/// Inbound text, classified against the fixed commands and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event<'a> {
    Start,
    Back,
    FindGame,
    Genre(&'a str),
    OtherGenre,
    Help,
    UpcomingReleases,
    Text(&'a str),
}

impl<'a> Event<'a> {
    fn classify(text: &'a str) -> Self {
        let trimmed = text.trim();
        if is_start_command(trimmed) {
            return Event::Start;
        }
        match trimmed {
            reply::BACK => Event::Back,
            reply::FIND_GAME => Event::FindGame,
            reply::ACTION | reply::INDIE | reply::SHOOTER => Event::Genre(trimmed),
            reply::OTHER => Event::OtherGenre,
            reply::HELP => Event::Help,
            reply::UPCOMING_RELEASES => Event::UpcomingReleases,
            _ => Event::Text(text),
        }
    }
}

/// `/start`, optionally addressed to a bot (`/start@name`) or with a payload.
fn is_start_command(text: &str) -> bool {
    let Some(command) = text.split_whitespace().next() else {
        return false;
    };
    let name = command.split('@').next().unwrap_or(command);
    name == "/start"
}

/// Compute the next session and the action for one inbound text.
pub fn transition(session: &Session, text: &str, policy: &ConversationPolicy) -> Transition {
    let mut next = session.clone();
    let event = Event::classify(text);

    // Reset commands win in every flow
    match event {
        Event::Start => {
            next.reset();
            return reply_with(next, Reply::with_keyboard(reply::WELCOME, reply::main_menu()));
        }
        Event::Back => {
            next.reset();
            return reply_with(next, Reply::with_keyboard(reply::WENT_BACK, reply::main_menu()));
        }
        _ => {}
    }

    match session.flow {
        Flow::Idle => idle(next, event, text, policy),
        Flow::AwaitingCustomGenre => custom_genre(next, text),
        Flow::AwaitingImageCount => image_count(next, text, policy),
    }
}

fn idle(mut next: Session, event: Event<'_>, text: &str, policy: &ConversationPolicy) -> Transition {
    match event {
        Event::FindGame => {
            reply_with(next, Reply::with_keyboard(reply::CHOOSE_GENRE, reply::genre_menu()))
        }
        Event::Genre(label) => match GenreQuery::from_input(label) {
            Some(query) => Transition {
                session: next,
                action: Action::QueryCatalog(query),
            },
            None => reply_with(next, Reply::new()),
        },
        Event::OtherGenre => {
            next.enter(Flow::AwaitingCustomGenre);
            reply_with(next, Reply::text(reply::ENTER_GENRE))
        }
        Event::Help => Transition {
            session: next,
            action: Action::ListGenres,
        },
        Event::UpcomingReleases => {
            next.enter(Flow::AwaitingImageCount);
            reply_with(next, Reply::text(reply::ASK_IMAGE_COUNT))
        }
        // Default route: unmatched text in Idle is read as an image count,
        // exactly as if the count prompt had been shown.
        Event::Text(_) | Event::Start | Event::Back => image_count(next, text, policy),
    }
}

fn custom_genre(mut next: Session, text: &str) -> Transition {
    match GenreQuery::from_input(text) {
        Some(query) => {
            next.reset();
            Transition {
                session: next,
                action: Action::QueryCatalog(query),
            }
        }
        // Blank input keeps the prompt open
        None => reply_with(next, Reply::text(reply::ENTER_GENRE)),
    }
}

fn image_count(mut next: Session, text: &str, policy: &ConversationPolicy) -> Transition {
    if let Some(count) = parse_image_count(text) {
        next.pending_image_count = count;
        next.reset();
        return Transition {
            session: next,
            action: Action::FetchImages(count),
        };
    }

    let attempts = if next.flow == Flow::AwaitingImageCount {
        next.invalid_count_attempts.saturating_add(1)
    } else {
        1
    };

    if let Some(max) = policy.max_count_attempts
        && attempts >= max
    {
        next.reset();
        let mut out = Reply::text(reply::INVALID_COUNT);
        out.extend(Reply::with_keyboard(
            reply::TOO_MANY_INVALID_COUNTS,
            reply::main_menu(),
        ));
        return reply_with(next, out);
    }

    next.enter(Flow::AwaitingImageCount);
    next.invalid_count_attempts = attempts;
    reply_with(next, Reply::text(reply::INVALID_COUNT))
}

/// Parse a positive image count. Counts beyond `u32::MAX` are clamped.
pub fn parse_image_count(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u32>() {
        Ok(0) => None,
        Ok(n) => Some(n),
        // All digits, so the only failure left is overflow
        Err(_) => Some(u32::MAX),
    }
}

fn reply_with(session: Session, reply: Reply) -> Transition {
    Transition {
        session,
        action: Action::Reply(reply),
    }
}
