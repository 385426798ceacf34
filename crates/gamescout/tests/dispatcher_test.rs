//! Conversation behaviour of the dispatcher against fake sources.

mod common;

use std::sync::Arc;

use gamescout::dispatch::reply::{self, Outbound};
use gamescout::dispatch::{ConversationPolicy, Dispatcher};
use gamescout::session::{Flow, SessionKey};
use gamescout::sources::{
    CatalogOutcome, CatalogResult, GenreListing, ReleaseDigest, ReleaseDigestEntry,
};

use common::{Call, FakeSources, dispatcher, test_key};

async fn flow(dispatcher: &Dispatcher, key: &SessionKey) -> Flow {
    dispatcher.sessions().get(key).await.unwrap().flow
}

// ============================================================================
// Genre search
// ============================================================================

#[tokio::test]
async fn action_button_lists_catalog_titles() {
    let sources = Arc::new(FakeSources::new().with_catalog_titles(&["Doom", "Quake", "Hexen"]));
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "Action").await;

    assert_eq!(
        sources.calls(),
        vec![Call::Catalog {
            normalized: "action".to_string()
        }]
    );
    assert_eq!(
        reply.texts(),
        vec!["Here are some games in the 'Action' genre:\n\nDoom\nQuake\nHexen"]
    );
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

#[tokio::test]
async fn unknown_genre_passes_through_case_folded() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    for token in ["Racing", "MASSIVELY-MULTIPLAYER", "Платформер"] {
        dispatcher.dispatch(&key, "Other").await;
        dispatcher.dispatch(&key, token).await;
    }

    assert_eq!(
        sources.calls(),
        vec![
            Call::Catalog {
                normalized: "racing".to_string()
            },
            Call::Catalog {
                normalized: "massively-multiplayer".to_string()
            },
            Call::Catalog {
                normalized: "платформер".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn custom_genre_flow_returns_to_idle() {
    let sources = Arc::new(FakeSources::new().with_catalog_titles(&["Forza"]));
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "Other").await;
    assert_eq!(reply.texts(), vec![reply::ENTER_GENRE]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingCustomGenre);

    let reply = dispatcher.dispatch(&key, "Racing").await;
    assert_eq!(
        reply.texts(),
        vec!["Here are some games in the 'Racing' genre:\n\nForza"]
    );
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

#[tokio::test]
async fn zero_results_is_not_an_outage() {
    let sources = Arc::new(FakeSources::new());
    sources.set_catalog(CatalogOutcome::NoResults);
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "Indie").await;
    assert_eq!(
        reply.texts(),
        vec!["No games found in the 'Indie' genre. Try another genre."]
    );
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);

    sources.set_catalog(CatalogOutcome::Unavailable);
    let reply = dispatcher.dispatch(&key, "Indie").await;
    assert_eq!(reply.texts(), vec![reply::CATALOG_UNAVAILABLE]);
}

#[tokio::test]
async fn five_titles_surface_in_order() {
    // The adapter caps results; the dispatcher shows what it gets, in order
    let sources = Arc::new(FakeSources::new());
    sources.set_catalog(CatalogOutcome::Found(CatalogResult {
        titles: ["A", "B", "C", "D", "E"].map(String::from).to_vec(),
    }));
    let dispatcher = dispatcher(sources);

    let reply = dispatcher.dispatch(&test_key(), "Shooter").await;
    assert_eq!(
        reply.texts(),
        vec!["Here are some games in the 'Shooter' genre:\n\nA\nB\nC\nD\nE"]
    );
}

#[tokio::test]
async fn find_game_shows_genre_keyboard() {
    let dispatcher = dispatcher(Arc::new(FakeSources::new()));

    let reply = dispatcher.dispatch(&test_key(), "Find a game").await;
    assert_eq!(
        reply.items,
        vec![Outbound::text_with_keyboard(
            reply::CHOOSE_GENRE,
            reply::genre_menu()
        )]
    );
}

// ============================================================================
// Help
// ============================================================================

#[tokio::test]
async fn help_lists_genres() {
    let sources = Arc::new(FakeSources::new());
    sources.set_genres(GenreListing::Genres(vec![
        "Action".to_string(),
        "Strategy".to_string(),
    ]));
    let dispatcher = dispatcher(sources.clone());

    let reply = dispatcher.dispatch(&test_key(), "Help").await;
    assert_eq!(sources.calls(), vec![Call::Genres]);
    assert_eq!(
        reply.texts(),
        vec!["Not every genre is listed here, but here are some you can find:\nAction\nStrategy"]
    );
}

#[tokio::test]
async fn help_when_listing_is_down() {
    let dispatcher = dispatcher(Arc::new(FakeSources::new()));
    let reply = dispatcher.dispatch(&test_key(), "Help").await;
    assert_eq!(reply.texts(), vec![reply::GENRES_UNAVAILABLE]);
}

// ============================================================================
// Upcoming releases
// ============================================================================

#[tokio::test]
async fn two_of_four_images_without_notice() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "Upcoming releases").await;
    assert_eq!(reply.texts(), vec![reply::ASK_IMAGE_COUNT]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingImageCount);

    let reply = dispatcher.dispatch(&key, "2").await;
    assert_eq!(sources.calls(), vec![Call::Upcoming { requested: 2 }]);
    assert_eq!(reply.photo_count(), 2);
    assert!(reply.texts().is_empty());
    assert_eq!(
        reply.items[0],
        Outbound::Photo {
            url: "https://img.example/1.jpg".to_string(),
            caption: Some("Release date - 1 June 2026".to_string()),
        }
    );
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

#[tokio::test]
async fn ten_of_four_images_with_notice() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    let reply = dispatcher.dispatch(&key, "10").await;

    assert_eq!(reply.photo_count(), 4);
    assert_eq!(
        reply.texts(),
        vec!["Unfortunately, we only have release dates for 4 games."]
    );
    // Notice comes after the photos
    assert!(matches!(reply.items.last(), Some(Outbound::Text { .. })));
}

#[tokio::test]
async fn invalid_counts_rearm_until_valid() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    for bad in ["-3", "abc", "0"] {
        let reply = dispatcher.dispatch(&key, bad).await;
        assert_eq!(reply.texts(), vec![reply::INVALID_COUNT], "input {bad:?}");
        assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingImageCount);
    }
    assert!(sources.calls().is_empty());

    let reply = dispatcher.dispatch(&key, "3").await;
    assert_eq!(sources.calls(), vec![Call::Upcoming { requested: 3 }]);
    assert_eq!(reply.photo_count(), 3);
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
    assert_eq!(
        dispatcher.sessions().get(&key).await.unwrap().pending_image_count,
        3
    );
}

#[tokio::test]
async fn stray_text_in_idle_is_read_as_a_count() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "1").await;
    assert_eq!(sources.calls(), vec![Call::Upcoming { requested: 1 }]);
    assert_eq!(reply.photo_count(), 1);

    let reply = dispatcher.dispatch(&key, "what's new?").await;
    assert_eq!(reply.texts(), vec![reply::INVALID_COUNT]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingImageCount);
}

#[tokio::test]
async fn upcoming_page_down() {
    let sources = Arc::new(FakeSources::new());
    sources.set_upcoming(None);
    let dispatcher = dispatcher(sources);
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    let reply = dispatcher.dispatch(&key, "2").await;
    assert_eq!(reply.texts(), vec![reply::UPCOMING_UNAVAILABLE]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

#[tokio::test]
async fn bounded_retry_policy_gives_up() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = Dispatcher::new(
        sources,
        ConversationPolicy {
            max_count_attempts: Some(2),
        },
    );
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    dispatcher.dispatch(&key, "nope").await;
    assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingImageCount);

    let reply = dispatcher.dispatch(&key, "still no").await;
    assert_eq!(
        reply.texts(),
        vec![reply::INVALID_COUNT, reply::TOO_MANY_INVALID_COUNTS]
    );
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

// ============================================================================
// Start, Back and slash commands
// ============================================================================

#[tokio::test]
async fn start_resets_from_any_flow() {
    let dispatcher = dispatcher(Arc::new(FakeSources::new()));
    let key = test_key();

    for setup in ["Other", "Upcoming releases", "Find a game"] {
        dispatcher.dispatch(&key, setup).await;
        let reply = dispatcher.dispatch(&key, "/start").await;
        assert_eq!(
            reply.items,
            vec![Outbound::text_with_keyboard(reply::WELCOME, reply::main_menu())]
        );
        assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
    }

    // Idempotent
    let again = dispatcher.dispatch(&key, "/start").await;
    assert_eq!(again.texts(), vec![reply::WELCOME]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
}

#[tokio::test]
async fn back_cancels_pending_flow() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    let reply = dispatcher.dispatch(&key, "Back").await;
    assert_eq!(reply.texts(), vec![reply::WENT_BACK]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::Idle);
    assert!(sources.calls().is_empty());
}

#[tokio::test]
async fn latest_command_keeps_flow() {
    let sources = Arc::new(FakeSources::new());
    sources.set_latest(ReleaseDigest::Latest(ReleaseDigestEntry {
        title: "Hades II".to_string(),
        release_date: "Sep 25, 2025".to_string(),
    }));
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    dispatcher.dispatch(&key, "Upcoming releases").await;
    let reply = dispatcher.dispatch(&key, "/latest").await;

    assert_eq!(reply.texts(), vec!["Latest release: Hades II - Sep 25, 2025"]);
    assert_eq!(sources.calls(), vec![Call::Latest]);
    assert_eq!(flow(&dispatcher, &key).await, Flow::AwaitingImageCount);
}

#[tokio::test]
async fn latest_command_when_unavailable() {
    let dispatcher = dispatcher(Arc::new(FakeSources::new()));
    let reply = dispatcher.dispatch(&test_key(), "/latest@gamescout_bot").await;
    assert_eq!(reply.texts(), vec![reply::RELEASE_UNAVAILABLE]);
}

#[tokio::test]
async fn status_command_reports_flow() {
    let dispatcher = dispatcher(Arc::new(FakeSources::new()));
    let key = test_key();

    let reply = dispatcher.dispatch(&key, "/status").await;
    assert_eq!(
        reply.texts(),
        vec!["No conversation yet. Send /start to begin."]
    );

    dispatcher.dispatch(&key, "Other").await;
    let reply = dispatcher.dispatch(&key, "/status").await;
    assert!(reply.texts()[0].starts_with("Flow: awaiting custom genre\nStarted: "));
}

#[tokio::test]
async fn unknown_slash_command_is_plain_text() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let key = test_key();

    dispatcher.dispatch(&key, "Other").await;
    dispatcher.dispatch(&key, "/rpg").await;
    assert_eq!(
        sources.calls(),
        vec![Call::Catalog {
            normalized: "/rpg".to_string()
        }]
    );
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn sessions_are_isolated_per_user() {
    let sources = Arc::new(FakeSources::new());
    let dispatcher = dispatcher(sources.clone());
    let alice = SessionKey::new("test", "group", "alice");
    let bob = SessionKey::new("test", "group", "bob");

    dispatcher.dispatch(&alice, "Other").await;
    dispatcher.dispatch(&bob, "Upcoming releases").await;

    assert_eq!(flow(&dispatcher, &alice).await, Flow::AwaitingCustomGenre);
    assert_eq!(flow(&dispatcher, &bob).await, Flow::AwaitingImageCount);

    dispatcher.dispatch(&alice, "Puzzle").await;
    assert_eq!(
        sources.calls(),
        vec![Call::Catalog {
            normalized: "puzzle".to_string()
        }]
    );
    assert_eq!(flow(&dispatcher, &bob).await, Flow::AwaitingImageCount);
}
