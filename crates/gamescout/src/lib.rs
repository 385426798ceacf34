//! gamescout: a chat front-end for browsing video-game information.
//!
//! Inbound text from a chat gateway is routed through a per-session
//! conversation state machine ([`dispatch`]) which decides which external
//! source to query ([`sources`]) and renders the result as chat replies.

pub mod build_info;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod genre;
pub mod session;
pub mod sources;
pub mod sync;
