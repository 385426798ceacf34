//! Local console chat: the dispatcher over stdin/stdout.

use std::fmt::Write as _;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use gamescout::config::Config;
use gamescout::dispatch::{Outbound, Reply};
use gamescout::session::SessionKey;

use super::build_dispatcher;

/// Gateway name used for console sessions.
const CONSOLE_GATEWAY: &str = "console";

pub async fn run(config_path: &str, user: &str) -> Result<()> {
    let config = Config::load(config_path).await?;
    let dispatcher = build_dispatcher(&config)?;
    let key = SessionKey::new(CONSOLE_GATEWAY, "local", user);

    println!("Chatting as '{}' (Ctrl+D or /exit to quit)", user);
    println!("Send /start to see the menu.");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(input) = lines.next_line().await? else {
            println!();
            break;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/exit" || input == "/quit" {
            break;
        }

        let reply = dispatcher.dispatch(&key, input).await;
        stdout.write_all(render_reply(&reply).as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Console rendering of a reply: text as-is, keyboards as `[label]` rows,
/// photos as one line each.
fn render_reply(reply: &Reply) -> String {
    let mut out = String::new();
    for item in &reply.items {
        match item {
            Outbound::Text { text, keyboard } => {
                let _ = writeln!(out, "{text}");
                if let Some(keyboard) = keyboard {
                    for row in &keyboard.rows {
                        let buttons: Vec<String> =
                            row.iter().map(|label| format!("[{label}]")).collect();
                        let _ = writeln!(out, "  {}", buttons.join(" "));
                    }
                }
            }
            Outbound::Photo { url, caption } => match caption {
                Some(caption) => {
                    let _ = writeln!(out, "[photo] {url}\n        {caption}");
                }
                None => {
                    let _ = writeln!(out, "[photo] {url}");
                }
            },
        }
    }
    out.push('\n');
    out
}
