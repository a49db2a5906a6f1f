//! A bot that logs in, lurks, and reports the rooms it lands in.
//!
//! ```text
//! KGS_URL=http://localhost:8080/jsonClient/access \
//! KGS_NAME=OSRBot KGS_PASSWORD= \
//! RUST_LOG=info,kgsbot_session=debug \
//! cargo run -p lurker-bot
//! ```
//!
//! Ctrl-C logs out cleanly.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kgsbot::prelude::*;

const DEFAULT_URL: &str = "http://localhost:8080/jsonClient/access";

#[tokio::main]
async fn main() -> Result<(), KgsError> {
    kgsbot::init_tracing("info");

    let url = env::var("KGS_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let name = env::var("KGS_NAME").unwrap_or_else(|_| "OSRBot".to_string());
    let password = env::var("KGS_PASSWORD").unwrap_or_default();

    let mut conn = KgsClient::builder()
        .url(url)
        .credentials(name, password)
        .connect()
        .await?;

    // Count ROOM_JOIN replies; the count doubles as a liveness signal.
    let joins = Arc::new(AtomicUsize::new(0));
    {
        let joins = Arc::clone(&joins);
        conn.subscribe(
            "ROOM_JOIN",
            callback(move |resp| {
                let n = joins.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::info!(status = resp.status, joins = n, "ROOM_JOIN answered");
            }),
        )?;
    }

    // See what the server pushed on login.
    for message in conn.poll().await? {
        match message.body() {
            MessageBody::LoginSuccess(success) => {
                tracing::info!(
                    rooms = success.rooms.len(),
                    friends = success.friends.len(),
                    "logged in"
                );
            }
            MessageBody::RoomJoin(join) => {
                tracing::info!(
                    channel = join.channel_id,
                    users = join.users.len(),
                    "in room"
                );
            }
            other => tracing::debug!(message_type = %other.message_type(), "ignored"),
        }
    }

    loop {
        tokio::select! {
            step = conn.step_loop() => {
                if !step? {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, logging out");
                conn.close().await?;
                break;
            }
        }
    }

    tracing::info!(joins = joins.load(Ordering::Relaxed), "bye");
    Ok(())
}
