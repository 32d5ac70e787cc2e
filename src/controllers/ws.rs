use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::Extension;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::controllers::with_state;
use crate::middleware::validate_jwt_token;
use crate::models::notification::ServerFrame;
use crate::models::principal::Principal;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);
const MAX_MISSED_PROBES: u32 = 2;
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

pub fn routes(state: Arc<AppState>) -> Routes {
    Routes::new().add("/ws", with_state(get(upgrade), &state))
}

#[derive(Debug, Deserialize)]
struct AuthenticateFrame {
    #[serde(rename = "type")]
    _kind: String,
    token: String,
}

async fn upgrade(Extension(state): Extension<Arc<AppState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One live connection's full lifecycle: authenticate, then fan server
/// events and periodic liveness probes into the socket until the client
/// disconnects or misses two consecutive probes.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let Some(principal) = authenticate(&mut socket, &state.auth_config.jwt_secret).await else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    let mut events = state.notifications.register(principal.user_id).await;
    let mut missed_probes = 0u32;
    let mut ticker = tokio::time::interval(PING_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if missed_probes >= MAX_MISSED_PROBES {
                    break;
                }
                let Ok(text) = serde_json::to_string(&ServerFrame::Ping) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
                missed_probes += 1;
            }
            frame = events.recv() => {
                let Some(frame) = frame else { break };
                let Ok(text) = serde_json::to_string(&frame) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => missed_probes = 0,
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.notifications.unregister(principal.user_id).await;
}

async fn authenticate(socket: &mut WebSocket, jwt_secret: &str) -> Option<Principal> {
    let message = tokio::time::timeout(AUTH_TIMEOUT, socket.recv()).await.ok()??.ok()?;
    let Message::Text(text) = message else { return None };
    let frame: AuthenticateFrame = serde_json::from_str(&text).ok()?;
    let claims = validate_jwt_token(&frame.token, jwt_secret).ok()?;
    Some(claims.to_principal())
}
