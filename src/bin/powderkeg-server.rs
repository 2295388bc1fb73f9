//! WebSocket front end for the lobby.
//!
//! One socket is one connection. Text frames carry JSON `ClientIntent`s
//! in and `ServerEvent`s out.
//!
//! Environment:
//! - `POWDERKEG_ADDR`: listen address, default `127.0.0.1:3000`
//! - `POWDERKEG_GAME_CONFIG`: optional path to a JSON `GameConfig`
//! - `RUST_LOG`: tracing filter, default `info`

use std::error::Error;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use powderkeg::core::GameConfig;
use powderkeg::session::{ClientIntent, LobbyHandle, ServerEvent, SessionConfig};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = SessionConfig::default().with_game(load_game_config()?);
    config.validate()?;
    let (lobby, worker) = LobbyHandle::spawn(config);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(lobby);

    let addr: SocketAddr = std::env::var("POWDERKEG_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on ws://{addr}/ws");
    axum::serve(listener, app).await?;

    worker.abort();
    Ok(())
}

fn load_game_config() -> Result<GameConfig, Box<dyn Error>> {
    let Ok(path) = std::env::var("POWDERKEG_GAME_CONFIG") else {
        return Ok(GameConfig::default());
    };
    let raw = std::fs::read_to_string(&path)?;
    let config: GameConfig = serde_json::from_str(&raw)?;
    tracing::info!(%path, "loaded game config");
    Ok(config)
}

async fn ws_handler(State(lobby): State<LobbyHandle>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(lobby, socket))
}

async fn handle_socket(lobby: LobbyHandle, socket: WebSocket) {
    let Ok((connection, mut events)) = lobby.connect().await else {
        return;
    };
    let (mut ws_tx, mut ws_rx) = socket.split();

    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => {
                let intent = match serde_json::from_str::<ClientIntent>(text.as_str()) {
                    Ok(intent) => intent,
                    Err(err) => {
                        tracing::debug!(%connection, error = %err, "malformed message");
                        let _ = lobby.notify(connection, bad_message(&err)).await;
                        continue;
                    }
                };
                if lobby.send(connection, intent).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    let _ = lobby.disconnect(connection).await;
    forward.abort();
}

fn bad_message(err: &serde_json::Error) -> ServerEvent {
    ServerEvent::error(format!("bad message: {err}"))
}
