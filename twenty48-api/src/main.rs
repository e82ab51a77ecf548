//! Web API for the 2048 game engine.
//!
//! The server is stateless: a new game is returned to the client as a
//! snapshot, and every move request carries the full snapshot back, so
//! no game state lives on the server and handlers need no locking. The
//! engine rejects corrupt snapshots instead of repairing them.
//!
//! Contract:
//! - `GET /health` -> `{"status": "ok"}`
//! - `POST /game` with `{"action": "new"}` ->
//!   `{"success": true, "gameState": {...}}`
//! - `POST /game` with `{"action": "move", "direction": "left",
//!   "gameState": {...}}` ->
//!   `{"success": true, "moved": bool, "gameState": {...}}`
//! - client errors -> `400 {"success": false, "error": "..."}`

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use twenty48_core::{Direction, Game, Snapshot};

#[derive(Parser, Debug)]
struct Args {
    /// Host interface to bind (default 0.0.0.0).
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind (default 8080).
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Tracing filter, e.g. "info", "debug".
    #[arg(long, default_value = "info")]
    log: String,
}

// =============================================================================
// JSON Models
// =============================================================================

#[derive(Deserialize)]
struct GameRequest {
    #[serde(default = "default_action")]
    action: String,
    direction: Option<String>,
    #[serde(rename = "gameState")]
    game_state: Option<Snapshot>,
}

fn default_action() -> String {
    "new".to_string()
}

#[derive(Serialize, Debug)]
struct GameResponse {
    success: bool,
    /// Present on "move" responses only.
    #[serde(skip_serializing_if = "Option::is_none")]
    moved: Option<bool>,
    #[serde(rename = "gameState")]
    game_state: Snapshot,
}

#[derive(Serialize, Debug)]
struct ErrorBody {
    success: bool,
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn game(
    payload: Result<Json<GameRequest>, JsonRejection>,
) -> Result<Json<GameResponse>, ApiError> {
    let Json(request) = payload.map_err(|err| bad_request(err.body_text()))?;
    match request.action.as_str() {
        "new" => {
            let game = Game::new_thread();
            Ok(Json(GameResponse {
                success: true,
                moved: None,
                game_state: game.snapshot(),
            }))
        }
        "move" => {
            let direction = request
                .direction
                .ok_or_else(|| bad_request("Direction is required"))?;
            let direction: Direction = direction
                .parse()
                .map_err(|err| bad_request(format!("{err}")))?;
            let snapshot = request
                .game_state
                .ok_or_else(|| bad_request("gameState is required"))?;
            let mut game =
                Game::from_snapshot(&snapshot).map_err(|err| bad_request(format!("{err}")))?;

            let mut rng = rand::rng();
            let moved = game.apply(direction, &mut rng);

            Ok(Json(GameResponse {
                success: true,
                moved: Some(moved),
                game_state: game.snapshot(),
            }))
        }
        _ => Err(bad_request("Invalid action")),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(args.log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/game", post(game))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid host/port combination")?;
    info!(%addr, "2048 API listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_defaults_to_new() {
        let request: GameRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.action, "new");
        assert!(request.direction.is_none());
        assert!(request.game_state.is_none());
    }

    #[test]
    fn move_request_parses_snapshot() {
        let body = serde_json::json!({
            "action": "move",
            "direction": "left",
            "gameState": {
                "board": [[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 2]],
                "score": 16,
                "gameOver": false
            }
        });
        let request: GameRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.action, "move");
        assert_eq!(request.direction.as_deref(), Some("left"));
        assert_eq!(request.game_state.unwrap().score, 16);
    }

    #[tokio::test]
    async fn new_game_response_shape() {
        let response = game(Ok(Json(serde_json::from_str("{}").unwrap())))
            .await
            .unwrap();
        let value = serde_json::to_value(&response.0).unwrap();

        assert_eq!(value["success"], true);
        // "moved" is a move-only field.
        assert!(value.get("moved").is_none());
        assert_eq!(value["gameState"]["score"], 0);
        assert_eq!(value["gameState"]["gameOver"], false);
        assert_eq!(value["gameState"]["board"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn move_without_direction_is_rejected() {
        let request = serde_json::from_value(serde_json::json!({"action": "move"})).unwrap();
        let (status, body) = game(Ok(Json(request))).await.unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.0.success);
        assert_eq!(body.0.error, "Direction is required");
    }

    #[tokio::test]
    async fn move_with_unknown_direction_is_rejected() {
        let request = serde_json::from_value(serde_json::json!({
            "action": "move",
            "direction": "sideways"
        }))
        .unwrap();
        let (status, body) = game(Ok(Json(request))).await.unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.error.contains("direction"));
    }

    #[tokio::test]
    async fn move_with_corrupt_snapshot_is_rejected() {
        let request = serde_json::from_value(serde_json::json!({
            "action": "move",
            "direction": "up",
            "gameState": {
                "board": [[3, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
                "score": 0
            }
        }))
        .unwrap();
        let (status, _body) = game(Ok(Json(request))).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn move_applies_and_reports_moved() {
        let request = serde_json::from_value(serde_json::json!({
            "action": "move",
            "direction": "left",
            "gameState": {
                "board": [[0, 2, 0, 2], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
                "score": 0
            }
        }))
        .unwrap();
        let response = game(Ok(Json(request))).await.unwrap();

        assert_eq!(response.0.moved, Some(true));
        assert_eq!(response.0.game_state.board[0][0], 4);
        assert_eq!(response.0.game_state.score, 4);
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let request =
            serde_json::from_value(serde_json::json!({"action": "restart"})).unwrap();
        let (status, body) = game(Ok(Json(request))).await.unwrap_err();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "Invalid action");
    }
}
