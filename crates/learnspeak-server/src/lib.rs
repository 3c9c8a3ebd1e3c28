//! HTTP server wiring for LearnSpeak.
//!
//! Mounts the JSON API from [`learnspeak_api`] under `/api/v1`, adds a
//! health check, and provides curriculum import for seeding a fresh
//! database.

pub mod error;
pub mod seed;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, routing::get};
use learnspeak_api::LearnStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LEARNSPEAK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8080,
      database_path: PathBuf::from("learnspeak.db"),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router for `store`.
pub fn router<S: LearnStore>(store: Arc<S>) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api/v1", learnspeak_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ───────────────────────────────────────────────────────
