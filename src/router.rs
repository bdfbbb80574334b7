use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use serde_json::{Value, json};
use tracing::warn;

use crate::config::Config;
use crate::db::Store;
use crate::handlers::{generate, google_oauth, meetings, notifications, notion, search};
use crate::middleware::{GenerateLimiter, daily_limiter};

const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AmurexState {
    pub store: Arc<dyn Store>,
    pub client: reqwest::Client,
    pub config: Arc<Config>,
    pub limiter: Option<Arc<GenerateLimiter>>,
    pub cookie_key: Key,
}

impl AmurexState {
    pub fn new(store: Arc<dyn Store>, client: reqwest::Client, config: Config) -> Self {
        let limiter = daily_limiter(config.openai.daily_limit).map(Arc::new);
        let cookie_key = cookie_key(&config.cookie_secret);
        Self {
            store,
            client,
            config: Arc::new(config),
            limiter,
            cookie_key,
        }
    }
}

impl FromRef<AmurexState> for Key {
    fn from_ref(state: &AmurexState) -> Self {
        state.cookie_key.clone()
    }
}

fn cookie_key(secret: &str) -> Key {
    match Key::try_from(secret.as_bytes()) {
        Ok(key) => key,
        Err(_) => {
            if !secret.is_empty() {
                warn!("cookie_secret shorter than 64 bytes; using a per-process random key");
            }
            Key::generate()
        }
    }
}

pub fn amurex_router(state: AmurexState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate::generate_handler))
        .route("/api/google/auth", post(google_oauth::google_auth_url))
        .route(
            "/api/google/callback",
            get(google_oauth::google_oauth_callback).post(google_oauth::google_save_tokens),
        )
        .route("/api/google/import", post(google_oauth::google_import))
        .route("/api/notion/auth", post(notion::notion_auth_url))
        .route(
            "/api/notion/callback",
            get(notion::notion_oauth_callback).post(notion::notion_save_connection),
        )
        .route("/api/notion/import", post(notion::notion_import))
        .route("/api/meetings/{id}", get(meetings::meeting_handler))
        .route(
            "/api/notifications/email",
            post(notifications::import_email_handler),
        )
        .route("/api/searchAll", get(search::search_all_handler))
        .route("/api/search", post(search::search_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
