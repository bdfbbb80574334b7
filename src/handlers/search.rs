use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::db::DbDocument;
use crate::error::AmurexError;
use crate::middleware::{AuthenticatedUser, JsonBody, json_body::required};
use crate::router::AmurexState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<DbDocument>,
}

/// GET /api/searchAll -> every document the caller has imported.
pub async fn search_all_handler(
    State(state): State<AmurexState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<SearchResponse>, AmurexError> {
    let results = state.store.documents_for_user(&user.id).await?;
    Ok(Json(SearchResponse { results }))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// POST /api/search -> case-insensitive match over title and text.
pub async fn search_handler(
    State(state): State<AmurexState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(req): JsonBody<SearchRequest>,
) -> Result<Json<SearchResponse>, AmurexError> {
    let query = required(req.query, "Missing query")?;
    let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let results = state
        .store
        .search_documents(&user.id, &query, limit)
        .await?;
    Ok(Json(SearchResponse { results }))
}
