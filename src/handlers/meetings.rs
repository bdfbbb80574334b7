use axum::{
    Json,
    extract::{Path, State},
};

use crate::db::DbMeeting;
use crate::error::AmurexError;
use crate::router::AmurexState;

/// GET /api/meetings/{id}
pub async fn meeting_handler(
    State(state): State<AmurexState>,
    Path(id): Path<String>,
) -> Result<Json<DbMeeting>, AmurexError> {
    state
        .store
        .meeting(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AmurexError::NotFound("Meeting not found".to_string()))
}
