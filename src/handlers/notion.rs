use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::google_oauth::{AuthUrlResponse, SuccessResponse, UserRequest};
use crate::api::notion_api::NotionApi;
use crate::db::NotionConnection;
use crate::error::AmurexError;
use crate::middleware::{JsonBody, json_body::required};
use crate::router::AmurexState;
use crate::service::notion_import::import_notion_pages;
use crate::types::import::ImportResponse;

/// POST /api/notion/auth -> Notion authorization URL. The body is optional;
/// a `userId` in it is echoed back as `state`.
pub async fn notion_auth_url(
    State(state): State<AmurexState>,
    body: Bytes,
) -> Result<Json<AuthUrlResponse>, AmurexError> {
    let req: UserRequest = if body.iter().all(u8::is_ascii_whitespace) {
        UserRequest { user_id: None }
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AmurexError::BadRequest(format!("Invalid JSON body: {e}")))?
    };
    let user_id = req.user_id.filter(|id| !id.trim().is_empty());
    let url = NotionApi::authorize_url(&state.config.notion, user_id.as_deref())?;
    Ok(Json(AuthUrlResponse {
        url: url.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct NotionCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotionTokensResponse {
    pub access_token: String,
    pub workspace_id: Option<String>,
    pub workspace_name: Option<String>,
    pub bot_id: Option<String>,
    pub state: Option<String>,
}

/// GET /api/notion/callback -> exchanges the authorization code for an access token.
pub async fn notion_oauth_callback(
    State(state): State<AmurexState>,
    Query(query): Query<NotionCallbackQuery>,
) -> Result<Json<NotionTokensResponse>, AmurexError> {
    if let Some(err) = query.error {
        return Err(AmurexError::OauthFlow(format!("Notion returned error: {err}")));
    }
    let code = required(query.code, "No code provided")?;
    let token = NotionApi::exchange_code(&state.client, &state.config.notion, &code).await?;
    Ok(Json(NotionTokensResponse {
        access_token: token.access_token,
        workspace_id: token.workspace_id,
        workspace_name: token.workspace_name,
        bot_id: token.bot_id,
        state: query.state,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SaveNotionRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
}

/// POST /api/notion/callback -> persists the Notion connection onto the user row.
pub async fn notion_save_connection(
    State(state): State<AmurexState>,
    JsonBody(req): JsonBody<SaveNotionRequest>,
) -> Result<Json<SuccessResponse>, AmurexError> {
    let access_token = required(req.access_token, "Missing access_token")?;
    let user_id = required(req.user_id, "Missing userId")?;

    let conn = NotionConnection {
        access_token,
        workspace_id: req.workspace_id,
        workspace_name: req.workspace_name,
    };
    if !state.store.save_notion_connection(&user_id, &conn).await? {
        return Err(AmurexError::BadRequest("User not found".to_string()));
    }

    info!(user_id = %user_id, "stored Notion connection");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/notion/import -> imports the pages shared with the integration.
pub async fn notion_import(
    State(state): State<AmurexState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<Json<ImportResponse>, AmurexError> {
    let user_id = required(req.user_id, "Missing userId")?;
    let results = import_notion_pages(
        state.store.as_ref(),
        &state.client,
        &state.config.notion,
        &user_id,
    )
    .await?;
    Ok(Json(ImportResponse {
        success: true,
        results,
    }))
}
