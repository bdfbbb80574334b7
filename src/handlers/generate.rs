use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::api::openai_api::OpenAiApi;
use crate::error::AmurexError;
use crate::middleware::{JsonBody, check_quota, json_body::required};
use crate::router::AmurexState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// POST /api/generate -> streams the model's continuation of `prompt` as plain text.
pub async fn generate_handler(
    State(state): State<AmurexState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<GenerateRequest>,
) -> Result<Response, AmurexError> {
    let cfg = &state.config.openai;
    if cfg.api_key.trim().is_empty() {
        return Err(AmurexError::MissingApiKey);
    }
    let prompt = required(body.prompt, "Missing prompt")?;
    check_quota(state.limiter.as_deref(), &headers)?;

    let stream = OpenAiApi::stream_continuation(&state.client, cfg, &prompt).await?;

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
