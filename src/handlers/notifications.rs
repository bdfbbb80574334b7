use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::resend_api::{OutgoingEmail, ResendApi};
use crate::error::AmurexError;
use crate::middleware::{JsonBody, json_body::required};
use crate::router::AmurexState;
use crate::service::email_template::{IMPORT_EMAIL_SUBJECT, render_import_email};
use crate::types::import::ImportResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportEmailRequest {
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub import_results: Vec<ImportResult>,
}

#[derive(Debug, Serialize)]
pub struct ImportEmailResponse {
    pub success: bool,
    pub id: String,
}

/// POST /api/notifications/email -> mails the user a summary of an import run.
pub async fn import_email_handler(
    State(state): State<AmurexState>,
    JsonBody(req): JsonBody<ImportEmailRequest>,
) -> Result<Json<ImportEmailResponse>, AmurexError> {
    let user_email = required(req.user_email, "Missing userEmail")?;
    if !user_email.contains('@') {
        return Err(AmurexError::BadRequest("Invalid userEmail".to_string()));
    }

    let html = render_import_email(&req.import_results);
    let cfg = &state.config.resend;
    let sent = ResendApi::send(
        &state.client,
        cfg,
        &OutgoingEmail {
            from: &cfg.from,
            to: vec![user_email.as_str()],
            subject: IMPORT_EMAIL_SUBJECT,
            html: &html,
        },
    )
    .await?;

    info!(
        documents = req.import_results.len(),
        email_id = %sent.id,
        "import notification sent"
    );
    Ok(Json(ImportEmailResponse {
        success: true,
        id: sent.id,
    }))
}
