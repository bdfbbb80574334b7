use crate::api::google_drive::{DriveFile, GoogleDriveApi};
use crate::config::GoogleConfig;
use crate::db::{NewDocument, Store};
use crate::error::AmurexError;
use crate::google_oauth::GoogleOauthService;
use crate::types::import::ImportResult;
use futures::stream::{self, StreamExt};
use oauth2::TokenResponse;
use tracing::{info, warn};

const EXPORT_CONCURRENCY: usize = 4;

/// Pull the user's Google Docs into `documents`.
///
/// Fails as a whole only when the account cannot be reached; individual
/// documents that fail to export or store are reported in the results.
pub async fn import_google_docs(
    store: &dyn Store,
    http: &reqwest::Client,
    cfg: &GoogleConfig,
    user_id: &str,
) -> Result<Vec<ImportResult>, AmurexError> {
    let user = store
        .user(user_id)
        .await?
        .ok_or_else(|| AmurexError::BadRequest("User not found".to_string()))?;
    let refresh_token = user
        .google_refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AmurexError::BadRequest("Google account not connected".to_string()))?;
    let version = user.token_version();

    let token =
        GoogleOauthService::refresh_with_retry(cfg, version, refresh_token, http).await?;
    let access_token = token.access_token().secret().as_str();
    store
        .update_google_access_token(user_id, access_token)
        .await?;

    let files =
        GoogleDriveApi::list_documents(http, &cfg.drive_api_base, access_token, cfg.import_limit)
            .await?;

    let results: Vec<ImportResult> = stream::iter(files)
        .map(|file| import_one(store, http, cfg, access_token, user_id, file))
        .buffered(EXPORT_CONCURRENCY)
        .collect()
        .await;

    let imported = results.iter().filter(|r| r.is_success()).count();
    info!(
        user_id,
        imported,
        failed = results.len() - imported,
        "Google Docs import finished"
    );
    Ok(results)
}

async fn import_one(
    store: &dyn Store,
    http: &reqwest::Client,
    cfg: &GoogleConfig,
    access_token: &str,
    user_id: &str,
    file: DriveFile,
) -> ImportResult {
    let url = file.link();
    let text = match GoogleDriveApi::export_text(http, &cfg.drive_api_base, access_token, &file.id)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!(file_id = %file.id, error = %e, "Google Doc export failed");
            return ImportResult::failed(file.name, Some(url), e);
        }
    };

    let doc = NewDocument {
        user_id: user_id.to_string(),
        title: file.name.clone(),
        text,
        url: url.clone(),
        doc_type: "google_docs",
    };
    match store.upsert_document(&doc).await {
        Ok(id) => ImportResult::success(id, file.name, url),
        Err(e) => {
            warn!(file_id = %file.id, error = %e, "storing Google Doc failed");
            ImportResult::failed(file.name, Some(url), e)
        }
    }
}
