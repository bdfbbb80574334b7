use crate::api::upstream_error;
use crate::error::AmurexError;
use crate::google_oauth::service::default_retry_policy;
use backon::Retryable;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

impl DriveFile {
    pub fn link(&self) -> String {
        self.web_view_link
            .clone()
            .unwrap_or_else(|| format!("https://docs.google.com/document/d/{}/edit", self.id))
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Google Drive v3 calls used by the document import.
pub struct GoogleDriveApi;

impl GoogleDriveApi {
    /// Most recently modified Google Docs owned by or shared with the user.
    pub async fn list_documents(
        client: &reqwest::Client,
        api_base: &Url,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<DriveFile>, AmurexError> {
        let mut url = api_base.join("files")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("mimeType='{GOOGLE_DOC_MIME}' and trashed=false"))
            .append_pair("orderBy", "modifiedTime desc")
            .append_pair("pageSize", &limit.max(1).to_string())
            .append_pair("fields", "files(id,name,webViewLink)");

        let list: DriveFileList = (|| async {
            let resp = client
                .get(url.clone())
                .bearer_auth(access_token)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(upstream_error("Google Drive", resp).await);
            }
            Ok(resp.json::<DriveFileList>().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &AmurexError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("Drive list retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        info!(count = list.files.len(), "listed Google Docs");
        Ok(list.files)
    }

    /// Export a Google Doc as plain text.
    pub async fn export_text(
        client: &reqwest::Client,
        api_base: &Url,
        access_token: &str,
        file_id: &str,
    ) -> Result<String, AmurexError> {
        let mut url = api_base.join(&format!("files/{file_id}/export"))?;
        url.query_pairs_mut().append_pair("mimeType", "text/plain");

        (|| async {
            let resp = client
                .get(url.clone())
                .bearer_auth(access_token)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(upstream_error("Google Drive", resp).await);
            }
            Ok(resp.text().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &AmurexError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(file_id, "Drive export retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }
}
