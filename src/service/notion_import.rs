use crate::api::notion_api::NotionApi;
use crate::config::NotionConfig;
use crate::db::{NewDocument, Store};
use crate::error::AmurexError;
use crate::types::import::ImportResult;
use crate::types::notion::NotionPage;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

// Notion allows roughly three requests per second per integration.
const PAGE_CONCURRENCY: usize = 2;

/// Pull the pages shared with the user's Notion integration into `documents`.
pub async fn import_notion_pages(
    store: &dyn Store,
    http: &reqwest::Client,
    cfg: &NotionConfig,
    user_id: &str,
) -> Result<Vec<ImportResult>, AmurexError> {
    let user = store
        .user(user_id)
        .await?
        .ok_or_else(|| AmurexError::BadRequest("User not found".to_string()))?;
    let access_token = user
        .notion_access_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AmurexError::BadRequest("Notion account not connected".to_string()))?;

    let pages = NotionApi::search_pages(http, cfg, access_token, cfg.import_limit).await?;

    let results: Vec<ImportResult> = stream::iter(pages)
        .map(|page| import_one(store, http, cfg, access_token, user_id, page))
        .buffered(PAGE_CONCURRENCY)
        .collect()
        .await;

    let imported = results.iter().filter(|r| r.is_success()).count();
    info!(
        user_id,
        imported,
        failed = results.len() - imported,
        "Notion import finished"
    );
    Ok(results)
}

async fn import_one(
    store: &dyn Store,
    http: &reqwest::Client,
    cfg: &NotionConfig,
    access_token: &str,
    user_id: &str,
    page: NotionPage,
) -> ImportResult {
    let text = match NotionApi::page_text(http, cfg, access_token, &page.id).await {
        Ok(text) => text,
        Err(e) => {
            warn!(page_id = %page.id, error = %e, "reading Notion page failed");
            return ImportResult::failed(page.title, Some(page.url), e);
        }
    };

    let doc = NewDocument {
        user_id: user_id.to_string(),
        title: page.title.clone(),
        text,
        url: page.url.clone(),
        doc_type: "notion",
    };
    match store.upsert_document(&doc).await {
        Ok(id) => ImportResult::success(id, page.title, page.url),
        Err(e) => {
            warn!(page_id = %page.id, error = %e, "storing Notion page failed");
            ImportResult::failed(page.title, Some(page.url), e)
        }
    }
}
