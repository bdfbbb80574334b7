use crate::api::upstream_error;
use crate::config::NotionConfig;
use crate::error::AmurexError;
use crate::types::notion::{NotionList, NotionPage, NotionTokenResponse, block_plain_text};
use serde_json::json;
use tracing::{debug, info};
use url::Url;

const NOTION_AUTHORIZE_URL: &str = "https://api.notion.com/v1/oauth/authorize";

/// Notion OAuth and content endpoints.
pub struct NotionApi;

impl NotionApi {
    /// Public authorization page. `state` is echoed back to the callback.
    pub fn authorize_url(cfg: &NotionConfig, state: Option<&str>) -> Result<Url, AmurexError> {
        let mut url = Url::parse(NOTION_AUTHORIZE_URL)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &cfg.client_id)
                .append_pair("response_type", "code")
                .append_pair("owner", "user")
                .append_pair("redirect_uri", &cfg.redirect_uri);
            if let Some(state) = state {
                pairs.append_pair("state", state);
            }
        }
        Ok(url)
    }

    /// Notion wants HTTP Basic client auth and a JSON body, which rules out
    /// the form-encoded exchange of the generic OAuth client.
    pub async fn exchange_code(
        client: &reqwest::Client,
        cfg: &NotionConfig,
        code: &str,
    ) -> Result<NotionTokenResponse, AmurexError> {
        let url = cfg.api_base.join("oauth/token")?;
        let resp = client
            .post(url)
            .basic_auth(&cfg.client_id, Some(&cfg.client_secret))
            .header("Notion-Version", &cfg.api_version)
            .json(&json!({
                "grant_type": "authorization_code",
                "code": code,
                "redirect_uri": cfg.redirect_uri,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error("Notion", resp).await);
        }
        let token: NotionTokenResponse = resp.json().await?;
        info!(
            workspace = token.workspace_name.as_deref().unwrap_or("<unnamed>"),
            "Notion authorization code exchanged"
        );
        Ok(token)
    }

    /// Pages shared with the integration, most recently edited first.
    pub async fn search_pages(
        client: &reqwest::Client,
        cfg: &NotionConfig,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<NotionPage>, AmurexError> {
        let url = cfg.api_base.join("search")?;
        let resp = client
            .post(url)
            .bearer_auth(access_token)
            .header("Notion-Version", &cfg.api_version)
            .json(&json!({
                "filter": { "property": "object", "value": "page" },
                "sort": { "direction": "descending", "timestamp": "last_edited_time" },
                "page_size": limit.clamp(1, 100),
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error("Notion", resp).await);
        }
        let list: NotionList = resp.json().await?;
        let pages: Vec<NotionPage> = list.results.iter().filter_map(NotionPage::from_value).collect();
        info!(count = pages.len(), "listed Notion pages");
        Ok(pages)
    }

    /// Plain text of a page's top-level blocks, one block per line.
    pub async fn page_text(
        client: &reqwest::Client,
        cfg: &NotionConfig,
        access_token: &str,
        page_id: &str,
    ) -> Result<String, AmurexError> {
        let mut lines = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut url = cfg.api_base.join(&format!("blocks/{page_id}/children"))?;
            url.query_pairs_mut().append_pair("page_size", "100");
            if let Some(c) = cursor.as_deref() {
                url.query_pairs_mut().append_pair("start_cursor", c);
            }
            let resp = client
                .get(url)
                .bearer_auth(access_token)
                .header("Notion-Version", &cfg.api_version)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(upstream_error("Notion", resp).await);
            }
            let list: NotionList = resp.json().await?;
            lines.extend(list.results.iter().filter_map(block_plain_text));

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        debug!(page_id, blocks = lines.len(), "collected Notion page text");
        Ok(lines.join("\n"))
    }
}
