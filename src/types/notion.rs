use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotionList {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A page as the importer needs it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotionPage {
    pub id: String,
    pub url: String,
    pub title: String,
}

impl NotionPage {
    pub fn from_value(page: &Value) -> Option<Self> {
        let id = page.get("id")?.as_str()?.to_string();
        let url = page
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://www.notion.so/{}", id.replace('-', "")));
        let title = page
            .get("properties")
            .and_then(Value::as_object)
            .and_then(|props| {
                props
                    .values()
                    .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
            })
            .and_then(|p| p.get("title"))
            .map(rich_text_plain)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        Some(Self { id, url, title })
    }
}

/// Concatenate the `plain_text` of a rich text array.
pub fn rich_text_plain(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Plain text of one block, `None` for blocks without rich text (images, dividers, ...).
pub fn block_plain_text(block: &Value) -> Option<String> {
    let kind = block.get("type")?.as_str()?;
    let text = rich_text_plain(block.get(kind)?.get("rich_text")?);
    (!text.is_empty()).then_some(text)
}
