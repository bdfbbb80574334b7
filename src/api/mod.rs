//! Thin clients for the third-party HTTP APIs the routes forward to.

pub mod google_drive;
pub mod notion_api;
pub mod openai_api;
pub mod resend_api;
pub mod supabase_auth;

use crate::config::Config;
use crate::error::AmurexError;
use serde_json::Value;
use std::time::Duration;

/// Shared outbound client; cloned into every upstream call.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, AmurexError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("amurex-api/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(60));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// Turn a non-2xx upstream response into an error carrying the provider's own message.
pub(crate) async fn upstream_error(service: &'static str, resp: reqwest::Response) -> AmurexError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    AmurexError::Upstream {
        service,
        status,
        message: extract_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected upstream response")
                .to_string()
        }),
    }
}

/// Providers disagree on where the message lives:
/// `{error: {message}}` (OpenAI, Google), `{message}` (Notion, Resend, Supabase),
/// `{error: "..."}` or `{error_description}`.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(json) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };
    let pick = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
    pick(json.pointer("/error/message"))
        .or_else(|| pick(json.get("message")))
        .or_else(|| pick(json.get("msg")))
        .or_else(|| pick(json.get("error_description")))
        .or_else(|| pick(json.get("error")))
        .or_else(|| Some(trimmed.to_string()))
}
