use crate::api::upstream_error;
use crate::config::OpenAiConfig;
use crate::error::AmurexError;
use crate::types::openai::{ChatCompletionChunk, ChatCompletionRequest};
use axum::body::Bytes;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, future};
use std::io;
use tracing::{debug, info};

pub struct OpenAiApi;

impl OpenAiApi {
    /// Start a streamed continuation of `prompt`. Upstream rejections surface
    /// before any byte is streamed.
    pub async fn stream_continuation(
        client: &reqwest::Client,
        cfg: &OpenAiConfig,
        prompt: &str,
    ) -> Result<impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static, AmurexError> {
        let url = cfg.base_url.join("chat/completions")?;
        let body = ChatCompletionRequest::continuation(&cfg.model, prompt, cfg.max_tokens);

        let resp = client
            .post(url)
            .bearer_auth(&cfg.api_key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error("OpenAI", resp).await);
        }
        info!(model = %cfg.model, "OpenAI completion stream opened");
        Ok(text_deltas(resp.bytes_stream()))
    }
}

/// Reduce an OpenAI SSE byte stream to the text of each delta, ending at `[DONE]`.
pub fn text_deltas<S, B, E>(bytes: S) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .eventsource()
        .take_while(|ev| future::ready(!matches!(ev, Ok(e) if e.data.trim() == "[DONE]")))
        .filter_map(|ev| {
            future::ready(match ev {
                Ok(event) => delta_text(&event.data).map(|t| Ok(Bytes::from(t))),
                Err(e) => Some(Err(io::Error::other(e.to_string()))),
            })
        })
}

fn delta_text(data: &str) -> Option<String> {
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk.into_text(),
        Err(e) => {
            debug!(error = %e, "skipping unparseable completion chunk");
            None
        }
    }
}
