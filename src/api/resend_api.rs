use crate::api::upstream_error;
use crate::config::ResendConfig;
use crate::error::AmurexError;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct OutgoingEmail<'a> {
    pub from: &'a str,
    pub to: Vec<&'a str>,
    pub subject: &'a str,
    pub html: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

pub struct ResendApi;

impl ResendApi {
    pub async fn send(
        client: &reqwest::Client,
        cfg: &ResendConfig,
        email: &OutgoingEmail<'_>,
    ) -> Result<SentEmail, AmurexError> {
        let url = cfg.base_url.join("emails")?;
        let resp = client
            .post(url)
            .bearer_auth(&cfg.api_key)
            .json(email)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(upstream_error("Resend", resp).await);
        }
        let sent: SentEmail = resp.json().await?;
        info!(email_id = %sent.id, "email accepted by Resend");
        Ok(sent)
    }
}
