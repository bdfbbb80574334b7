use crate::config::SupabaseConfig;
use crate::error::AmurexError;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// Subset of the hosted auth user object the service relies on.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct SupabaseAuthApi;

impl SupabaseAuthApi {
    /// Resolve a bearer token to its user. `Ok(None)` when the hosted auth
    /// service rejects the token; throttling and 5xx replies are errors.
    pub async fn user_for_token(
        client: &reqwest::Client,
        cfg: &SupabaseConfig,
        token: &str,
    ) -> Result<Option<AuthUser>, AmurexError> {
        let url = cfg.url.join("auth/v1/user")?;
        let resp = client
            .get(url)
            .header("apikey", &cfg.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let status = resp.status();
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            debug!(status = %status, "hosted auth rejected bearer token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(super::upstream_error("Supabase auth", resp).await);
        }
        Ok(Some(resp.json::<AuthUser>().await?))
    }
}
