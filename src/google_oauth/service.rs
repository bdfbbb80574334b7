use super::endpoints::{GoogleOauthEndpoints, GoogleTokenResponse};
use crate::config::GoogleConfig;
use crate::db::GoogleTokenVersion;
use crate::error::AmurexError;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;
use tracing::warn;

pub fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Composes Google OAuth calls with network-aware retries.
pub struct GoogleOauthService;

impl GoogleOauthService {
    pub async fn refresh_with_retry(
        cfg: &GoogleConfig,
        version: GoogleTokenVersion,
        refresh_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, AmurexError> {
        (|| async {
            GoogleOauthEndpoints::refresh_access_token(cfg, version, refresh_token, http_client)
                .await
        })
        .retry(default_retry_policy())
        .when(|e: &AmurexError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(
                "Google token refresh retrying after error {}, sleeping {:?}",
                err, dur
            );
        })
        .await
    }
}
