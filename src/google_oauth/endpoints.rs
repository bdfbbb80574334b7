use crate::config::{GoogleClientConfig, GoogleConfig};
use crate::db::GoogleTokenVersion;
use crate::error::AmurexError;

use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, ExtraTokenFields, RedirectUrl, RefreshToken, Scope,
    StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Read access to Docs, Drive and Calendar plus the account email.
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/documents.readonly",
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Stateless Google OAuth endpoints. Every call names the client it acts for.
pub struct GoogleOauthEndpoints;

impl GoogleOauthEndpoints {
    /// Consent page URL carrying `state` verbatim.
    pub fn build_authorize_url(
        cfg: &GoogleConfig,
        version: GoogleTokenVersion,
        state: String,
    ) -> Result<Url, AmurexError> {
        let client = build_oauth2_client(cfg, version)?;
        let (url, _csrf) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(GOOGLE_SCOPES.iter().map(|s| Scope::new((*s).to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        Ok(url)
    }

    pub async fn exchange_authorization_code(
        cfg: &GoogleConfig,
        version: GoogleTokenVersion,
        code: AuthorizationCode,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, AmurexError> {
        let client = build_oauth2_client(cfg, version)?;
        let token_result: GoogleTokenResponse = client
            .exchange_code(code)
            .request_async(http_client)
            .await?;
        info!(
            client = version.as_str(),
            has_refresh_token = token_result.refresh_token().is_some(),
            "Google authorization code exchanged"
        );
        Ok(token_result)
    }

    /// Refresh the access token using a stored refresh token.
    pub async fn refresh_access_token(
        cfg: &GoogleConfig,
        version: GoogleTokenVersion,
        refresh_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<GoogleTokenResponse, AmurexError> {
        let client = build_oauth2_client(cfg, version)?;
        let token_result: GoogleTokenResponse = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(http_client)
            .await?;
        info!(client = version.as_str(), "Google access token refreshed");
        Ok(token_result)
    }
}

/// The stored flag picks the client: `old` users stay on the legacy project.
pub fn client_config(cfg: &GoogleConfig, version: GoogleTokenVersion) -> &GoogleClientConfig {
    match version {
        GoogleTokenVersion::Old => &cfg.legacy,
        GoogleTokenVersion::New => &cfg.primary,
    }
}

/// Build the Google OAuth2 client for one of the two configured projects.
fn build_oauth2_client(
    cfg: &GoogleConfig,
    version: GoogleTokenVersion,
) -> Result<GoogleOauth2Client, AmurexError> {
    let creds = client_config(cfg, version);
    let client = OAuth2Client::new(ClientId::new(creds.client_id.clone()))
        .set_client_secret(ClientSecret::new(creds.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(cfg.auth_url.as_str().to_string())?)
        .set_token_uri(TokenUrl::new(cfg.token_url.as_str().to_string())?)
        .set_redirect_uri(RedirectUrl::new(cfg.redirect_uri.clone())?);
    Ok(client)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleTokenField {
    #[serde(rename = "id_token", default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}
impl ExtraTokenFields for GoogleTokenField {}

pub type GoogleTokenResponse = StandardTokenResponse<GoogleTokenField, BasicTokenType>;

pub type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
