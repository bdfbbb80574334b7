use crate::db::GoogleConnection;
use crate::error::AmurexError;
use crate::google_oauth::{GoogleOauthEndpoints, OauthState};
use crate::middleware::{JsonBody, json_body::required};
use crate::router::AmurexState;
use crate::service::google_import::import_google_docs;
use crate::types::import::ImportResponse;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use oauth2::{AuthorizationCode, CsrfToken, TokenResponse};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::info;

const NONCE_COOKIE: &str = "google_oauth_nonce";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// POST /api/google/auth -> consent URL for the client the user is bound to.
pub async fn google_auth_url(
    State(state): State<AmurexState>,
    jar: PrivateCookieJar,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<(PrivateCookieJar, Json<AuthUrlResponse>), AmurexError> {
    let user_id = required(req.user_id, "Missing userId")?;
    let user = state
        .store
        .user(&user_id)
        .await?
        .ok_or_else(|| AmurexError::BadRequest("User not found".to_string()))?;
    let version = user.token_version();

    let nonce = CsrfToken::new_random().secret().to_string();
    let oauth_state = OauthState::new(user_id, version, nonce.clone());
    let url = GoogleOauthEndpoints::build_authorize_url(
        &state.config.google,
        version,
        oauth_state.encode(state.cookie_key.signing())?,
    )?;

    let jar = jar.add(build_cookie(nonce, state.config.insecure_cookie));
    info!(client = version.as_str(), "issued Google consent URL");
    Ok((
        jar,
        Json(AuthUrlResponse {
            url: url.to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoogleTokensResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub state: String,
}

/// GET /api/google/callback -> exchanges the authorization code for tokens.
pub async fn google_oauth_callback(
    State(state): State<AmurexState>,
    Query(query): Query<AuthCallbackQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let (cookie_nonce, jar) = take_nonce(jar);
    match exchange_callback(&state, query, cookie_nonce).await {
        Ok(tokens) => (jar, Json(tokens)).into_response(),
        Err(err) => respond_with_error(jar, err),
    }
}

async fn exchange_callback(
    state: &AmurexState,
    query: AuthCallbackQuery,
    cookie_nonce: Option<String>,
) -> Result<GoogleTokensResponse, AmurexError> {
    if let Some(err) = query.error {
        return Err(AmurexError::OauthFlow(format!("Google returned error: {err}")));
    }
    let code = required(query.code, "No code provided")?;
    let raw_state = required(query.state, "Missing state parameter")?;
    let oauth_state = OauthState::decode(&raw_state, state.cookie_key.signing())?;

    let expected = cookie_nonce
        .ok_or_else(|| AmurexError::OauthFlow("Missing CSRF token in cookie".to_string()))?;
    if !bool::from(expected.as_bytes().ct_eq(oauth_state.nonce.as_bytes())) {
        return Err(AmurexError::OauthFlow("CSRF token mismatch".to_string()));
    }

    let token = GoogleOauthEndpoints::exchange_authorization_code(
        &state.config.google,
        oauth_state.version,
        AuthorizationCode::new(code),
        &state.client,
    )
    .await?;

    Ok(GoogleTokensResponse {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|t| t.secret().to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
        scope: token.scopes().map(|scopes| {
            scopes
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        }),
        state: raw_state,
    })
}

#[derive(Debug, Deserialize)]
pub struct SaveTokensRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/google/callback -> persists the exchanged tokens onto the user row.
pub async fn google_save_tokens(
    State(state): State<AmurexState>,
    JsonBody(req): JsonBody<SaveTokensRequest>,
) -> Result<Json<SuccessResponse>, AmurexError> {
    let access_token = required(req.access_token, "Missing access_token")?;
    let refresh_token = required(req.refresh_token, "Missing refresh_token")?;
    let raw_state = required(req.state, "Missing state")?;
    let user_id = required(req.user_id, "Missing userId")?;

    let oauth_state = OauthState::decode(&raw_state, state.cookie_key.signing())?;
    if oauth_state.user_id != user_id {
        return Err(AmurexError::BadRequest(
            "State does not match user".to_string(),
        ));
    }

    let conn = GoogleConnection {
        access_token,
        refresh_token,
        version: oauth_state.version,
    };
    if !state.store.save_google_connection(&user_id, &conn).await? {
        return Err(AmurexError::BadRequest("User not found".to_string()));
    }

    info!(user_id = %user_id, client = conn.version.as_str(), "stored Google tokens");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/google/import -> imports the user's Google Docs.
pub async fn google_import(
    State(state): State<AmurexState>,
    JsonBody(req): JsonBody<UserRequest>,
) -> Result<Json<ImportResponse>, AmurexError> {
    let user_id = required(req.user_id, "Missing userId")?;
    let results = import_google_docs(
        state.store.as_ref(),
        &state.client,
        &state.config.google,
        &user_id,
    )
    .await?;
    Ok(Json(ImportResponse {
        success: true,
        results,
    }))
}

fn take_nonce(jar: PrivateCookieJar) -> (Option<String>, PrivateCookieJar) {
    let nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_owned());
    (nonce, jar.remove(clear_cookie()))
}

fn build_cookie(value: String, insecure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(NONCE_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(15))
        .build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(NONCE_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub(crate) fn respond_with_error(jar: PrivateCookieJar, err: AmurexError) -> Response {
    (jar, err.into_response()).into_response()
}
