use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum AmurexError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("You have reached your request limit for the day.")]
    RateLimited,

    #[error("Missing OPENAI_API_KEY - make sure to add it to your configuration.")]
    MissingApiKey,

    #[error("{0}")]
    OauthFlow(String),

    #[error("OAuth2 token request error: {0}")]
    Oauth2Token(String),

    #[error("OAuth2 token request failed: {0}")]
    Oauth2Transport(String),

    #[error("OAuth2 server error: {error}")]
    Oauth2Server { error: String },

    #[error("{service} error ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),
}

impl AmurexError {
    pub fn status(&self) -> StatusCode {
        match self {
            AmurexError::BadRequest(_) | AmurexError::MissingApiKey | AmurexError::OauthFlow(_) => {
                StatusCode::BAD_REQUEST
            }
            AmurexError::InvalidBody { status, .. } => *status,
            AmurexError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AmurexError::NotFound(_) => StatusCode::NOT_FOUND,
            AmurexError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AmurexError::Oauth2Token(_)
            | AmurexError::Oauth2Transport(_)
            | AmurexError::Oauth2Server { .. }
            | AmurexError::Upstream { .. }
            | AmurexError::UrlParse(_)
            | AmurexError::Reqwest(_)
            | AmurexError::Json(_)
            | AmurexError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transport-level failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AmurexError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AmurexError::Oauth2Transport(_) => true,
            _ => false,
        }
    }
}

type GoogleTokenError = RequestTokenError<
    HttpClientError<reqwest::Error>,
    StandardErrorResponse<BasicErrorResponseType>,
>;

impl From<GoogleTokenError> for AmurexError {
    fn from(e: GoogleTokenError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => AmurexError::Oauth2Server {
                error: match err.error_description() {
                    Some(desc) => format!("{}: {}", err.error(), desc),
                    None => err.error().to_string(),
                },
            },
            RequestTokenError::Request(req_e) => AmurexError::Oauth2Transport(req_e.to_string()),
            RequestTokenError::Parse(parse_err, _body) => AmurexError::Json(parse_err.into_inner()),
            RequestTokenError::Other(s) => AmurexError::Oauth2Token(s),
        }
    }
}

impl IntoResponse for AmurexError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = %status, error = %message, "request failed");
        } else {
            warn!(status = %status, error = %message, "request rejected");
        }
        (status, Json(ApiErrorResponse { error: message })).into_response()
    }
}

/// Uniform `{ "error": message }` body returned by every failing route.
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
