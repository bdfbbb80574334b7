pub mod endpoints;
pub mod service;
pub mod state;

pub use endpoints::{GOOGLE_SCOPES, GoogleOauthEndpoints, GoogleTokenResponse};
pub use service::GoogleOauthService;
pub use state::OauthState;
