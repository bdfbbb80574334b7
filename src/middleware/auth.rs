use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::Authorization;
use headers::authorization::Bearer;

use crate::api::supabase_auth::{AuthUser, SupabaseAuthApi};
use crate::error::AmurexError;
use crate::router::AmurexState;

/// Caller identified by `Authorization: Bearer <token>`, as vouched for by
/// the hosted auth service.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthUser);

impl FromRequestParts<AmurexState> for AuthenticatedUser {
    type Rejection = AmurexError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AmurexState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    AmurexError::Unauthorized("Missing authorization header".to_string())
                } else {
                    AmurexError::Unauthorized("Unauthorized".to_string())
                }
            })?;

        let token = bearer.token();
        if token.is_empty() {
            return Err(AmurexError::Unauthorized("Unauthorized".to_string()));
        }

        SupabaseAuthApi::user_for_token(&state.client, &state.config.supabase, token)
            .await?
            .map(Self)
            .ok_or_else(|| AmurexError::Unauthorized("Unauthorized".to_string()))
    }
}
