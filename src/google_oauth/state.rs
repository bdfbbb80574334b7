use crate::db::GoogleTokenVersion;
use crate::error::AmurexError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Seconds a consent `state` stays valid; matches the nonce cookie lifetime.
const STATE_TTL_SECS: i64 = 15 * 60;

/// Round-tripped through Google as the `state` parameter, as
/// `<base64url json>.<base64url hmac-sha256>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OauthState {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub version: GoogleTokenVersion,
    pub nonce: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
}

impl OauthState {
    pub fn new(user_id: String, version: GoogleTokenVersion, nonce: String) -> Self {
        Self {
            user_id,
            version,
            nonce,
            issued_at: Utc::now().timestamp(),
        }
    }

    pub fn encode(&self, key: &[u8]) -> Result<String, AmurexError> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?);
        let signature = signer(key, &payload)?.finalize().into_bytes();
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// Verifies the signature and age before trusting any field.
    pub fn decode(raw: &str, key: &[u8]) -> Result<Self, AmurexError> {
        let invalid = || AmurexError::OauthFlow("Invalid state parameter".to_string());
        let (payload, signature) = raw.trim().split_once('.').ok_or_else(invalid)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
        signer(key, payload)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
        let state: Self = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
        let age = Utc::now().timestamp() - state.issued_at;
        if !(0..=STATE_TTL_SECS).contains(&age) {
            return Err(AmurexError::OauthFlow("State expired".to_string()));
        }
        Ok(state)
    }
}

fn signer(key: &[u8], payload: &str) -> Result<HmacSha256, AmurexError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AmurexError::OauthFlow(format!("state signing key rejected: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}
