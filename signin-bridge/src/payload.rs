//! Completion payload decoding.
//!
//! The native layer reports each sign-in result as a JSON record:
//!
//! ```json
//! {
//!   "isHasCredential": true,
//!   "isHasError": false,
//!   "credential": { "authorizationCode": "c0de", "userId": "001234.abcd" },
//!   "error": { "code": 0, "domain": "", "userInfo": "" }
//! }
//! ```
//!
//! The side record whose flag is false is discarded even when present. When
//! `isHasError` is set the result is an error, whatever the credential says.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Credential returned by a successful sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthCredential {
    pub authorization_code: String,
    pub user_id: String,
}

/// Error reported by the platform sign-in flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthError {
    pub code: i32,
    pub domain: String,
    pub user_info: String,
}

impl AuthError {
    /// Domain used for errors synthesized locally when a payload cannot be decoded.
    pub const PAYLOAD_DOMAIN: &'static str = "signin_bridge.payload";

    pub(crate) fn undecodable(err: &BridgeError) -> Self {
        Self {
            code: -1,
            domain: Self::PAYLOAD_DOMAIN.to_string(),
            user_info: err.to_string(),
        }
    }
}

/// Wire record produced by the native layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    #[serde(rename = "isHasCredential", alias = "hasCredential")]
    pub has_credential: bool,
    #[serde(rename = "isHasError", alias = "hasError")]
    pub has_error: bool,
    pub credential: Option<AuthCredential>,
    pub error: Option<AuthError>,
}

impl AuthResponse {
    /// Parse a payload so each side record is present exactly when its flag
    /// is set. A flagged record that is missing or null decodes as empty.
    pub fn from_json(payload: &str) -> Result<Self, BridgeError> {
        let mut response: AuthResponse =
            serde_json::from_str(payload).map_err(BridgeError::Payload)?;
        response.error = if response.has_error {
            Some(response.error.unwrap_or_default())
        } else {
            None
        };
        response.credential = if response.has_credential {
            Some(response.credential.unwrap_or_default())
        } else {
            None
        };
        Ok(response)
    }

    /// Collapse into the branch the application callback should take.
    ///
    /// The error flag decides the branch; the credential only matters on success.
    pub fn into_outcome(self) -> Outcome {
        if self.has_error {
            Outcome::Failure(self.error.unwrap_or_default())
        } else {
            Outcome::Success(self.credential)
        }
    }
}

/// Which branch of a pending callback a payload selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sign-in succeeded; the credential may legitimately be absent.
    Success(Option<AuthCredential>),
    Failure(AuthError),
}

/// Decode a raw payload into an [`Outcome`].
///
/// Undecodable payloads become a [`Outcome::Failure`] carrying a synthesized
/// error in [`AuthError::PAYLOAD_DOMAIN`], so the caller still hears back once.
pub fn decode(payload: &str) -> Outcome {
    match AuthResponse::from_json(payload) {
        Ok(response) => response.into_outcome(),
        Err(e) => {
            tracing::warn!("dropping undecodable sign-in payload: {e}");
            Outcome::Failure(AuthError::undecodable(&e))
        }
    }
}
