//! Access token claims and HS256 verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Claims the guard reads from a verified access token.
///
/// The issuing backend puts more in the token than this (`jti`,
/// `token_type`, ...); unknown claims are ignored. Missing privilege claims
/// mean "not privileged".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// Issued-at, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Backend user id, only used for log context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<serde_json::Value>,
}

impl AccessClaims {
    /// True when the token grants access to the admin area.
    pub fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// Verifies access tokens against the secret shared with the backend.
///
/// Only HS256 is accepted, `exp` is mandatory and there is no clock leeway:
/// a token that expired one second ago is rejected.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and verifies `token`.
    ///
    /// Every failure, including error kinds added to `jsonwebtoken` after this
    /// was written, comes back as an `Err`.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        jsonwebtoken::decode::<AccessClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}
