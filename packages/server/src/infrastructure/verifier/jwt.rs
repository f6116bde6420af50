//! HS256 JWT token verification.
//!
//! Tokens are issued by the account service; this side only checks the
//! signature and expiry and extracts the username.

use async_trait::async_trait;
use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::domain::{IdentityClaim, TokenVerifier, Username, VerificationError};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Username; `Username` is accepted for tokens minted by older issuers
    #[serde(alias = "Username")]
    pub username: String,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

/// Verifies HS256-signed tokens against a shared secret
pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, credential: &str) -> Result<IdentityClaim, VerificationError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(VerificationError::Missing);
        }

        let data = decode::<JwtClaims>(credential, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
                _ => VerificationError::Malformed(e.to_string()),
            }
        })?;

        let username = Username::new(data.claims.username)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(data.claims.exp, 0).ok_or_else(|| {
            VerificationError::Malformed(format!("exp {} is out of range", data.claims.exp))
        })?;

        Ok(IdentityClaim::new(username, expires_at))
    }
}
