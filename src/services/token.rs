// SPDX-License-Identifier: MIT

//! Session token issuing and verification (JWT, HS256).

use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// A token whose signature has been verified.
///
/// Expiry is reported, not enforced: the decision engine decides whether
/// an expired token is acceptable for the requested route.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub claims: Claims,
    pub expired: bool,
}

/// Issues and verifies signed session tokens.
///
/// Keys are built from the signing secret once at construction; rotating
/// the secret invalidates every outstanding token with no grace period.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Create a token for a user with the default lifetime.
    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    /// Create a token with an explicit lifetime. Refresh tests use short
    /// (or negative) windows.
    pub fn issue_with_ttl(&self, user_id: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Verify a token's signature and decode its claims.
    ///
    /// Expired tokens decode successfully with `expired` set; malformed or
    /// wrongly-signed tokens are an error.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        let expired = data.claims.exp < Utc::now().timestamp();

        Ok(DecodedToken {
            claims: data.claims,
            expired,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test_jwt_key_32_bytes_minimum!!", 7)
    }

    #[test]
    fn test_issue_and_decode_roundtrip() {
        let tokens = issuer();
        let token = tokens.issue("user-42").unwrap();

        let decoded = tokens.decode(&token).unwrap();
        assert_eq!(decoded.claims.sub, "user-42");
        assert!(!decoded.expired);
        assert!(decoded.claims.exp > decoded.claims.iat);
    }

    #[test]
    fn test_expired_token_decodes_with_flag() {
        let tokens = issuer();
        let token = tokens
            .issue_with_ttl("user-42", Duration::seconds(-60))
            .unwrap();

        let decoded = tokens.decode(&token).unwrap();
        assert_eq!(decoded.claims.sub, "user-42");
        assert!(decoded.expired);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = issuer();
        assert!(tokens.decode("not.a.jwt").is_err());
        assert!(tokens.decode("").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer().issue("user-42").unwrap();
        let other = TokenIssuer::new(b"some_other_signing_secret_key!!", 7);
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_default_ttl_is_seven_days() {
        let tokens = issuer();
        let token = tokens.issue("user-42").unwrap();
        let decoded = tokens.decode(&token).unwrap();

        let lifetime = decoded.claims.exp - decoded.claims.iat;
        assert_eq!(lifetime, 7 * 24 * 60 * 60);
    }
}
