// SPDX-License-Identifier: MIT

//! Google OAuth2 login: authorize URL, signed state, code exchange.
//!
//! The browser handshake happens at the HTTP boundary; this service builds
//! the consent-screen redirect and turns a callback code into a verified
//! profile. The `state` parameter is HMAC-signed so the callback can
//! reject forged or replayed redirects.

use crate::error::AppError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// How long a signed state parameter stays acceptable.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

/// Profile vouched for by Google after a successful handshake.
#[derive(Debug, Clone)]
pub struct VerifiedProfile {
    pub email: String,
    pub google_id: String,
    pub display_name: String,
    pub avatar: String,
}

/// Google OAuth2 client.
#[derive(Clone)]
pub struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    state_key: Vec<u8>,
}

impl GoogleOAuth {
    pub fn new(
        client_id: String,
        client_secret: String,
        callback_url: String,
        state_key: Vec<u8>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
            callback_url,
            state_key,
        }
    }

    /// Build the consent-screen redirect URL with a signed state parameter.
    pub fn authorize_url(&self) -> Result<String, AppError> {
        let state = self.sign_state()?;

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode("openid email profile"),
            state
        ))
    }

    /// Mint an HMAC-signed state value carrying the issue timestamp.
    fn sign_state(&self) -> Result<String, AppError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_millis();

        let payload = format!("{:x}", timestamp);

        let mut mac = HmacSha256::new_from_slice(&self.state_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
    }

    /// Verify a state parameter returned by the callback: signature must
    /// match and the timestamp must be recent.
    pub fn verify_state(&self, state: &str) -> bool {
        let Some(issued_at_ms) = self.decode_state(state) else {
            return false;
        };

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        issued_at_ms <= now_ms && now_ms - issued_at_ms <= STATE_MAX_AGE_MS
    }

    fn decode_state(&self, state: &str) -> Option<u128> {
        let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
        let state_str = String::from_utf8(bytes).ok()?;

        let (payload, signature_hex) = state_str.split_once('|')?;

        let mut mac = HmacSha256::new_from_slice(&self.state_key).ok()?;
        mac.update(payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if signature_hex != expected {
            tracing::warn!("OAuth state signature mismatch");
            return None;
        }

        u128::from_str_radix(payload, 16).ok()
    }

    /// Exchange an authorization code for a verified Google profile.
    pub async fn exchange_code(&self, code: &str) -> Result<VerifiedProfile, AppError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Token exchange request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(anyhow::anyhow!(
                "Token exchange returned {}: {}",
                status,
                body
            )));
        }

        let tokens: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid token response: {}", e)))?;

        let info: GoogleUserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid userinfo response: {}", e)))?;

        Ok(VerifiedProfile {
            email: info.email,
            google_id: info.id,
            display_name: info.name.unwrap_or_default(),
            avatar: info.picture.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuth {
        GoogleOAuth::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:4000/user/auth/google/callback".to_string(),
            b"state_signing_key".to_vec(),
        )
    }

    #[test]
    fn test_state_sign_and_verify() {
        let google = client();
        let url = google.authorize_url().unwrap();

        let state = url
            .split("state=")
            .nth(1)
            .expect("authorize URL carries state");
        assert!(google.verify_state(state));
    }

    #[test]
    fn test_state_rejected_with_wrong_key() {
        let google = client();
        let url = google.authorize_url().unwrap();
        let state = url.split("state=").nth(1).unwrap();

        let other = GoogleOAuth::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:4000/user/auth/google/callback".to_string(),
            b"different_key".to_vec(),
        );
        assert!(!other.verify_state(state));
    }

    #[test]
    fn test_state_rejected_when_tampered() {
        let google = client();

        // Valid base64, wrong signature
        let forged = URL_SAFE_NO_PAD.encode("deadbeef|0000");
        assert!(!google.verify_state(&forged));

        // Not even base64
        assert!(!google.verify_state("%%%"));
        assert!(!google.verify_state(""));
    }
}
