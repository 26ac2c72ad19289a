//! Service-account authentication
//!
//! Exchanges a signed JWT assertion for an OAuth access token
//! (RFC 7523 bearer grant), the flow Google uses for service accounts.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Read/write on spreadsheets plus Drive lookup by name
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            return Err(SyncError::Auth(format!(
                "credential file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Auth(format!("cannot read credential file {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> SyncResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| SyncError::Auth(format!("invalid service account key: {}", e)))
    }

    /// Build the signed assertion presented to the token endpoint
    pub fn assertion(&self, now: DateTime<Utc>) -> SyncResult<String> {
        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPES.join(" "),
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_LIFETIME_SECS)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| SyncError::Auth(format!("invalid private key: {}", e)))?;

        encode(&header, &claims, &key)
            .map_err(|e| SyncError::Auth(format!("failed to sign assertion: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Bearer token for API calls
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Exchange the key for an access token
pub async fn fetch_access_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> SyncResult<AccessToken> {
    let now = Utc::now();
    let assertion = key.assertion(now)?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| SyncError::Connection(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Auth(format!(
            "token endpoint returned {}: {}",
            status,
            body.trim()
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SyncError::Auth(format!("unreadable token response: {}", e)))?;

    log::debug!("Obtained access token for {}", key.client_email);

    Ok(AccessToken {
        token: token.access_token,
        expires_at: now + Duration::seconds(token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"type": "service_account", "client_email": "bot@project.iam.gserviceaccount.com", "private_key": "x"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(key.private_key_id, None);
    }

    #[test]
    fn test_missing_key_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceAccountKey::from_file(&dir.path().join("service_account.json")).unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[test]
    fn test_malformed_key_file_is_auth_error() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": 5}"#).unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[test]
    fn test_bad_private_key_is_auth_error() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "bot@example.com", "private_key": "not a pem"}"#,
        )
        .unwrap();
        let err = key.assertion(Utc::now()).unwrap_err();
        assert!(matches!(err, SyncError::Auth(ref m) if m.contains("private key")));
    }
}
