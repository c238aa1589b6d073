//! Google Fit OAuth helper.
//!
//! Builds the consent URL and exchanges authorization codes for tokens.

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::http_client;
use crate::error::{Result, VerifyError};

const FITNESS_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/fitness.activity.read",
    "https://www.googleapis.com/auth/fitness.body.read",
    "https://www.googleapis.com/auth/fitness.location.read",
];

/// Access-token lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Refresh-token cookie lifetime (30 days)
pub const REFRESH_TOKEN_LIFETIME_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    /// Where the provider sends the user back with a code
    pub redirect_uri: String,
    pub request_timeout: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            redirect_uri: "http://localhost:8080/verify/fitness/callback".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Tokens returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl TokenGrant {
    pub fn lifetime_secs(&self) -> u64 {
        self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

pub struct GoogleFitOAuth {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl GoogleFitOAuth {
    pub fn new(config: OAuthConfig) -> Self {
        let http_client = http_client(config.request_timeout, None);

        Self {
            config,
            http_client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.client_id.is_some()
    }

    fn client_id(&self) -> Result<&str> {
        self.config.client_id.as_deref().ok_or_else(|| {
            VerifyError::Configuration(
                "Set GOOGLE_FIT_CLIENT_ID and GOOGLE_FIT_CLIENT_SECRET".to_string(),
            )
        })
    }

    /// Consent URL; `state` carries the wallet address through the round trip.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let client_id = self.client_id()?;
        let scopes = FITNESS_SCOPES.join(" ");

        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&prompt=consent&state={}",
            self.config.auth_url,
            urlencoding::encode(client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state),
        ))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let client_id = self.client_id()?;
        let client_secret = self.config.client_secret.as_deref().ok_or_else(|| {
            VerifyError::Configuration("Set GOOGLE_FIT_CLIENT_SECRET".to_string())
        })?;

        let form = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Authorization code exchange rejected");
            return Err(VerifyError::Upstream {
                service: "google_oauth",
                status: response.status().as_u16(),
            });
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        debug!(
            has_refresh = grant.refresh_token.is_some(),
            expires_in = grant.lifetime_secs(),
            "Fitness tokens issued"
        );
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_client() {
        let oauth = GoogleFitOAuth::new(OAuthConfig::default());
        assert!(!oauth.is_configured());
        assert!(matches!(
            oauth.authorization_url("0xabc"),
            Err(VerifyError::Configuration(_))
        ));
    }

    #[test]
    fn test_authorization_url() {
        let oauth = GoogleFitOAuth::new(OAuthConfig {
            client_id: Some("client-1".into()),
            redirect_uri: "https://app.example/verify/fitness/callback".into(),
            ..Default::default()
        });
        let url = oauth.authorization_url("0xabc").unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?client_id=client-1"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example%2Fverify%2Ffitness%2Fcallback"));
        assert!(url.contains("fitness.activity.read%20https%3A%2F%2Fwww.googleapis.com%2Fauth%2Ffitness.body.read"));
        assert!(url.contains("&access_type=offline&prompt=consent&state=0xabc"));
    }

    #[test]
    fn test_token_lifetime_default() {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"t"}"#).unwrap();
        assert_eq!(grant.lifetime_secs(), 3600);
        assert!(grant.refresh_token.is_none());
    }
}
