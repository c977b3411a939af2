use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;

use crate::error::AmadeusError;

/// Refresh this long before the provider-declared expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Ceiling on how long a token is trusted, whatever `expires_in` claims.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// OAuth2 client-credentials token, fetched lazily and shared by all requests.
/// The mutex serialises refreshes so concurrent requests trigger one fetch.
pub struct TokenCache {
    token_url: String,
    client_id: String,
    client_secret: String,
    current: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            token_url,
            client_id,
            client_secret,
            current: Mutex::new(None),
        }
    }

    pub async fn bearer(&self, http: &reqwest::Client) -> Result<String, AmadeusError> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(AmadeusError::Auth("client credentials are not configured".to_string()));
        }

        let response = http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmadeusError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let parsed: TokenResponse = response.json().await?;
        info!(expires_in = parsed.expires_in, "Amadeus access token refreshed");

        let token = AccessToken {
            value: parsed.access_token,
            refresh_at: refresh_deadline(Instant::now(), parsed.expires_in),
        };
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Drops the cached token if it is still the one that was rejected; a
    /// token refreshed by a concurrent request is kept.
    pub async fn invalidate(&self, rejected: &str) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|t| t.value == rejected) {
            *current = None;
        }
    }
}

fn refresh_deadline(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in)
        .min(MAX_TOKEN_LIFETIME)
        .saturating_sub(REFRESH_MARGIN);
    now + lifetime
}
