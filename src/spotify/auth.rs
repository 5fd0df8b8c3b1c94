use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::{
    error::{Error, Result},
    types::TokenResponse,
};

/// Exchanges a stored refresh token for a short-lived access token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self, refresh_token: &str) -> Result<String>;
}

/// Refresh token grant against the Spotify accounts service.
///
/// Tokens are never cached: every user run starts with a fresh exchange
/// since access tokens only live for an hour.
#[derive(Debug, Clone)]
pub struct SpotifyAccounts {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyAccounts {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl CredentialStore for SpotifyAccounts {
    async fn access_token(&self, refresh_token: &str) -> Result<String> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(Error::CredentialExchange {
                status: status.as_u16(),
                body: res.text().await.unwrap_or_default(),
            });
        }

        let token = res.json::<TokenResponse>().await?;
        Ok(token.access_token)
    }
}
