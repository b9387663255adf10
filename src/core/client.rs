use serde::Deserialize;
use tracing::instrument;

use crate::core::config::Args;
use crate::core::error::{ConfigError, Error};

/// Client for the external OAuth2 identity provider: builds the authorize
/// redirect, exchanges authorization codes, and fetches the user profile.
#[derive(Clone)]
pub(crate) struct Client {
    client: reqwest::Client,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserProfile {
    pub(crate) sub: String,
    pub(crate) email: Option<String>,
    pub(crate) name: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl Client {
    pub(crate) fn new(user: &str, config: &Args) -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new().user_agent(user).build()?;

        Ok(Self {
            client,
            authorize_url: config.oauth_authorize_url.clone(),
            token_url: config.oauth_token_url.clone(),
            userinfo_url: config.oauth_userinfo_url.clone(),
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
        })
    }

    pub(crate) fn authorize_url(&self, state: &str) -> Result<String, Error> {
        let query = serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("scope", "openid email profile"),
            ("state", state),
        ])?;

        Ok(format!("{}?{}", self.authorize_url, query))
    }

    #[instrument(skip_all)]
    pub(crate) async fn exchange_code(&self, code: &str) -> Result<String, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.access_token)
    }

    #[instrument(skip_all)]
    pub(crate) async fn userinfo(&self, access_token: &str) -> Result<UserProfile, Error> {
        let profile = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            user: "kanban-test".to_string(),
            database_host: "localhost".to_string(),
            database_port: 5432,
            database_name: "kanban".to_string(),
            database_user: "kanban".to_string(),
            database_password: "kanban".to_string(),
            log_level: "debug".to_string(),
            port: 8080,
            secret: "test-secret-test-secret-test-secret".to_string(),
            token_ttl_seconds: 86_400,
            oauth_client_id: "client-id".to_string(),
            oauth_client_secret: "client-secret".to_string(),
            oauth_authorize_url: "https://idp.example.com/authorize".to_string(),
            oauth_token_url: "https://idp.example.com/token".to_string(),
            oauth_userinfo_url: "https://idp.example.com/userinfo".to_string(),
            oauth_redirect_url: "https://kanban.example.com/auth/callback".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_the_oauth_parameters() {
        let client = Client::new("kanban-test", &args()).unwrap();
        let url = client.authorize_url("nonce-123").unwrap();

        assert!(url.starts_with("https://idp.example.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("state=nonce-123"));
        assert!(
            url.contains("redirect_uri=https%3A%2F%2Fkanban.example.com%2Fauth%2Fcallback")
        );
    }

    #[test]
    fn debug_output_omits_the_client_secret() {
        let client = Client::new("kanban-test", &args()).unwrap();

        assert!(!format!("{:?}", client).contains("client-secret"));
    }
}
