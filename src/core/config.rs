use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub(crate) struct Args {
    pub(crate) user: String,
    pub(crate) database_host: String,
    pub(crate) database_port: u16,
    pub(crate) database_name: String,
    pub(crate) database_user: String,
    pub(crate) database_password: String,
    pub(crate) log_level: String,
    pub(crate) port: u16,
    pub(crate) secret: String,
    #[serde(default = "default_token_ttl_seconds")]
    pub(crate) token_ttl_seconds: i64,
    pub(crate) oauth_client_id: String,
    pub(crate) oauth_client_secret: String,
    pub(crate) oauth_authorize_url: String,
    pub(crate) oauth_token_url: String,
    pub(crate) oauth_userinfo_url: String,
    pub(crate) oauth_redirect_url: String,
}

fn default_token_ttl_seconds() -> i64 {
    86_400
}
