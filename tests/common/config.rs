//! Test configuration helpers for loading .env credentials and building live clients

use zone_snapshot::client::{Credentials, HttpClient};
use zone_snapshot::{Config, Error};

/// Load API credentials from environment variables
///
/// Required environment variables:
/// - `DNS_API_USERNAME` - Account username
/// - `DNS_API_PASSWORD` - Account password
///
/// Optional environment variables:
/// - `DNS_API_URL` - API base URL (default: the production endpoint)
pub fn load_live_config() -> Option<(Config, Credentials)> {
    dotenvy::dotenv().ok();

    let username = std::env::var("DNS_API_USERNAME").ok()?;
    let password = std::env::var("DNS_API_PASSWORD").ok()?;
    let mut config = Config::default();
    if let Ok(url) = std::env::var("DNS_API_URL") {
        config.api_url = url;
    }

    Some((config, Credentials::Password { username, password }))
}

/// Check if live test credentials are available
pub fn has_live_credentials() -> bool {
    load_live_config().is_some()
}

/// Authenticate against the live API with credentials from .env
pub async fn create_live_client() -> Result<(HttpClient, Config), Error> {
    let (config, credentials) = load_live_config()
        .ok_or_else(|| Error::Auth("DNS_API_USERNAME/DNS_API_PASSWORD not set".to_string()))?;
    let client = HttpClient::connect(&config, &credentials).await?;
    Ok((client, config))
}

/// Skip test if credentials are not available
#[macro_export]
macro_rules! skip_if_no_credentials {
    () => {
        if !$crate::common::has_live_credentials() {
            eprintln!("Skipping test: DNS API credentials not found in .env");
            return;
        }
    };
}
