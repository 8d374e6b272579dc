// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fitbit OAuth client ID (public)
    pub fitbit_client_id: String,
    /// Fitbit OAuth client secret
    pub fitbit_client_secret: String,
    /// OAuth redirect URI registered with Fitbit
    pub fitbit_redirect_uri: String,
    /// Space-separated OAuth scopes requested at connect time
    pub fitbit_scope: String,
    /// Fitbit authorize endpoint
    pub authorize_uri: String,
    /// Fitbit token endpoint
    pub token_uri: String,
    /// Fitbit REST API base URI (overridable so tests can point at a mock server)
    pub api_base_uri: String,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            fitbit_client_id: env::var("FITBIT_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_ID"))?,
            fitbit_client_secret: env::var("FITBIT_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_SECRET"))?,
            fitbit_redirect_uri: env::var("FITBIT_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080/oauth/fitbit/callback".to_string()),
            fitbit_scope: env::var("FITBIT_SCOPE").unwrap_or_else(|_| {
                "activity cardio_fitness heartrate profile sleep weight".to_string()
            }),
            authorize_uri: env::var("FITBIT_AUTHORIZE_URI")
                .unwrap_or_else(|_| "https://www.fitbit.com/oauth2/authorize".to_string()),
            token_uri: env::var("FITBIT_TOKEN_URI")
                .unwrap_or_else(|_| "https://api.fitbit.com/oauth2/token".to_string()),
            api_base_uri: env::var("FITBIT_API_BASE_URI")
                .unwrap_or_else(|_| "https://api.fitbit.com".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            fitbit_client_id: "test_client_id".to_string(),
            fitbit_client_secret: "test_secret".to_string(),
            fitbit_redirect_uri: "http://localhost:8080/oauth/fitbit/callback".to_string(),
            fitbit_scope: "activity heartrate sleep".to_string(),
            authorize_uri: "https://www.fitbit.com/oauth2/authorize".to_string(),
            token_uri: "https://api.fitbit.com/oauth2/token".to_string(),
            api_base_uri: "https://api.fitbit.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
