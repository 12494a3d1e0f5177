//! Configuration loaded from the environment.
//!
//! Values come from process environment variables, after loading a `.env`
//! file from the working directory if one exists:
//!
//! - `WHETSTONE_CLIENT_ID`, `WHETSTONE_CLIENT_SECRET`
//! - `WHETSTONE_USERNAME`, `WHETSTONE_PASSWORD`, `WHETSTONE_DISTRICT_ID`
//! - `WHETSTONE_BASE_URL`, `WHETSTONE_PAGE_SIZE`, `WHETSTONE_TOKEN_FILE` (optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::auth::TokenStore;
use crate::models::{ClientCredentials, FrontendLogin};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub district_id: Option<String>,
    pub base_url: Option<String>,
    pub page_size: Option<u64>,
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Load `.env` (if present) and then read the environment
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("Failed to load .env file"),
        }
        Self::from_env()
    }

    /// Read configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let page_size = match get("WHETSTONE_PAGE_SIZE") {
            Some(raw) => {
                let size: u64 = raw
                    .parse()
                    .with_context(|| format!("WHETSTONE_PAGE_SIZE is not a number: {}", raw))?;
                if size == 0 {
                    anyhow::bail!("WHETSTONE_PAGE_SIZE must be greater than zero");
                }
                Some(size)
            }
            None => None,
        };

        Ok(Self {
            client_id: get("WHETSTONE_CLIENT_ID"),
            client_secret: get("WHETSTONE_CLIENT_SECRET"),
            username: get("WHETSTONE_USERNAME"),
            password: get("WHETSTONE_PASSWORD"),
            district_id: get("WHETSTONE_DISTRICT_ID"),
            base_url: get("WHETSTONE_BASE_URL"),
            page_size,
            token_file: get("WHETSTONE_TOKEN_FILE").map(PathBuf::from),
        })
    }

    /// Client credentials, if both id and secret are set
    pub fn client_credentials(&self) -> Option<ClientCredentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(ClientCredentials::new(id.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Frontend login, if district, username and password are all set
    pub fn frontend_login(&self) -> Option<FrontendLogin> {
        match (&self.district_id, &self.username, &self.password) {
            (Some(district), Some(user), Some(pass)) => {
                Some(FrontendLogin::new(district.as_str(), user.as_str(), pass.as_str()))
            }
            _ => None,
        }
    }

    /// Token store at `WHETSTONE_TOKEN_FILE`, or the default cache location
    pub fn token_store(&self) -> Result<TokenStore> {
        match self.token_file {
            Some(ref path) => Ok(TokenStore::new(path.clone())),
            None => TokenStore::default_location(),
        }
    }
}
