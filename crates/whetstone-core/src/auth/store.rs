use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::AccessToken;

/// Application name used for the cache directory path
const APP_NAME: &str = "whetstone";

/// Token file name in cache directory
const TOKEN_FILE: &str = "token.json";

/// JSON file holding a client-session access token between runs.
///
/// The client never touches this itself; callers load a token from here and
/// pass it to `Whetstone::authorize_client`, then save whatever token the
/// client ends up holding.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's cache directory (`<cache>/whetstone/token.json`)
    pub fn default_location() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(Self::new(cache_dir.join(APP_NAME).join(TOKEN_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved token. Returns `None` if there is no file or the token has expired.
    pub fn load(&self) -> Result<Option<AccessToken>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file: {}", self.path.display()))?;
        let token: AccessToken = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token file: {}", self.path.display()))?;

        if token.is_expired() {
            debug!(path = %self.path.display(), "Saved token has expired");
            return Ok(None);
        }
        Ok(Some(token))
    }

    pub fn save(&self, token: &AccessToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(token)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
