use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Token lifetime assumed when the token endpoint reports no expiry at all.
const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Bearer token issued by one of the Whetstone token endpoints.
///
/// Deserializes from either a token endpoint response (`expires_in` only) or a
/// previously saved token (`expires_at` as epoch seconds, integer or float).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TokenResponse")]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(serialize_with = "chrono::serde::ts_seconds::serialize")]
    pub expires_at: DateTime<Utc>,
}

/// Raw shape of a token payload as it comes off the wire or out of a file.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<f64>,
    expires_at: Option<f64>,
}

impl TryFrom<TokenResponse> for AccessToken {
    type Error = String;

    fn try_from(raw: TokenResponse) -> Result<Self, Self::Error> {
        AccessToken::from_response(raw, Utc::now())
    }
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_in: None,
            expires_at,
        }
    }

    fn from_response(raw: TokenResponse, now: DateTime<Utc>) -> Result<Self, String> {
        if raw.access_token.is_empty() {
            return Err("token response has an empty access_token".to_string());
        }

        let expires_in = raw.expires_in.map(|secs| secs as i64);
        let expires_at = match (raw.expires_at, expires_in) {
            (Some(epoch), _) => Utc
                .timestamp_opt(epoch as i64, 0)
                .single()
                .ok_or_else(|| format!("invalid expires_at timestamp: {}", epoch))?,
            (None, Some(secs)) => Duration::try_seconds(secs)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| format!("expires_in out of range: {}", secs))?,
            (None, None) => now + Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        };

        Ok(Self {
            access_token: raw.access_token,
            token_type: raw.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// A token is valid strictly before its expiry timestamp
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }

    /// Value for the `Authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// Keep the token itself out of logs
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
