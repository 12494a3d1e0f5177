use std::fmt;

use serde_json::Value;

use crate::api::SessionKind;
use crate::auth::AccessToken;

/// Options for `Whetstone::get`.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Fetch this single record instead of the whole collection
    pub record_id: Option<String>,
    /// Extra query parameters; `limit`/`skip` here override the paging defaults
    pub params: Vec<(String, String)>,
    pub session: SessionKind,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frontend() -> Self {
        Self::new().session(SessionKind::Frontend)
    }

    pub fn record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn session(mut self, session: SessionKind) -> Self {
        self.session = session;
        self
    }
}

/// Options for `Whetstone::post` and `Whetstone::put`.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
    pub session: SessionKind,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(body: Value) -> Self {
        Self::new().body(body)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn session(mut self, session: SessionKind) -> Self {
        self.session = session;
        self
    }
}

/// OAuth2 client id/secret pair for the client-credentials grant.
#[derive(Clone, PartialEq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Input to `Whetstone::authorize_client`: a saved token, credentials, or both.
/// A supplied token is used in preference to the credentials.
#[derive(Debug, Clone, Default)]
pub struct ClientAuthorization {
    pub access_token: Option<AccessToken>,
    pub credentials: Option<ClientCredentials>,
}

impl ClientAuthorization {
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            access_token: Some(token),
            credentials: None,
        }
    }

    pub fn with_credentials(credentials: ClientCredentials) -> Self {
        Self {
            access_token: None,
            credentials: Some(credentials),
        }
    }
}

/// Username/password login for the frontend session.
#[derive(Clone, PartialEq)]
pub struct FrontendLogin {
    pub district_id: String,
    pub username: String,
    pub password: String,
}

impl FrontendLogin {
    pub fn new(
        district_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            district_id: district_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for FrontendLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontendLogin")
            .field("district_id", &self.district_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
