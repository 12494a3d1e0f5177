//! API client for the Whetstone Education REST API.
//!
//! This module provides the `Whetstone` client, which authenticates its two
//! sessions, dispatches single requests and assembles paginated list reads.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::AccessToken;
use crate::config::Config;
use crate::models::{ClientAuthorization, Envelope, FrontendLogin, GetOptions, GetResponse, WriteOptions};

use super::transport::{HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for all Whetstone endpoints
const API_BASE_URL: &str = "https://api.whetstoneeducation.com";

/// Default number of records requested per page
const DEFAULT_PAGE_SIZE: u64 = 100;

/// Client-credentials token endpoint (relative to the base URL)
const CLIENT_TOKEN_PATH: &str = "auth/client/token";

/// Password-grant token endpoint (relative to the base URL)
const FRONTEND_TOKEN_PATH: &str = "auth/token";

/// Collections that do not answer with the paginated envelope
const UNPAGINATED_RESOURCES: &[&str] = &["generic-tags", "roles"];

const JSON_CONTENT_TYPE: &str = "application/json";

/// Which authenticated session a request goes out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKind {
    /// Machine-to-machine session, routed under `/external/`
    #[default]
    Client,
    /// Human-login session, routed at the API root
    Frontend,
}

impl SessionKind {
    /// Full URL for `path` on this session
    pub fn url(&self, base_url: &str, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self {
            SessionKind::Client => format!("{}/external/{}", base_url, path),
            SessionKind::Frontend => format!("{}/{}", base_url, path),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Client => "client",
            SessionKind::Frontend => "frontend",
        }
    }
}

/// Default headers and bearer token owned by one session.
#[derive(Debug, Clone)]
struct Session {
    headers: Vec<(String, String)>,
    token: Option<AccessToken>,
}

impl Session {
    fn new() -> Self {
        Self {
            headers: Vec::new(),
            token: None,
        }
    }

    fn json() -> Self {
        let mut session = Self::new();
        session.set_header("Accept", JSON_CONTENT_TYPE);
        session.set_header("Content-Type", JSON_CONTENT_TYPE);
        session
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn attach_token(&mut self, token: AccessToken) {
        self.set_header("Authorization", &token.bearer_header());
        self.token = Some(token);
    }
}

/// Client for the Whetstone API.
///
/// Holds a `client` session (OAuth2 client credentials) and a `frontend`
/// session (username/password login), each with its own token and headers.
pub struct Whetstone<T: Transport = ReqwestTransport> {
    transport: T,
    base_url: String,
    page_size: u64,
    client: Session,
    frontend: Session,
}

impl Whetstone<ReqwestTransport> {
    /// Create a client backed by the default blocking HTTP transport
    pub fn new() -> Result<Self, ApiError> {
        Ok(Self::with_transport(ReqwestTransport::new()?))
    }

    /// Create a client and apply base URL and page size from `config`
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new()?.configure(config)
    }
}

impl<T: Transport> Whetstone<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            base_url: API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            client: Session::json(),
            frontend: Session::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Result<Self, ApiError> {
        if page_size == 0 {
            return Err(ApiError::Config("page size must be greater than zero".to_string()));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Apply the optional base URL and page size settings from `config`
    pub fn configure(mut self, config: &Config) -> Result<Self, ApiError> {
        if let Some(ref base_url) = config.base_url {
            self = self.with_base_url(base_url.as_str());
        }
        if let Some(page_size) = config.page_size {
            self = self.with_page_size(page_size)?;
        }
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Token currently held by the client session
    pub fn client_token(&self) -> Option<&AccessToken> {
        self.client.token.as_ref()
    }

    /// Token currently held by the frontend session
    pub fn frontend_token(&self) -> Option<&AccessToken> {
        self.frontend.token.as_ref()
    }

    pub fn is_client_authorized(&self) -> bool {
        self.client.token.as_ref().map(|t| !t.is_expired()).unwrap_or(false)
    }

    pub fn is_frontend_authorized(&self) -> bool {
        self.frontend.token.as_ref().map(|t| !t.is_expired()).unwrap_or(false)
    }

    // ===== Authorization =====

    /// Authorize the client session with a saved token or client credentials.
    ///
    /// A supplied token is checked against its expiry and attached without any
    /// network call. Otherwise the credentials are exchanged for a new token.
    pub fn authorize_client(&mut self, auth: ClientAuthorization) -> Result<(), ApiError> {
        if let Some(token) = auth.access_token {
            if token.is_expired() {
                return Err(ApiError::TokenExpired {
                    expired_at: token.expires_at,
                });
            }
            debug!(
                minutes_left = token.minutes_until_expiry(),
                "Using supplied client access token"
            );
            self.client.attach_token(token);
            return Ok(());
        }

        let credentials = auth.credentials.ok_or_else(|| {
            ApiError::Config("You must provide a valid access token or client credentials".to_string())
        })?;
        if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
            return Err(ApiError::Config(
                "Client id and client secret must not be empty".to_string(),
            ));
        }

        info!(client_id = %credentials.client_id, "Fetching new client access token");

        let mut request = HttpRequest::new(
            Method::Post,
            format!("{}/{}", self.base_url, CLIENT_TOKEN_PATH),
        );
        request.headers.push(("Accept".to_string(), JSON_CONTENT_TYPE.to_string()));
        request.body = Some(RequestBody::Form(vec![(
            "grant_type".to_string(),
            "client_credentials".to_string(),
        )]));
        request.basic_auth = Some((credentials.client_id, credentials.client_secret));

        let response = self.transport.send(&request)?;
        let token: AccessToken = Self::decode(Method::Post, &request.url, response)?;
        self.client.attach_token(token);
        Ok(())
    }

    /// Log the frontend session in with a username and password for `district_id`.
    pub fn authorize_frontend(&mut self, login: &FrontendLogin) -> Result<(), ApiError> {
        info!(username = %login.username, district = %login.district_id, "Fetching new frontend access token");

        self.frontend.set_header("district", &login.district_id);
        let body = json!({
            "username": login.username,
            "password": login.password,
            "grant_type": "password",
        });
        let token: AccessToken = self.call(
            SessionKind::Frontend,
            Method::Post,
            FRONTEND_TOKEN_PATH,
            &[],
            Some(&body),
        )?;

        self.frontend.set_header("Accept", JSON_CONTENT_TYPE);
        self.frontend.set_header("Content-Type", JSON_CONTENT_TYPE);
        self.frontend.attach_token(token);
        Ok(())
    }

    // ===== Request dispatch =====

    fn session(&self, kind: SessionKind) -> &Session {
        match kind {
            SessionKind::Client => &self.client,
            SessionKind::Frontend => &self.frontend,
        }
    }

    /// Issue one request on the chosen session and return the raw response,
    /// whatever its status.
    pub fn request(
        &self,
        kind: SessionKind,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<HttpResponse, ApiError> {
        let mut request = HttpRequest::new(method, kind.url(&self.base_url, path));
        request.headers = self.session(kind).headers.clone();
        request.query = params.to_vec();
        request.body = body.cloned().map(RequestBody::Json);

        debug!(session = kind.as_str(), method = method.as_str(), url = %request.url, "Request");
        self.transport.send(&request)
    }

    /// Issue a request and decode the JSON body, failing on non-2xx.
    fn call<R: DeserializeOwned>(
        &self,
        kind: SessionKind,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<R, ApiError> {
        let response = self.request(kind, method, path, params, body)?;
        Self::decode(method, &kind.url(&self.base_url, path), response)
    }

    fn decode<R: DeserializeOwned>(method: Method, url: &str, response: HttpResponse) -> Result<R, ApiError> {
        match response.error_for_status() {
            Ok(response) => response.json(),
            Err(err) => {
                warn!(
                    method = method.as_str(),
                    url = url,
                    status = ?err.status(),
                    name = ?err.name(),
                    code = ?err.code(),
                    message = ?err.message(),
                    "Request failed"
                );
                Err(err)
            }
        }
    }

    // ===== Reads =====

    /// Read a resource.
    ///
    /// - With a record id: fetch that record, wrapped in a one-element envelope.
    /// - On the frontend session, or for an unpaginated collection: return the
    ///   response body as-is.
    /// - Otherwise: fetch every page and return one envelope holding all records
    ///   in server order.
    pub fn get(&self, resource: &str, options: &GetOptions) -> Result<GetResponse, ApiError> {
        let kind = options.session;

        if let Some(ref record_id) = options.record_id {
            let path = format!("{}/{}", resource, record_id);
            let record: Value = self.call(kind, Method::Get, &path, &options.params, None)?;
            return Ok(GetResponse::Envelope(Envelope::single(record, self.page_size)));
        }

        let paging = Paging::from_params(self.page_size, &options.params)?;

        let collection = resource.trim_start_matches('/');
        if kind == SessionKind::Frontend || UNPAGINATED_RESOURCES.contains(&collection) {
            let body: Value = self.call(kind, Method::Get, resource, &paging.params(), None)?;
            return Ok(GetResponse::Raw(body));
        }

        self.get_all_pages(kind, resource, paging)
    }

    fn get_all_pages(
        &self,
        kind: SessionKind,
        resource: &str,
        mut paging: Paging,
    ) -> Result<GetResponse, ApiError> {
        let mut records: Vec<Value> = Vec::new();

        loop {
            let mut page: Envelope = self.call(kind, Method::Get, resource, &paging.params(), None)?;
            let fetched = page.data.len();
            records.append(&mut page.data);

            debug!(
                resource = resource,
                skip = paging.skip,
                fetched = fetched,
                accumulated = records.len(),
                count = page.count,
                "Fetched page"
            );

            // An empty page before reaching `count` means the server over-reported
            if records.len() as u64 >= page.count || fetched == 0 {
                page.data = records;
                return Ok(GetResponse::Envelope(page));
            }
            paging.skip = paging
                .skip
                .checked_add(paging.limit)
                .ok_or_else(|| ApiError::Config("skip overflowed while paging".to_string()))?;
        }
    }

    // ===== Writes =====

    pub fn post(&self, resource: &str, options: &WriteOptions) -> Result<Value, ApiError> {
        self.call(
            options.session,
            Method::Post,
            resource,
            &options.params,
            options.body.as_ref(),
        )
    }

    pub fn put(&self, resource: &str, record_id: &str, options: &WriteOptions) -> Result<Value, ApiError> {
        let path = format!("{}/{}", resource, record_id);
        self.call(
            options.session,
            Method::Put,
            &path,
            &options.params,
            options.body.as_ref(),
        )
    }

    pub fn delete(&self, resource: &str, record_id: &str, session: SessionKind) -> Result<Value, ApiError> {
        let path = format!("{}/{}", resource, record_id);
        self.call(session, Method::Delete, &path, &[], None)
    }

    /// Archive or reactivate a user. Only the frontend API exposes this.
    pub fn set_archived(&self, user_id: &str, archived: bool) -> Result<Value, ApiError> {
        let path = format!("users/{}/archive", user_id);
        let params = [("value".to_string(), archived.to_string())];
        self.call(SessionKind::Frontend, Method::Put, &path, &params, None)
    }
}

/// `limit`/`skip` paging state plus the caller's other query parameters.
struct Paging {
    limit: u64,
    skip: u64,
    extra: Vec<(String, String)>,
}

impl Paging {
    fn from_params(page_size: u64, params: &[(String, String)]) -> Result<Self, ApiError> {
        let mut paging = Self {
            limit: page_size,
            skip: 0,
            extra: Vec::new(),
        };

        for (key, value) in params {
            match key.as_str() {
                "limit" => paging.limit = Self::parse_number(key, value)?,
                "skip" => paging.skip = Self::parse_number(key, value)?,
                _ => paging.extra.push((key.clone(), value.clone())),
            }
        }

        if paging.limit == 0 {
            return Err(ApiError::Config("limit must be greater than zero".to_string()));
        }
        Ok(paging)
    }

    fn parse_number(key: &str, value: &str) -> Result<u64, ApiError> {
        value
            .parse()
            .map_err(|_| ApiError::Config(format!("{} must be a non-negative integer, got {:?}", key, value)))
    }

    fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("skip".to_string(), self.skip.to_string()),
        ];
        params.extend(self.extra.iter().cloned());
        params
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::ScriptedTransport;
    use crate::models::ClientCredentials;
    use chrono::{Duration, Utc};

    const BASE: &str = "https://api.whetstoneeducation.com";

    fn valid_token(value: &str) -> AccessToken {
        AccessToken::new(value, Utc::now() + Duration::hours(1))
    }

    fn authorized(transport: ScriptedTransport) -> Whetstone<ScriptedTransport> {
        let mut ws = Whetstone::with_transport(transport);
        ws.authorize_client(ClientAuthorization::with_token(valid_token("tok")))
            .expect("valid token should authorize");
        ws
    }

    fn page(count: u64, skip: u64, ids: std::ops::Range<u64>) -> Value {
        let data: Vec<Value> = ids.map(|i| json!({"_id": i})).collect();
        json!({"count": count, "limit": 100, "skip": skip, "data": data})
    }

    #[test]
    fn test_session_kind_urls() {
        assert_eq!(SessionKind::Client.url(BASE, "users"), format!("{}/external/users", BASE));
        assert_eq!(SessionKind::Frontend.url(BASE, "/roles"), format!("{}/roles", BASE));
        assert_eq!(SessionKind::default(), SessionKind::Client);
    }

    #[test]
    fn test_authorize_with_valid_token_makes_no_request() {
        let ws = authorized(ScriptedTransport::new().respond(200, page(0, 0, 0..0)));

        assert_eq!(ws.transport().request_count(), 0);
        assert!(ws.is_client_authorized());
        assert_eq!(ws.client_token().map(|t| t.access_token.as_str()), Some("tok"));

        ws.get("schools", &GetOptions::new()).unwrap();
        let requests = ws.transport().requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
        assert_eq!(requests[0].header("Accept"), Some("application/json"));
    }

    #[test]
    fn test_authorize_with_expired_token_fails_without_request() {
        let mut ws = Whetstone::with_transport(ScriptedTransport::new());
        let expired = AccessToken::new("old", Utc::now() - Duration::minutes(1));

        let err = ws
            .authorize_client(ClientAuthorization::with_token(expired))
            .unwrap_err();

        assert!(matches!(err, ApiError::TokenExpired { .. }));
        assert_eq!(ws.transport().request_count(), 0);
        assert!(!ws.is_client_authorized());
    }

    #[test]
    fn test_authorize_without_inputs_is_config_error() {
        let mut ws = Whetstone::with_transport(ScriptedTransport::new());
        let err = ws.authorize_client(ClientAuthorization::default()).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));

        let err = ws
            .authorize_client(ClientAuthorization::with_credentials(ClientCredentials::new("id", "")))
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert_eq!(ws.transport().request_count(), 0);
    }

    #[test]
    fn test_authorize_with_credentials_exchanges_token() {
        let transport = ScriptedTransport::new().respond(
            200,
            json!({"access_token": "fresh", "token_type": "Bearer", "expires_in": 3600}),
        );
        let mut ws = Whetstone::with_transport(transport);

        ws.authorize_client(ClientAuthorization::with_credentials(ClientCredentials::new(
            "my-id", "my-secret",
        )))
        .expect("token exchange should succeed");

        let requests = ws.transport().requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, format!("{}/auth/client/token", BASE));
        assert_eq!(
            request.basic_auth,
            Some(("my-id".to_string(), "my-secret".to_string()))
        );
        assert_eq!(
            request.body,
            Some(RequestBody::Form(vec![(
                "grant_type".to_string(),
                "client_credentials".to_string()
            )]))
        );

        assert!(ws.is_client_authorized());
        assert_eq!(ws.client_token().map(|t| t.access_token.as_str()), Some("fresh"));
    }

    #[test]
    fn test_authorize_prefers_token_over_credentials() {
        let mut ws = Whetstone::with_transport(ScriptedTransport::new());
        let auth = ClientAuthorization {
            access_token: Some(valid_token("saved")),
            credentials: Some(ClientCredentials::new("id", "secret")),
        };

        ws.authorize_client(auth).unwrap();
        assert_eq!(ws.transport().request_count(), 0);
        assert_eq!(ws.client_token().map(|t| t.access_token.as_str()), Some("saved"));
    }

    #[test]
    fn test_credentials_exchange_failure_carries_body() {
        let body = json!({"name": "NotAuthenticated", "code": 401, "message": "Invalid client"});
        let mut ws = Whetstone::with_transport(ScriptedTransport::new().respond(401, body.clone()));

        let err = ws
            .authorize_client(ClientAuthorization::with_credentials(ClientCredentials::new("id", "bad")))
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.body(), Some(&body));
        assert!(!ws.is_client_authorized());
    }

    #[test]
    fn test_authorize_frontend() {
        let transport = ScriptedTransport::new()
            .respond(200, json!({"access_token": "human", "expires_in": 1800}))
            .respond(200, json!([{"_id": "r1", "name": "Teacher"}]));
        let mut ws = Whetstone::with_transport(transport);

        ws.authorize_frontend(&FrontendLogin::new("district-1", "jane", "pw"))
            .expect("login should succeed");
        assert!(ws.is_frontend_authorized());
        assert!(!ws.is_client_authorized());

        ws.get("roles", &GetOptions::frontend()).unwrap();

        let requests = ws.transport().requests();
        let login = &requests[0];
        assert_eq!(login.url, format!("{}/auth/token", BASE));
        assert_eq!(login.header("district"), Some("district-1"));
        assert_eq!(login.header("Authorization"), None);
        assert_eq!(
            login.body,
            Some(RequestBody::Json(json!({
                "username": "jane",
                "password": "pw",
                "grant_type": "password"
            })))
        );

        let roles = &requests[1];
        assert_eq!(roles.url, format!("{}/roles", BASE));
        assert_eq!(roles.header("Authorization"), Some("Bearer human"));
        assert_eq!(roles.header("district"), Some("district-1"));
        assert_eq!(roles.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_authorize_frontend_failure() {
        let body = json!({"name": "NotAuthenticated", "code": 401, "message": "Invalid login"});
        let mut ws = Whetstone::with_transport(ScriptedTransport::new().respond(401, body.clone()));

        let err = ws
            .authorize_frontend(&FrontendLogin::new("d", "jane", "wrong"))
            .unwrap_err();

        assert_eq!(err.body(), Some(&body));
        assert_eq!(err.message().as_deref(), Some("Invalid login"));
        assert!(ws.frontend_token().is_none());
    }

    #[test]
    fn test_get_paginates_until_count() {
        let transport = ScriptedTransport::new()
            .respond(200, page(250, 0, 0..100))
            .respond(200, page(250, 100, 100..200))
            .respond(200, page(250, 200, 200..250));
        let ws = authorized(transport);

        let response = ws.get("users", &GetOptions::new()).unwrap();

        let requests = ws.transport().requests();
        assert_eq!(requests.len(), 3);
        let skips: Vec<&str> = requests.iter().filter_map(|r| r.query_param("skip")).collect();
        assert_eq!(skips, vec!["0", "100", "200"]);
        assert!(requests.iter().all(|r| r.query_param("limit") == Some("100")));
        assert!(requests.iter().all(|r| r.url == format!("{}/external/users", BASE)));

        let envelope = response.envelope().expect("paginated read returns an envelope");
        assert_eq!(envelope.count, 250);
        assert_eq!(envelope.data.len(), 250);
        let ids: Vec<u64> = envelope.data.iter().filter_map(|r| r["_id"].as_u64()).collect();
        assert_eq!(ids, (0..250).collect::<Vec<u64>>());
    }

    #[test]
    fn test_get_respects_param_overrides() {
        let transport = ScriptedTransport::new()
            .respond(200, page(3, 0, 0..2))
            .respond(200, page(3, 2, 2..3));
        let ws = authorized(transport);

        let options = GetOptions::new().param("archived", true).param("limit", 2);
        let response = ws.get("users", &options).unwrap();
        assert_eq!(response.data().len(), 3);

        let requests = ws.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query_param("limit"), Some("2"));
        assert_eq!(requests[1].query_param("skip"), Some("2"));
        assert!(requests.iter().all(|r| r.query_param("archived") == Some("true")));
    }

    #[test]
    fn test_get_empty_collection() {
        let ws = authorized(ScriptedTransport::new().respond(200, page(0, 0, 0..0)));

        let response = ws.get("videos", &GetOptions::new()).unwrap();
        assert_eq!(response.count(), 0);
        assert!(response.data().is_empty());
        assert_eq!(ws.transport().request_count(), 1);
    }

    #[test]
    fn test_get_stops_on_empty_page() {
        let transport = ScriptedTransport::new()
            .respond(200, page(5, 0, 0..2))
            .respond(200, page(5, 100, 0..0));
        let ws = authorized(transport);

        let response = ws.get("meetings", &GetOptions::new()).unwrap();
        assert_eq!(response.data().len(), 2);
        assert_eq!(ws.transport().request_count(), 2);
    }

    #[test]
    fn test_get_skip_overflow_is_config_error() {
        let ws = authorized(ScriptedTransport::new().respond(200, page(5, 0, 0..2)));

        let options = GetOptions::new().param("skip", u64::MAX - 1);
        let err = ws.get("users", &options).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert_eq!(ws.transport().request_count(), 1);
    }

    #[test]
    fn test_get_single_record() {
        let record = json!({"_id": "u1", "name": "Jane"});
        let ws = authorized(ScriptedTransport::new().respond(200, record.clone()));

        let response = ws.get("users", &GetOptions::new().record("u1")).unwrap();

        let envelope = response.envelope().unwrap();
        assert_eq!(envelope.count, 1);
        assert_eq!(envelope.data, vec![record]);

        let request = &ws.transport().requests()[0];
        assert_eq!(request.url, format!("{}/external/users/u1", BASE));
        assert_eq!(request.query_param("limit"), None);
    }

    #[test]
    fn test_frontend_get_is_not_paginated() {
        let body = page(250, 0, 0..100);
        let ws = Whetstone::with_transport(ScriptedTransport::new().respond(200, body.clone()));

        let response = ws.get("school-roles", &GetOptions::frontend()).unwrap();

        assert_eq!(response, GetResponse::Raw(body));
        assert_eq!(response.count(), 250);
        assert_eq!(response.data().len(), 100);
        assert_eq!(ws.transport().request_count(), 1);
        assert_eq!(ws.transport().requests()[0].url, format!("{}/school-roles", BASE));
    }

    #[test]
    fn test_unpaginated_client_resources_return_raw() {
        let body = json!({"data": ["grades", "courses", "periods"]});
        let ws = authorized(ScriptedTransport::new().respond(200, body.clone()));

        let response = ws.get("generic-tags", &GetOptions::new()).unwrap();
        assert_eq!(response, GetResponse::Raw(body));
        assert_eq!(ws.transport().request_count(), 1);
    }

    #[test]
    fn test_unpaginated_resource_with_leading_slash() {
        let body = json!([{"_id": "r1", "name": "Teacher"}]);
        let ws = authorized(ScriptedTransport::new().respond(200, body.clone()));

        let response = ws.get("/roles", &GetOptions::new()).unwrap();
        assert_eq!(response, GetResponse::Raw(body));
        assert_eq!(ws.transport().requests()[0].url, format!("{}/external/roles", BASE));
    }

    #[test]
    fn test_credentials_exchange_with_huge_expiry_is_invalid_response() {
        let transport = ScriptedTransport::new().respond(200, json!({"access_token": "x", "expires_in": 1e17}));
        let mut ws = Whetstone::with_transport(transport);

        let err = ws
            .authorize_client(ClientAuthorization::with_credentials(ClientCredentials::new("id", "secret")))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(!ws.is_client_authorized());
    }

    #[test]
    fn test_get_error_carries_decoded_body() {
        let body = json!({"name": "Forbidden", "code": 403, "message": "Not allowed", "className": "forbidden"});
        let ws = authorized(ScriptedTransport::new().respond(403, body.clone()));

        let err = ws.get("observations", &GetOptions::new()).unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.body(), Some(&body));
    }

    #[test]
    fn test_server_error_is_http_error() {
        let ws = authorized(ScriptedTransport::new().respond_text(503, "Service Unavailable"));

        let err = ws.get("users", &GetOptions::new()).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 503, .. }));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_invalid_limit_override() {
        let ws = authorized(ScriptedTransport::new());

        let err = ws.get("users", &GetOptions::new().param("limit", "lots")).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        let err = ws.get("users", &GetOptions::new().param("limit", 0)).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert_eq!(ws.transport().request_count(), 0);
    }

    #[test]
    fn test_post_put_delete() {
        let transport = ScriptedTransport::new()
            .respond(201, json!({"_id": "new-user"}))
            .respond(200, json!({"_id": "new-user", "coach": "c1"}))
            .respond(200, json!({"_id": "new-user", "archivedAt": "2024-01-01"}))
            .respond(200, json!({"ok": true}));
        let ws = authorized(transport);

        let created = ws
            .post("users", &WriteOptions::with_body(json!({"name": "Jane"})))
            .unwrap();
        assert_eq!(created["_id"], "new-user");

        ws.put("users", "new-user", &WriteOptions::with_body(json!({"coach": "c1"})))
            .unwrap();
        ws.delete("users", "new-user", SessionKind::Client).unwrap();
        ws.post(
            "school-roles",
            &WriteOptions::new()
                .param("userId", "new-user")
                .session(SessionKind::Frontend),
        )
        .unwrap();

        let requests = ws.transport().requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, format!("{}/external/users", BASE));
        assert_eq!(requests[0].body, Some(RequestBody::Json(json!({"name": "Jane"}))));

        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(requests[1].url, format!("{}/external/users/new-user", BASE));

        assert_eq!(requests[2].method, Method::Delete);
        assert_eq!(requests[2].url, format!("{}/external/users/new-user", BASE));
        assert_eq!(requests[2].body, None);

        assert_eq!(requests[3].url, format!("{}/school-roles", BASE));
        assert_eq!(requests[3].query_param("userId"), Some("new-user"));
        assert_eq!(requests[3].body, None);
    }

    #[test]
    fn test_write_error_carries_body() {
        let body = json!({"name": "BadRequest", "code": 400, "message": "email is required"});
        let ws = authorized(ScriptedTransport::new().respond(400, body.clone()));

        let err = ws.post("users", &WriteOptions::new()).unwrap_err();
        assert_eq!(err.body(), Some(&body));
        assert_eq!(err.code().as_deref(), Some("400"));
    }

    #[test]
    fn test_set_archived() {
        let ws = Whetstone::with_transport(ScriptedTransport::new().respond(200, json!({})));

        ws.set_archived("u1", false).unwrap();

        let request = &ws.transport().requests()[0];
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, format!("{}/users/u1/archive", BASE));
        assert_eq!(request.query_param("value"), Some("false"));
    }

    #[test]
    fn test_builder_settings() {
        let ws = Whetstone::with_transport(ScriptedTransport::new())
            .with_base_url("https://staging.example.test/")
            .with_page_size(25)
            .unwrap();
        assert_eq!(ws.base_url(), "https://staging.example.test");
        assert_eq!(ws.page_size(), 25);

        let err = Whetstone::with_transport(ScriptedTransport::new())
            .with_page_size(0)
            .err()
            .expect("zero page size must be rejected");
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_configure_from_config() {
        let config = Config {
            base_url: Some("http://localhost:3030".to_string()),
            page_size: Some(10),
            ..Config::default()
        };
        let ws = Whetstone::with_transport(ScriptedTransport::new())
            .configure(&config)
            .unwrap();
        assert_eq!(ws.base_url(), "http://localhost:3030");
        assert_eq!(ws.page_size(), 10);
    }
}
