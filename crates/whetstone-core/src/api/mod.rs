//! REST API client module for the Whetstone Education platform.
//!
//! This module provides the `Whetstone` client for authenticating and
//! issuing requests against the Whetstone API.
//!
//! Requests go out on one of two sessions: the machine-to-machine `client`
//! session (OAuth2 client credentials, routed under `/external/`) and the
//! `frontend` session (username/password login, routed at the API root).

pub mod client;
pub mod error;
pub mod transport;

pub use client::{SessionKind, Whetstone};
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport};
