//! Whetstone Core - client library for the Whetstone Education REST API.
//!
//! This crate provides:
//! - `api`: the `Whetstone` client, its two sessions and the HTTP transport
//! - `auth`: access tokens and optional on-disk token storage
//! - `models`: the paginated envelope and per-call option structs
//! - `config`: environment / `.env` driven configuration
//!
//! The client is synchronous and issues one request at a time.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, ReqwestTransport, SessionKind, Transport, Whetstone};
pub use auth::{AccessToken, TokenStore};
pub use config::Config;
pub use models::{
    ClientAuthorization, ClientCredentials, Envelope, FrontendLogin, GetOptions, GetResponse,
    WriteOptions,
};
