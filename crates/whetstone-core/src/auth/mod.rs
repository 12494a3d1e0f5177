//! Authentication module for Whetstone access tokens.
//!
//! This module provides:
//! - `AccessToken`: bearer token with expiry, as issued by the token endpoints
//! - `TokenStore`: optional JSON file for callers that persist tokens between runs

pub mod store;
pub mod token;

pub use store::TokenStore;
pub use token::AccessToken;
