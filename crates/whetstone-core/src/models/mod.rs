//! Data models for Whetstone requests and responses.
//!
//! - `Envelope`, `GetResponse`: paginated list responses
//! - `GetOptions`, `WriteOptions`: per-call request options
//! - `ClientAuthorization`, `ClientCredentials`, `FrontendLogin`: auth inputs

pub mod envelope;
pub mod options;

pub use envelope::{Envelope, GetResponse};
pub use options::{ClientAuthorization, ClientCredentials, FrontendLogin, GetOptions, WriteOptions};
