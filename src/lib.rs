//! `siputzx-http` is an async HTTP client for the Siputzx API.
//!
//! Every call goes through one resilient request layer:
//! - [`SiputzxClient::request`] decodes a JSON body
//! - [`SiputzxClient::request_binary`] returns raw image/octet-stream bytes
//!
//! Server errors, timeouts and transport failures are retried within a bounded
//! attempt budget; client errors (4xx) fail on the first attempt.

mod client;
mod decode;
mod error;
mod options;
mod params;
mod types;

pub mod retry;

pub use client::{SiputzxClient, DEFAULT_BASE_URL};
pub use error::SiputzxError;
pub use options::ClientOptions;
pub use params::{Body, FetchRequest, Method, Query};
pub use types::ApiResponse;

pub type Result<T> = std::result::Result<T, SiputzxError>;
