//! REST client for the marketplace API.
//!
//! [`ApiClient`] wraps `reqwest` with bearer auth, per-request deadlines,
//! fixed-delay retries and session handling on 401. [`handle_error`] turns
//! any [`ClientError`] into a display message and a retry hint.

pub mod api;
pub mod error;

pub use api::{ApiClient, DEFAULT_API_URL, SIGNIN_PATH};
pub use error::{handle_error, ClientError, ErrorKind, HandledError};
