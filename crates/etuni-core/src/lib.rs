//! Core library for etuni.
//!
//! Provides the session gateway used by every Etuni client:
//! - `auth`: the `TokenStore` that owns the bearer token and its lifecycle
//! - `api`: the `ApiClient` that attaches the token to requests and ends the
//!   session when the backend rejects it
//! - `storage`: durable key-value backends for the token store
//! - `config`: client configuration on disk

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResponse, RequestOptions};
pub use auth::{SessionEvent, SessionProfile, TokenStore};
pub use config::Config;
pub use storage::KeyValueStore;
