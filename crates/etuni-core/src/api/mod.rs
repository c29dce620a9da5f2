//! REST API client module for the Etuni backend.
//!
//! This module provides the `ApiClient` for communicating with the campus
//! events API: the authenticated dispatcher (`auth_fetch`) plus typed
//! wrappers for sign-in, events, ticket check-in, push registration, admin
//! and university endpoints.
//!
//! The API uses JWT bearer token authentication; tokens are held by the
//! `TokenStore` the client is constructed with.

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod push;
pub mod response;
pub mod transport;
pub mod universities;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, TransportError};
pub use response::ApiResponse;
pub use transport::{HttpTransport, OutboundRequest, ReqwestTransport};
