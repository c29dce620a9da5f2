//! Session management for the Etuni API.
//!
//! This module provides:
//! - `TokenStore`: write-through cache of the bearer token over durable storage
//! - `SessionEvent`: notifications when a session starts, ends, or is rejected
//! - Token normalization helpers shared by login and storage paths
//!
//! There is no separate session object: a session exists exactly when the
//! token store holds a token.

pub mod events;
pub mod store;
pub mod token;

pub use events::SessionEvent;
pub use store::{SessionProfile, TokenStore};
pub use token::normalize_token;
