//! Data models for the Etuni API.
//!
//! This module contains the request and response shapes used by the
//! backend endpoints this client consumes. Most responses arrive wrapped in
//! the `{ success, message, data }` envelope.

pub mod admin;
pub mod attendance;
pub mod auth;
pub mod envelope;
pub mod event;
pub mod university;

pub use admin::{AdminUser, DashboardStats, UserUpdate};
pub use attendance::{CheckIn, CodeRequest, ScanRequest, TicketCheck};
pub use auth::{LoginRequest, LoginResponse, UserView};
pub use envelope::ApiEnvelope;
pub use event::Event;
pub use university::University;
