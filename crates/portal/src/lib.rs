//! Bidii Portal - client library for the Bidii School backend.
//!
//! Everything a front end needs to talk to the portal API:
//! - [`store`] - The persisted session namespace (memory or file backed)
//! - [`client`] - Authenticated client with refresh-on-401
//! - [`auth`] - Login and logout
//! - [`gateway`] - Generic CRUD over every resource, totals, feeds, meetings
//! - [`views`] - List, form and dashboard screen state
//!
//! # Authentication
//!
//! The login endpoint returns an access and a refresh token, stored with the
//! rest of the session. Every request carries the access token; a `401` is
//! answered with one refresh and one replay. A failed refresh clears the
//! session and redirects to the login screen through the [`Navigator`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod navigator;
pub mod store;
pub mod transport;
pub mod views;

#[cfg(test)]
mod testing;

pub use client::PortalClient;
pub use config::{ConfigError, PortalConfig};
pub use error::{ApiError, ApiErrorKind, ClientError};
pub use gateway::Saved;
pub use navigator::{Navigator, RecordingNavigator, TracingNavigator};
pub use store::{FileStore, MemoryStore, SessionState, SessionStore, StoreError};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport, TransportError};
