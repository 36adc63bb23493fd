//! Bidii Core - Shared types library.
//!
//! This crate provides the types used across all Bidii School portal components:
//! - `portal` - Session store, authenticated API client, CRUD gateway and views
//! - `cli` - Command-line front end driving the portal views
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Role resolution, navigation gating, list filtering and
//! form validation live here so every front end applies the same rules.
//!
//! # Modules
//!
//! - [`types`] - Records, drafts, session schema, roles and resources
//! - [`access`] - Routes and role-gated menus, panels and actions
//! - [`filter`] - Client-side substring filtering of fetched lists
//! - [`meeting`] - Conferencing meeting requests and schedule validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod filter;
pub mod meeting;
pub mod types;

pub use access::{Action, DashboardPanel, MenuSection, NavItem, Route, menu_for};
pub use filter::{NO_MATCHING_CONTENT, Rows, Searchable, filter_records};
pub use meeting::{MeetingCreated, MeetingRequest, ScheduleError};
pub use types::*;
