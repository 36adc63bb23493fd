//! Core types for the Bidii School portal.
//!
//! Typed keys, the session schema, backend records and their drafts.

pub mod entity;
pub mod form;
pub mod id;
pub mod records;
pub mod resource;
pub mod role;
pub mod session;

pub use entity::{Draft, Entity};
pub use form::{
    Credentials, FormBody, FormError, FormField, Intent, Upload, check_email, check_passwords,
    require,
};
pub use id::*;
pub use records::*;
pub use resource::Resource;
pub use role::{Role, RoleFlags};
pub use session::{LoginResponse, Session, SessionKey, Viewer};
