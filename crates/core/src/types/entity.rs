//! The contract every backend record fulfils.
//!
//! A single generic gateway and a single generic list view are instantiated
//! per record type through [`Entity`]; there is no per-entity client code.

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::form::{FormBody, FormError, Intent, Upload};
use super::id::KeyParseError;
use super::resource::Resource;
use crate::filter::Searchable;

/// A record type served by one backend resource.
pub trait Entity: DeserializeOwned + Searchable + Clone + fmt::Debug + Send + Sync + 'static {
    /// The resource this record belongs to.
    const RESOURCE: Resource;

    /// Table headers, in the order [`Entity::row`] renders cells.
    const COLUMNS: &'static [&'static str];

    /// The value substituted into `<noun>_info/<key>/`.
    type Key: fmt::Display
        + core::str::FromStr<Err = KeyParseError>
        + Clone
        + fmt::Debug
        + Send
        + Sync
        + 'static;

    /// The editable form of this record.
    type Draft: Draft;

    fn key(&self) -> Self::Key;

    /// Table cells for this record.
    fn row(&self) -> Vec<String>;

    /// Pre-fill a draft for update mode.
    ///
    /// Password fields are left blank so an untouched form keeps the
    /// existing password.
    fn to_draft(&self) -> Self::Draft;
}

/// The form payload for creating or updating an [`Entity`].
pub trait Draft:
    Serialize + DeserializeOwned + Clone + Default + fmt::Debug + Send + Sync + 'static
{
    /// Local checks run before any network call.
    ///
    /// # Errors
    ///
    /// Returns the first [`FormError`] found.
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        Ok(())
    }

    /// Encode the draft as a request body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if a JSON body cannot be built.
    fn to_body(&self, intent: Intent) -> Result<FormBody, serde_json::Error>;

    /// Attach a profile picture. Returns `false` for drafts without one.
    fn attach_picture(&mut self, _upload: Upload) -> bool {
        false
    }
}
