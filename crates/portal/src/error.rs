//! Error types for the portal client.
//!
//! [`ClientError`] is what the authenticated client raises. [`ApiError`] is
//! what every gateway operation returns: whatever went wrong, it carries a
//! non-empty message fit to show the user.

use bidii_core::{FormError, Resource, ScheduleError};
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;
use crate::transport::TransportError;

/// Shown when no better message is available for a failure outside the API.
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong";

/// Shown when a refresh fails and the session is purged.
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Errors from the authenticated client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a status code.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session store failed.
    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    /// The access token was rejected and could not be refreshed.
    #[error("Session expired. Please log in again.")]
    SessionExpired,
}

/// Category of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The backend answered with a non-success status.
    Rejected(u16),
    /// Local validation failed; nothing was sent.
    Invalid,
    /// The request never produced a status code.
    Transport,
    /// A success response could not be decoded.
    Decode,
    /// The session expired and has been cleared.
    SessionExpired,
    /// The session store failed.
    Store,
}

/// The `{error}` result shape of every gateway operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    /// Build from an error response, falling back to `fallback` when the body
    /// carries no usable message.
    #[must_use]
    pub fn rejected(status: u16, body: &[u8], fallback: &str) -> Self {
        Self {
            kind: ApiErrorKind::Rejected(status),
            message: error_message(body).unwrap_or_else(|| fallback.to_owned()),
        }
    }

    #[must_use]
    pub fn decode(fallback: &str) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: fallback.to_owned(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            ApiErrorKind::Rejected(status) => Some(status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self.kind, ApiErrorKind::SessionExpired)
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(_) => Self {
                kind: ApiErrorKind::Transport,
                message: SOMETHING_WENT_WRONG.to_owned(),
            },
            ClientError::Store(_) => Self {
                kind: ApiErrorKind::Store,
                message: SOMETHING_WENT_WRONG.to_owned(),
            },
            ClientError::SessionExpired => Self {
                kind: ApiErrorKind::SessionExpired,
                message: SESSION_EXPIRED.to_owned(),
            },
        }
    }
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        Self {
            kind: ApiErrorKind::Invalid,
            message: err.to_string(),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        Self {
            kind: ApiErrorKind::Invalid,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ClientError::from(err).into()
    }
}

/// A gateway operation, used to pick the fallback message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Generic message for when the backend gives no reason.
    #[must_use]
    pub fn fallback(self, resource: Resource) -> String {
        let label = resource.label();
        match self {
            Self::List => format!("Error fetching {}", resource.slug().replace('-', " ")),
            Self::Get => format!("Error retrieving {label}"),
            Self::Create => format!("Error creating {label}"),
            Self::Update => format!("Error updating {label}"),
            Self::Delete => format!("Error deleting {label}"),
        }
    }
}

/// Pull a displayable message out of an error body.
///
/// Understands `{"error": ..}`, `{"message": ..}`, `{"detail": ..}`, a bare
/// JSON string, and field-error maps such as `{"email": ["already exists"]}`,
/// which flatten to `email: already exists`. Returns `None` when nothing
/// non-empty can be found.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let mut parts = Vec::new();
    match &value {
        Value::Object(map) => {
            let preferred = ["error", "message", "detail"]
                .into_iter()
                .filter_map(|key| map.get(key))
                .find_map(|inner| {
                    let mut found = Vec::new();
                    collect(None, inner, &mut found);
                    (!found.is_empty()).then_some(found)
                });
            match preferred {
                Some(found) => parts = found,
                None => collect(None, &value, &mut parts),
            }
        }
        other => collect(None, other, &mut parts),
    }
    let message = parts.join("; ");
    if message.trim().is_empty() {
        None
    } else {
        Some(message)
    }
}

fn collect(field: Option<&str>, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) if !text.is_empty() => out.push(match field {
            Some(field) if field != "non_field_errors" => format!("{field}: {text}"),
            _ => text.clone(),
        }),
        Value::Array(items) => {
            for item in items {
                collect(field, item, out);
            }
        }
        Value::Object(map) => {
            for (key, inner) in map {
                let path = field.map_or_else(|| key.clone(), |prefix| format!("{prefix}.{key}"));
                collect(Some(&path), inner, out);
            }
        }
        _ => {}
    }
}
