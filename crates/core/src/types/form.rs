//! Form payloads and local validation.
//!
//! Drafts are turned into a transport-neutral [`FormBody`]; the portal crate
//! maps it onto JSON or multipart requests.

use core::fmt;

use serde::Serialize;
use thiserror::Error;

/// Validation failures caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Password and confirmation differ.
    #[error("Password Mismatch!")]
    PasswordMismatch,

    /// The form requires a signed-in user.
    #[error("Login Required!")]
    LoginRequired,

    /// A required field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field value is malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Whether a draft is being submitted as a new record or as an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Update,
}

/// Reject mismatched password confirmation.
///
/// Both empty is accepted: update forms leave the password blank to keep it.
///
/// # Errors
///
/// Returns [`FormError::PasswordMismatch`] if the two values differ.
pub fn check_passwords(password: &str, confirm_password: &str) -> Result<(), FormError> {
    if password == confirm_password {
        Ok(())
    } else {
        Err(FormError::PasswordMismatch)
    }
}

/// Reject an empty (or whitespace-only) required field.
///
/// # Errors
///
/// Returns [`FormError::MissingField`] naming the field.
pub fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Light structural check for email fields: something on both sides of one `@`.
///
/// # Errors
///
/// Returns [`FormError::InvalidField`] describing the problem.
pub fn check_email(field: &'static str, value: &str) -> Result<(), FormError> {
    let invalid = |reason: &str| FormError::InvalidField {
        field,
        reason: reason.to_owned(),
    };
    let (local, domain) = value.split_once('@').ok_or_else(|| invalid("missing @"))?;
    if local.is_empty() {
        return Err(invalid("empty local part"));
    }
    if domain.is_empty() || domain.contains('@') {
        return Err(invalid("malformed domain"));
    }
    Ok(())
}

/// A file attached to a multipart form.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: Upload },
}

impl FormField {
    #[must_use]
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request body produced from a draft.
///
/// Kept as plain data so the same body can be sent again when a request is
/// replayed after a token refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum FormBody {
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

impl FormBody {
    /// Serialize a draft as a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the draft cannot be represented.
    pub fn json(draft: &impl Serialize) -> Result<Self, serde_json::Error> {
        serde_json::to_value(draft).map(Self::Json)
    }

    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Email and password typed into the login form.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Validate and build login credentials.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::MissingField`] if either field is blank.
    pub fn new(email: &str, password: &str) -> Result<Self, FormError> {
        require("Email", email)?;
        require("Password", password)?;
        Ok(Self {
            email: email.trim().to_owned(),
            password: password.to_owned(),
        })
    }
}
