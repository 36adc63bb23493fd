//! Newtype keys for type-safe record references.
//!
//! Use the `define_id!` macro to create key wrappers that prevent accidentally
//! passing a class ID where a stream ID is expected.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a record key cannot be parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {input:?}")]
pub struct KeyParseError {
    /// Name of the key type being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub input: String,
}

/// Macro to define a numeric record key.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `new()` / `as_i64()` accessors, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use bidii_core::define_id;
/// define_id!(ClassId);
/// define_id!(StreamId);
///
/// let class_id: ClassId = "7".parse().unwrap();
/// assert_eq!(class_id.as_i64(), 7);
///
/// // These are different types, so this won't compile:
/// // let _: StreamId = class_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new key from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::KeyParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| $crate::types::id::KeyParseError {
                        kind: stringify!($name),
                        input: s.to_owned(),
                    })
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(UserId);
define_id!(AdminId);
define_id!(TeacherId);
define_id!(ParentId);
define_id!(StudentId);
define_id!(RoleId);
define_id!(ClassId);
define_id!(StreamId);
define_id!(SubjectId);
define_id!(ExamId);
define_id!(CatId);
define_id!(CatGradeId);
define_id!(ExamGradeId);
define_id!(CatAndExamId);
define_id!(ClassStreamSubjectId);
define_id!(AnnouncementId);

/// Parent records are addressed by their parent code, not a numeric ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentCode(String);

impl ParentCode {
    /// Create a parent code from any string-like value.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ParentCode {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.is_empty() || code.contains('/') {
            return Err(KeyParseError {
                kind: "ParentCode",
                input: s.to_owned(),
            });
        }
        Ok(Self(code.to_owned()))
    }
}
