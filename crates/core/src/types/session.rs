//! Session schema shared by the token store and the login flow.
//!
//! The session is persisted as a flat key/value namespace with one fixed key
//! per field. [`SessionKey`] enumerates those keys; [`Session`] is the typed
//! view over a complete set of them.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::id::UserId;
use super::role::{Role, RoleFlags};

/// The fixed keys of the persisted session namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    UserId,
    UserEmail,
    FirstLetter,
    IsAdmin,
    IsTeacher,
    IsStudent,
    IsParent,
    TeacherProfilePicture,
    ParentProfilePicture,
}

impl SessionKey {
    /// Every key, in the order the login flow writes them.
    pub const ALL: [Self; 11] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::UserId,
        Self::UserEmail,
        Self::FirstLetter,
        Self::IsAdmin,
        Self::IsTeacher,
        Self::IsStudent,
        Self::IsParent,
        Self::TeacherProfilePicture,
        Self::ParentProfilePicture,
    ];

    /// Storage key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::UserId => "user_id",
            Self::UserEmail => "user_email",
            Self::FirstLetter => "first_letter",
            Self::IsAdmin => "is_admin",
            Self::IsTeacher => "is_teacher",
            Self::IsStudent => "is_student",
            Self::IsParent => "is_parent",
            Self::TeacherProfilePicture => "teacher_profile_picture",
            Self::ParentProfilePicture => "parent_profile_picture",
        }
    }

    /// Look up a key by its storage name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Returns `true` for the four role flag keys.
    #[must_use]
    pub const fn is_flag(self) -> bool {
        matches!(
            self,
            Self::IsAdmin | Self::IsTeacher | Self::IsStudent | Self::IsParent
        )
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful response body of `user_login/`.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: UserId,
    pub user_email: String,
    pub first_letter: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_teacher: bool,
    #[serde(default)]
    pub is_student: bool,
    #[serde(default)]
    pub is_parent: bool,
    #[serde(default)]
    pub teacher_profile_picture: Option<String>,
    #[serde(default)]
    pub parent_profile_picture: Option<String>,
}

/// An authenticated session.
///
/// Tokens are held as secrets; `Debug` never prints them.
#[derive(Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub user_id: UserId,
    pub user_email: String,
    pub first_letter: String,
    pub flags: RoleFlags,
    pub teacher_profile_picture: Option<String>,
    pub parent_profile_picture: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("user_email", &self.user_email)
            .field("first_letter", &self.first_letter)
            .field("flags", &self.flags)
            .field("teacher_profile_picture", &self.teacher_profile_picture)
            .field("parent_profile_picture", &self.parent_profile_picture)
            .finish()
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            access_token: SecretString::from(response.access_token),
            refresh_token: SecretString::from(response.refresh_token),
            user_id: response.user_id,
            user_email: response.user_email,
            first_letter: response.first_letter,
            flags: RoleFlags {
                is_admin: response.is_admin,
                is_teacher: response.is_teacher,
                is_student: response.is_student,
                is_parent: response.is_parent,
            },
            teacher_profile_picture: response.teacher_profile_picture,
            parent_profile_picture: response.parent_profile_picture,
        }
    }
}

impl Session {
    /// Role derived from the session flags.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_flags(self.flags)
    }

    /// The value written under each key, in [`SessionKey::ALL`] order.
    ///
    /// Absent profile pictures are written as empty strings so that a saved
    /// session always occupies exactly the eleven keys.
    #[must_use]
    pub fn entries(&self) -> Vec<(SessionKey, String)> {
        SessionKey::ALL
            .into_iter()
            .map(|key| {
                let value = match key {
                    SessionKey::AccessToken => self.access_token.expose_secret().to_owned(),
                    SessionKey::RefreshToken => self.refresh_token.expose_secret().to_owned(),
                    SessionKey::UserId => self.user_id.to_string(),
                    SessionKey::UserEmail => self.user_email.clone(),
                    SessionKey::FirstLetter => self.first_letter.clone(),
                    SessionKey::IsAdmin => self.flags.is_admin.to_string(),
                    SessionKey::IsTeacher => self.flags.is_teacher.to_string(),
                    SessionKey::IsStudent => self.flags.is_student.to_string(),
                    SessionKey::IsParent => self.flags.is_parent.to_string(),
                    SessionKey::TeacherProfilePicture => {
                        self.teacher_profile_picture.clone().unwrap_or_default()
                    }
                    SessionKey::ParentProfilePicture => {
                        self.parent_profile_picture.clone().unwrap_or_default()
                    }
                };
                (key, value)
            })
            .collect()
    }

    /// Rebuild a session from stored values.
    ///
    /// Returns `None` unless both tokens and a parseable user ID are present.
    /// Flags read as `true` only when stored as the literal `"true"`.
    pub fn from_lookup(mut lookup: impl FnMut(SessionKey) -> Option<String>) -> Option<Self> {
        let access_token = lookup(SessionKey::AccessToken).filter(|v| !v.is_empty())?;
        let refresh_token = lookup(SessionKey::RefreshToken).filter(|v| !v.is_empty())?;
        let user_id = lookup(SessionKey::UserId)?.parse().ok()?;
        let mut flag = |key| lookup(key).is_some_and(|v| v == "true");
        let flags = RoleFlags {
            is_admin: flag(SessionKey::IsAdmin),
            is_teacher: flag(SessionKey::IsTeacher),
            is_student: flag(SessionKey::IsStudent),
            is_parent: flag(SessionKey::IsParent),
        };
        let mut text = |key| lookup(key).filter(|v| !v.is_empty());

        Some(Self {
            access_token: SecretString::from(access_token),
            refresh_token: SecretString::from(refresh_token),
            user_id,
            user_email: text(SessionKey::UserEmail).unwrap_or_default(),
            first_letter: text(SessionKey::FirstLetter).unwrap_or_default(),
            flags,
            teacher_profile_picture: text(SessionKey::TeacherProfilePicture),
            parent_profile_picture: text(SessionKey::ParentProfilePicture),
        })
    }
}

/// Who is looking at the screen.
///
/// Computed once when the session is loaded and passed to every view that
/// gates on role, instead of each view re-reading the flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Viewer {
    pub role: Role,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub first_letter: Option<String>,
}

impl Viewer {
    /// A viewer with no session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build the viewer context for a loaded session.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            role: session.role(),
            user_id: Some(session.user_id),
            email: Some(session.user_email.clone()),
            first_letter: Some(session.first_letter.clone()),
        }
    }

    /// Returns `true` if the viewer has a session.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn login_json() -> serde_json::Value {
        serde_json::json!({
            "access_token": "acc",
            "refresh_token": "ref",
            "user_id": 12,
            "user_email": "mwalimu@bidii.ac.ke",
            "first_letter": "M",
            "is_admin": false,
            "is_teacher": true,
            "is_student": false,
            "is_parent": false,
            "teacher_profile_picture": "/media/teacher_profile/m.png",
            "parent_profile_picture": null
        })
    }

    #[test]
    fn test_login_response_converts_to_teacher_session() {
        let response: LoginResponse = serde_json::from_value(login_json()).expect("valid body");
        let session = Session::from(response);
        assert_eq!(session.role(), Role::Teacher);
        assert_eq!(session.user_id, UserId::new(12));
        assert!(session.parent_profile_picture.is_none());
    }

    #[test]
    fn test_entries_cover_every_key_once() {
        let response: LoginResponse = serde_json::from_value(login_json()).expect("valid body");
        let entries = Session::from(response).entries();
        let keys: Vec<SessionKey> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, SessionKey::ALL.to_vec());
    }

    #[test]
    fn test_lookup_rebuilds_saved_session() {
        let response: LoginResponse = serde_json::from_value(login_json()).expect("valid body");
        let stored: HashMap<SessionKey, String> =
            Session::from(response).entries().into_iter().collect();

        let session = Session::from_lookup(|key| stored.get(&key).cloned()).expect("complete");
        assert_eq!(session.access_token.expose_secret(), "acc");
        assert_eq!(session.role(), Role::Teacher);
        assert_eq!(
            session.teacher_profile_picture.as_deref(),
            Some("/media/teacher_profile/m.png")
        );
        assert!(session.parent_profile_picture.is_none());
    }

    #[test]
    fn test_lookup_without_tokens_is_none() {
        assert!(Session::from_lookup(|_| None).is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let response: LoginResponse = serde_json::from_value(login_json()).expect("valid body");
        let rendered = format!("{:?}", Session::from(response));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("acc\""));
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in SessionKey::ALL {
            assert_eq!(SessionKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(SessionKey::from_name("theme"), None);
    }
}
