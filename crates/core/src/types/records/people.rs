//! Account-backed records: admins, teachers, parents and students.
//!
//! Teachers, parents and students wrap a nested user account; admins are the
//! account itself. Teacher and parent drafts carry an optional profile picture
//! and are therefore submitted as multipart forms with dotted `user.*` names.

use core::fmt;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::filter::Searchable;
use crate::types::entity::{Draft, Entity};
use crate::types::form::{
    FormBody, FormError, FormField, Intent, Upload, check_email, check_passwords, require,
};
use crate::types::id::{AdminId, ParentCode, ParentId, StudentId, TeacherId};
use crate::types::resource::Resource;

/// The nested `user` object of teacher, parent and student records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl UserProfile {
    /// "First Last", the way tables display and search it.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable account fields shared by every registration form.
///
/// Empty password fields are left out of the payload so that an update keeps
/// the stored password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountDraft {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub confirm_password: String,
}

impl fmt::Debug for AccountDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDraft")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("confirm_password", &"[REDACTED]")
            .finish()
    }
}

impl AccountDraft {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
            ..Self::default()
        }
    }

    fn check(&self, intent: Intent) -> Result<(), FormError> {
        require("First name", &self.first_name)?;
        require("Last name", &self.last_name)?;
        require("Username", &self.username)?;
        require("Email", &self.email)?;
        check_email("Email", &self.email)?;
        if intent == Intent::Create {
            require("Password", &self.password)?;
        }
        check_passwords(&self.password, &self.confirm_password)
    }

    /// Multipart parts under the `user.` prefix; blank values are skipped.
    fn parts(&self, role_name: &str, intent: Intent) -> Vec<FormField> {
        let mut parts: Vec<FormField> = [
            ("user.first_name", &self.first_name),
            ("user.last_name", &self.last_name),
            ("user.username", &self.username),
            ("user.email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| FormField::text(name, value.as_str()))
        .collect();

        if !self.password.is_empty() {
            parts.push(FormField::text("user.password", self.password.as_str()));
            parts.push(FormField::text(
                "user.confirm_password",
                self.confirm_password.as_str(),
            ));
        }
        if intent == Intent::Create {
            parts.push(FormField::text("user.role.name", role_name));
        }
        parts
    }
}

impl Draft for AccountDraft {
    fn validate(&self, intent: Intent) -> Result<(), FormError> {
        self.check(intent)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: AdminId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl Searchable for Admin {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.first_name.as_str()),
            Cow::Borrowed(self.last_name.as_str()),
            Cow::Borrowed(self.username.as_str()),
            Cow::Borrowed(self.email.as_str()),
        ]
    }
}

impl Entity for Admin {
    const RESOURCE: Resource = Resource::Admins;
    const COLUMNS: &'static [&'static str] = &["First Name", "Last Name", "Username", "Email"];
    type Key = AdminId;
    type Draft = AccountDraft;

    fn key(&self) -> AdminId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.username.clone(),
            self.email.clone(),
        ]
    }

    fn to_draft(&self) -> AccountDraft {
        AccountDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            ..AccountDraft::default()
        }
    }
}

fn contact_parts(
    user: &AccountDraft,
    phone: &str,
    address: &str,
    picture: Option<&Upload>,
    role_name: &str,
    intent: Intent,
) -> FormBody {
    let mut parts = user.parts(role_name, intent);
    if !phone.is_empty() {
        parts.push(FormField::text("phone", phone));
    }
    if !address.is_empty() {
        parts.push(FormField::text("address", address));
    }
    if let Some(upload) = picture {
        parts.push(FormField::File {
            name: "profile_picture".to_owned(),
            upload: upload.clone(),
        });
    }
    FormBody::Multipart(parts)
}

fn check_contact(user: &AccountDraft, phone: &str, intent: Intent) -> Result<(), FormError> {
    user.check(intent)?;
    require("Phone", phone)?;
    if phone.len() != 10 || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormError::InvalidField {
            field: "Phone",
            reason: "expected 10 digits".to_owned(),
        });
    }
    Ok(())
}

/// A teacher and their account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub teacher_code: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Teacher registration or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeacherDraft {
    pub user: AccountDraft,
    pub phone: String,
    pub address: String,
    #[serde(skip)]
    pub profile_picture: Option<Upload>,
}

impl Draft for TeacherDraft {
    fn validate(&self, intent: Intent) -> Result<(), FormError> {
        check_contact(&self.user, &self.phone, intent)
    }

    fn to_body(&self, intent: Intent) -> Result<FormBody, serde_json::Error> {
        Ok(contact_parts(
            &self.user,
            &self.phone,
            &self.address,
            self.profile_picture.as_ref(),
            "teacher",
            intent,
        ))
    }

    fn attach_picture(&mut self, upload: Upload) -> bool {
        self.profile_picture = Some(upload);
        true
    }
}

impl Searchable for Teacher {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.user.full_name()),
            Cow::Borrowed(self.user.username.as_str()),
            Cow::Borrowed(self.user.email.as_str()),
            Cow::Borrowed(self.teacher_code.as_str()),
        ]
    }
}

impl Entity for Teacher {
    const RESOURCE: Resource = Resource::Teachers;
    const COLUMNS: &'static [&'static str] = &["Name", "Username", "Email", "Phone", "Code"];
    type Key = TeacherId;
    type Draft = TeacherDraft;

    fn key(&self) -> TeacherId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.user.full_name(),
            self.user.username.clone(),
            self.user.email.clone(),
            self.phone.clone(),
            self.teacher_code.clone(),
        ]
    }

    fn to_draft(&self) -> TeacherDraft {
        TeacherDraft {
            user: AccountDraft::from_profile(&self.user),
            phone: self.phone.clone(),
            address: self.address.clone(),
            profile_picture: None,
        }
    }
}

/// A parent (guardian) and their account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub id: ParentId,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub parent_code: ParentCode,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

/// Parent registration or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentDraft {
    pub user: AccountDraft,
    pub phone: String,
    pub address: String,
    #[serde(skip)]
    pub profile_picture: Option<Upload>,
}

impl Draft for ParentDraft {
    fn validate(&self, intent: Intent) -> Result<(), FormError> {
        check_contact(&self.user, &self.phone, intent)
    }

    fn to_body(&self, intent: Intent) -> Result<FormBody, serde_json::Error> {
        Ok(contact_parts(
            &self.user,
            &self.phone,
            &self.address,
            self.profile_picture.as_ref(),
            "parent",
            intent,
        ))
    }

    fn attach_picture(&mut self, upload: Upload) -> bool {
        self.profile_picture = Some(upload);
        true
    }
}

impl Searchable for Parent {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.user.full_name()),
            Cow::Borrowed(self.user.username.as_str()),
            Cow::Borrowed(self.user.email.as_str()),
            Cow::Borrowed(self.parent_code.as_str()),
        ]
    }
}

impl Entity for Parent {
    const RESOURCE: Resource = Resource::Parents;
    const COLUMNS: &'static [&'static str] = &["Name", "Username", "Email", "Phone", "Code"];
    type Key = ParentCode;
    type Draft = ParentDraft;

    fn key(&self) -> ParentCode {
        self.parent_code.clone()
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.user.full_name(),
            self.user.username.clone(),
            self.user.email.clone(),
            self.phone.clone(),
            self.parent_code.to_string(),
        ]
    }

    fn to_draft(&self) -> ParentDraft {
        ParentDraft {
            user: AccountDraft::from_profile(&self.user),
            phone: self.phone.clone(),
            address: self.address.clone(),
            profile_picture: None,
        }
    }
}

/// A student, linked to a parent by email and parent code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    #[serde(default)]
    pub user: UserProfile,
    #[serde(default)]
    pub parent_email: String,
    #[serde(default)]
    pub parent_code: String,
}

/// Student registration or edit form, sent as JSON with a nested `user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    pub user: AccountDraft,
    pub parent_email: String,
    pub parent_code: String,
}

impl Draft for StudentDraft {
    fn validate(&self, intent: Intent) -> Result<(), FormError> {
        self.user.check(intent)?;
        if !self.parent_email.is_empty() {
            check_email("Parent email", &self.parent_email)?;
        }
        Ok(())
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Student {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.user.full_name()),
            Cow::Borrowed(self.user.username.as_str()),
            Cow::Borrowed(self.user.email.as_str()),
        ]
    }
}

impl Entity for Student {
    const RESOURCE: Resource = Resource::Students;
    const COLUMNS: &'static [&'static str] =
        &["Name", "Username", "Email", "Parent Email", "Parent Code"];
    type Key = StudentId;
    type Draft = StudentDraft;

    fn key(&self) -> StudentId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.user.full_name(),
            self.user.username.clone(),
            self.user.email.clone(),
            self.parent_email.clone(),
            self.parent_code.clone(),
        ]
    }

    fn to_draft(&self) -> StudentDraft {
        StudentDraft {
            user: AccountDraft::from_profile(&self.user),
            parent_email: self.parent_email.clone(),
            parent_code: self.parent_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(password: &str, confirm: &str) -> AccountDraft {
        AccountDraft {
            first_name: "Amina".to_owned(),
            last_name: "Otieno".to_owned(),
            username: "amina".to_owned(),
            email: "amina@bidii.ac.ke".to_owned(),
            password: password.to_owned(),
            confirm_password: confirm.to_owned(),
        }
    }

    #[test]
    fn test_mismatched_passwords_rejected_locally() {
        let draft = account("pass1234", "pass1235");
        assert_eq!(
            draft.validate(Intent::Create),
            Err(FormError::PasswordMismatch)
        );
    }

    #[test]
    fn test_update_may_leave_password_blank() {
        let draft = account("", "");
        assert!(draft.validate(Intent::Update).is_ok());
        assert_eq!(
            draft.validate(Intent::Create),
            Err(FormError::MissingField("Password"))
        );

        let FormBody::Json(body) = draft.to_body(Intent::Update).expect("json") else {
            panic!("admin drafts are JSON");
        };
        assert!(body.get("password").is_none());
        assert_eq!(body["email"], "amina@bidii.ac.ke");
    }

    #[test]
    fn test_teacher_draft_is_multipart_with_role_on_create() {
        let mut draft = TeacherDraft {
            user: account("pass1234", "pass1234"),
            phone: "0712345678".to_owned(),
            address: "Nakuru".to_owned(),
            profile_picture: None,
        };
        assert!(draft.attach_picture(Upload {
            file_name: "me.png".to_owned(),
            content_type: "image/png".to_owned(),
            bytes: vec![0; 4],
        }));

        let body = draft.to_body(Intent::Create).expect("body");
        let FormBody::Multipart(parts) = body else {
            panic!("teacher drafts are multipart");
        };
        let names: Vec<&str> = parts.iter().map(FormField::name).collect();
        assert!(names.contains(&"user.first_name"));
        assert!(names.contains(&"user.role.name"));
        assert!(names.contains(&"profile_picture"));

        let FormBody::Multipart(parts) = draft.to_body(Intent::Update).expect("body") else {
            panic!("teacher drafts are multipart");
        };
        assert!(parts.iter().all(|part| part.name() != "user.role.name"));
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        let draft = ParentDraft {
            user: account("pass1234", "pass1234"),
            phone: "07123".to_owned(),
            ..ParentDraft::default()
        };
        assert!(matches!(
            draft.validate(Intent::Create),
            Err(FormError::InvalidField { field: "Phone", .. })
        ));
    }

    #[test]
    fn test_student_deserializes_and_searches_full_name() {
        let student: Student = serde_json::from_value(serde_json::json!({
            "id": 4,
            "user": {"first_name": "Baraka", "last_name": "Mwangi", "username": "bm", "email": "b@x.io"},
            "parent_email": "p@x.io",
            "parent_code": "P-001"
        }))
        .expect("student");
        assert!(student.matches("baraka mw"));
        assert!(!student.matches("p-001"));
        assert_eq!(student.key(), StudentId::new(4));
    }

    #[test]
    fn test_parent_keyed_by_code() {
        let parent: Parent = serde_json::from_value(serde_json::json!({
            "id": 2,
            "user": {"first_name": "Zawadi", "last_name": "K", "username": "zk", "email": "z@x.io"},
            "phone": "0711111111",
            "address": "Kisumu",
            "parent_code": "P-002",
            "profile_picture": null
        }))
        .expect("parent");
        assert_eq!(Resource::Parents.item_path(&parent.key()), "parent_info/P-002/");
        assert!(parent.matches("p-002"));
    }

    #[test]
    fn test_draft_debug_hides_passwords() {
        let rendered = format!("{:?}", account("hunter22", "hunter22"));
        assert!(!rendered.contains("hunter22"));
    }
}
