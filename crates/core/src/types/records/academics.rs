//! School structure: roles, classes, streams, subjects and the
//! student/class/stream assignments.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::filter::Searchable;
use crate::types::entity::{Draft, Entity};
use crate::types::form::{FormBody, FormError, Intent, require};
use crate::types::id::{ClassId, ClassStreamSubjectId, RoleId, StreamId, SubjectId};
use crate::types::resource::Resource;
use crate::types::role::Role;

/// A backend role row (`admin`, `teacher`, `parent` or `student`).
///
/// Distinct from [`Role`], which is the signed-in user's derived role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDraft {
    pub name: String,
}

impl Draft for RoleDraft {
    /// The backend only accepts the four known role names.
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Name", &self.name)?;
        match self.name.parse::<Role>() {
            Ok(role) if role.is_known() => Ok(()),
            _ => Err(FormError::InvalidField {
                field: "Name",
                reason: "use one of admin, teacher, parent, student".to_owned(),
            }),
        }
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for RoleRecord {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }
}

impl Entity for RoleRecord {
    const RESOURCE: Resource = Resource::Roles;
    const COLUMNS: &'static [&'static str] = &["Name"];
    type Key = RoleId;
    type Draft = RoleDraft;

    fn key(&self) -> RoleId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn to_draft(&self) -> RoleDraft {
        RoleDraft {
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDraft {
    pub name: String,
}

impl Draft for ClassDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Class name", &self.name)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Class {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }
}

impl Entity for Class {
    const RESOURCE: Resource = Resource::Classes;
    const COLUMNS: &'static [&'static str] = &["Name"];
    type Key = ClassId;
    type Draft = ClassDraft;

    fn key(&self) -> ClassId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn to_draft(&self) -> ClassDraft {
        ClassDraft {
            name: self.name.clone(),
        }
    }
}

/// A stream (section) within a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDraft {
    pub name: String,
    pub class_name: String,
}

impl Draft for StreamDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Stream name", &self.name)?;
        require("Class", &self.class_name)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Stream {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.class_name.as_str()),
        ]
    }
}

impl Entity for Stream {
    const RESOURCE: Resource = Resource::Streams;
    const COLUMNS: &'static [&'static str] = &["Class", "Stream"];
    type Key = StreamId;
    type Draft = StreamDraft;

    fn key(&self) -> StreamId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![self.class_name.clone(), self.name.clone()]
    }

    fn to_draft(&self) -> StreamDraft {
        StreamDraft {
            name: self.name.clone(),
            class_name: self.class_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectDraft {
    pub name: String,
}

impl Draft for SubjectDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Subject name", &self.name)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Subject {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }
}

impl Entity for Subject {
    const RESOURCE: Resource = Resource::Subjects;
    const COLUMNS: &'static [&'static str] = &["Name"];
    type Key = SubjectId;
    type Draft = SubjectDraft;

    fn key(&self) -> SubjectId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn to_draft(&self) -> SubjectDraft {
        SubjectDraft {
            name: self.name.clone(),
        }
    }
}

/// Places a student (by code) in a class and stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStreamSubject {
    pub id: ClassStreamSubjectId,
    #[serde(default)]
    pub student_code: String,
    #[serde(default)]
    pub student_class: String,
    #[serde(default)]
    pub student_stream: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStreamSubjectDraft {
    pub student_code: String,
    pub student_class: String,
    pub student_stream: String,
}

impl Draft for ClassStreamSubjectDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Student code", &self.student_code)?;
        require("Class", &self.student_class)?;
        require("Stream", &self.student_stream)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for ClassStreamSubject {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.student_class.as_str()),
            Cow::Borrowed(self.student_code.as_str()),
            Cow::Borrowed(self.student_stream.as_str()),
        ]
    }
}

impl Entity for ClassStreamSubject {
    const RESOURCE: Resource = Resource::ClassStreamSubjects;
    const COLUMNS: &'static [&'static str] = &["Student Code", "Class", "Stream"];
    type Key = ClassStreamSubjectId;
    type Draft = ClassStreamSubjectDraft;

    fn key(&self) -> ClassStreamSubjectId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.student_code.clone(),
            self.student_class.clone(),
            self.student_stream.clone(),
        ]
    }

    fn to_draft(&self) -> ClassStreamSubjectDraft {
        ClassStreamSubjectDraft {
            student_code: self.student_code.clone(),
            student_class: self.student_class.clone(),
            student_stream: self.student_stream.clone(),
        }
    }
}
