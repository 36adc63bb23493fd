//! Backend resources and their endpoint conventions.
//!
//! Item endpoints follow `<noun>_info/<key>/` (get, PATCH update, delete) and
//! creation goes to `create_<noun>/`. Listing reuses the creation endpoint,
//! except for the three account-backed resources which have dedicated
//! `fetch_all_<plural>/` endpoints.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A CRUD resource exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Admins,
    Teachers,
    Parents,
    Students,
    Roles,
    Classes,
    Streams,
    Subjects,
    Exams,
    Cats,
    CatGrades,
    ExamGrades,
    CatsAndExams,
    ClassStreamSubjects,
    Announcements,
}

impl Resource {
    pub const ALL: [Self; 15] = [
        Self::Admins,
        Self::Teachers,
        Self::Parents,
        Self::Students,
        Self::Roles,
        Self::Classes,
        Self::Streams,
        Self::Subjects,
        Self::Exams,
        Self::Cats,
        Self::CatGrades,
        Self::ExamGrades,
        Self::CatsAndExams,
        Self::ClassStreamSubjects,
        Self::Announcements,
    ];

    /// Backend noun used to build endpoint paths.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Admins => "admin",
            Self::Teachers => "teacher",
            Self::Parents => "parent",
            Self::Students => "student",
            Self::Roles => "role",
            Self::Classes => "class",
            Self::Streams => "stream",
            Self::Subjects => "subject",
            Self::Exams => "exam",
            Self::Cats => "cat",
            Self::CatGrades => "cat_grade",
            Self::ExamGrades => "exam_grade",
            Self::CatsAndExams => "exam_and_cat",
            Self::ClassStreamSubjects => "class_stream_subject",
            Self::Announcements => "announcement",
        }
    }

    /// Kebab-case name used on the command line and in routes.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Admins => "admins",
            Self::Teachers => "teachers",
            Self::Parents => "parents",
            Self::Students => "students",
            Self::Roles => "roles",
            Self::Classes => "classes",
            Self::Streams => "streams",
            Self::Subjects => "subjects",
            Self::Exams => "exams",
            Self::Cats => "cats",
            Self::CatGrades => "cat-grades",
            Self::ExamGrades => "exam-grades",
            Self::CatsAndExams => "cats-and-exams",
            Self::ClassStreamSubjects => "class-subjects",
            Self::Announcements => "announcements",
        }
    }

    /// Human-readable singular label ("Cat Grade").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admins => "Admin",
            Self::Teachers => "Teacher",
            Self::Parents => "Parent",
            Self::Students => "Student",
            Self::Roles => "Role",
            Self::Classes => "Class",
            Self::Streams => "Stream",
            Self::Subjects => "Subject",
            Self::Exams => "Exam",
            Self::Cats => "Cat",
            Self::CatGrades => "Cat Grade",
            Self::ExamGrades => "Exam Grade",
            Self::CatsAndExams => "Cat And Exam",
            Self::ClassStreamSubjects => "Class Subject",
            Self::Announcements => "Announcement",
        }
    }

    /// Endpoint for `POST` (create).
    #[must_use]
    pub fn create_path(self) -> String {
        format!("create_{}/", self.noun())
    }

    /// Endpoint for `GET` (list).
    #[must_use]
    pub fn list_path(self) -> String {
        match self {
            Self::Teachers | Self::Parents | Self::Students => {
                format!("fetch_all_{}s/", self.noun())
            }
            _ => self.create_path(),
        }
    }

    /// Endpoint for a single record (get, update, delete).
    #[must_use]
    pub fn item_path(self, key: &impl fmt::Display) -> String {
        format!("{}_info/{key}/", self.noun())
    }

    /// Account-backed resources double as registration forms, which may be
    /// submitted before anyone is signed in.
    #[must_use]
    pub const fn is_registration(self) -> bool {
        matches!(
            self,
            Self::Admins | Self::Teachers | Self::Parents | Self::Students
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|resource| resource.slug() == s)
            .ok_or_else(|| format!("unknown resource: {s}"))
    }
}
