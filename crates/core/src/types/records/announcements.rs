//! Announcements, the per-audience feeds and dashboard totals.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::filter::Searchable;
use crate::types::entity::{Draft, Entity};
use crate::types::form::{FormBody, FormError, Intent, require};
use crate::types::id::AnnouncementId;
use crate::types::resource::Resource;

/// A school announcement and the audiences it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Announcement {
    pub id: AnnouncementId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_teachers: bool,
    #[serde(default)]
    pub target_students: bool,
    #[serde(default)]
    pub target_parents: bool,
    #[serde(default)]
    pub target_admins: bool,
    #[serde(default)]
    pub date_created: String,
}

impl Announcement {
    /// Creation time, if the backend sent a parseable RFC 3339 timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date_created).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct AnnouncementDraft {
    pub title: String,
    pub description: String,
    pub target_teachers: bool,
    pub target_students: bool,
    pub target_parents: bool,
    pub target_admins: bool,
}

impl AnnouncementDraft {
    /// Mark `audience` as a recipient.
    pub const fn target(&mut self, audience: Audience) {
        match audience {
            Audience::Teachers => self.target_teachers = true,
            Audience::Parents => self.target_parents = true,
            Audience::Students => self.target_students = true,
            Audience::Admins => self.target_admins = true,
        }
    }
}

impl Draft for AnnouncementDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Title", &self.title)?;
        require("Content", &self.description)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Announcement {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.title.as_str()),
            Cow::Borrowed(self.description.as_str()),
        ]
    }
}

impl Entity for Announcement {
    const RESOURCE: Resource = Resource::Announcements;
    const COLUMNS: &'static [&'static str] = &["Title", "Description", "Created"];
    type Key = AnnouncementId;
    type Draft = AnnouncementDraft;

    fn key(&self) -> AnnouncementId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        let created = self.created_at().map_or_else(
            || self.date_created.clone(),
            |at| at.format("%Y-%m-%d %H:%M").to_string(),
        );
        vec![self.title.clone(), self.description.clone(), created]
    }

    fn to_draft(&self) -> AnnouncementDraft {
        AnnouncementDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            target_teachers: self.target_teachers,
            target_students: self.target_students,
            target_parents: self.target_parents,
            target_admins: self.target_admins,
        }
    }
}

/// Who an announcement feed is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Teachers,
    Parents,
    Students,
    Admins,
}

impl Audience {
    pub const ALL: [Self; 4] = [Self::Teachers, Self::Parents, Self::Students, Self::Admins];

    /// Endpoint of the targeted feed.
    #[must_use]
    pub const fn feed_path(self) -> &'static str {
        match self {
            Self::Teachers => "teacher_targeted_announcements/",
            Self::Parents => "parent_targeted_announcements/",
            Self::Students => "student_targeted_announcements/",
            Self::Admins => "admin_targeted_announcements/",
        }
    }

    /// Panel heading ("Teacher Announcements").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Teachers => "Teacher Announcements",
            Self::Parents => "Parent Announcements",
            Self::Students => "Student Announcements",
            Self::Admins => "Admin Announcements",
        }
    }
}

/// Body of a targeted announcement feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementFeed {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "Total", default)]
    pub total: u64,
    #[serde(rename = "Announcements", default)]
    pub announcements: Vec<Announcement>,
}

/// Which head count a totals endpoint returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TotalKind {
    Students,
    Parents,
    Teachers,
}

impl TotalKind {
    pub const ALL: [Self; 3] = [Self::Students, Self::Parents, Self::Teachers];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Students => "all_students/",
            Self::Parents => "all_parents/",
            Self::Teachers => "all_teachers/",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Students => "Total Students",
            Self::Parents => "Total Parents",
            Self::Teachers => "Total Teachers",
        }
    }
}

/// Body of a totals endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Total {
    #[serde(rename = "Total")]
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_body_uses_capitalized_keys() {
        let feed: AnnouncementFeed = serde_json::from_value(serde_json::json!({
            "message": "Teacher announcements",
            "Total": 1,
            "Announcements": [{
                "id": 8,
                "title": "Staff meeting",
                "description": "Friday 4pm",
                "date_created": "2025-03-01T09:30:00Z"
            }]
        }))
        .expect("feed");
        assert_eq!(feed.total, 1);
        let first = feed.announcements.first().expect("one announcement");
        assert!(first.created_at().is_some());
        assert_eq!(first.row().last().map(String::as_str), Some("2025-03-01 09:30"));
    }

    #[test]
    fn test_draft_targets_audiences() {
        let mut draft = AnnouncementDraft {
            title: "Closing day".to_owned(),
            description: "School closes on Friday".to_owned(),
            ..AnnouncementDraft::default()
        };
        draft.target(Audience::Parents);
        draft.target(Audience::Students);
        assert!(draft.target_parents && draft.target_students);
        assert!(!draft.target_teachers && !draft.target_admins);
        assert!(draft.validate(Intent::Create).is_ok());
    }

    #[test]
    fn test_paths() {
        assert_eq!(Audience::Admins.feed_path(), "admin_targeted_announcements/");
        assert_eq!(TotalKind::Parents.path(), "all_parents/");
    }
}
