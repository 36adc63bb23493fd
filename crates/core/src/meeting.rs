//! Conferencing meeting requests.
//!
//! A meeting is checked locally against the current date and time before it
//! is sent to `create_meeting/`, which answers with the join details.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::access::Action;
use crate::types::Role;
use crate::types::records::assessments::text_or_number;

/// Why a meeting cannot be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Topic is required")]
    MissingTopic,

    #[error("Duration must be at least one minute")]
    InvalidDuration,

    #[error("Start date cannot be in the past.")]
    DateInPast,

    #[error("Start time cannot be earlier than the current time.")]
    TimeInPast,

    #[error("Only admins and teachers can schedule meetings")]
    NotAllowed,
}

/// A meeting to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub topic: String,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(with = "date_format")]
    pub start_date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
}

impl MeetingRequest {
    #[must_use]
    pub fn starts_at(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.start_date, self.start_time)
    }

    /// Check the request against the local clock.
    ///
    /// # Errors
    ///
    /// See [`MeetingRequest::validate_at`].
    pub fn validate(&self, role: Role) -> Result<(), ScheduleError> {
        self.validate_at(role, Local::now().naive_local())
    }

    /// Check the request as of `now`.
    ///
    /// The date is compared first, so a meeting on an earlier day reports
    /// [`ScheduleError::DateInPast`] rather than [`ScheduleError::TimeInPast`].
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ScheduleError`].
    pub fn validate_at(&self, role: Role, now: NaiveDateTime) -> Result<(), ScheduleError> {
        if !Action::NewMeeting.is_allowed(role) {
            return Err(ScheduleError::NotAllowed);
        }
        if self.topic.trim().is_empty() {
            return Err(ScheduleError::MissingTopic);
        }
        if self.duration_minutes == 0 {
            return Err(ScheduleError::InvalidDuration);
        }
        if self.start_date < now.date() {
            return Err(ScheduleError::DateInPast);
        }
        if self.starts_at() < now {
            return Err(ScheduleError::TimeInPast);
        }
        Ok(())
    }
}

/// Join details returned for a created meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingCreated {
    pub join_url: String,
    #[serde(deserialize_with = "text_or_number")]
    pub meeting_id: String,
    #[serde(default)]
    pub password: String,
}

mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            NaiveTime::parse_from_str(time, "%H:%M").expect("time"),
        )
    }

    fn request(date: &str, time: &str) -> MeetingRequest {
        let start = at(date, time);
        MeetingRequest {
            topic: "Form Two parents".to_owned(),
            duration_minutes: 40,
            start_date: start.date(),
            start_time: start.time(),
        }
    }

    #[test]
    fn test_past_date_rejected() {
        let now = at("2025-05-10", "08:00");
        assert_eq!(
            request("2025-05-09", "23:00").validate_at(Role::Teacher, now),
            Err(ScheduleError::DateInPast)
        );
        assert_eq!(
            ScheduleError::DateInPast.to_string(),
            "Start date cannot be in the past."
        );
    }

    #[test]
    fn test_earlier_time_today_rejected() {
        let now = at("2025-05-10", "08:00");
        assert_eq!(
            request("2025-05-10", "07:59").validate_at(Role::Admin, now),
            Err(ScheduleError::TimeInPast)
        );
        assert!(request("2025-05-10", "08:30").validate_at(Role::Admin, now).is_ok());
    }

    #[test]
    fn test_parents_and_students_cannot_schedule() {
        let now = at("2025-05-10", "08:00");
        let future = request("2025-06-01", "10:00");
        assert_eq!(future.validate_at(Role::Parent, now), Err(ScheduleError::NotAllowed));
        assert_eq!(future.validate_at(Role::Student, now), Err(ScheduleError::NotAllowed));
    }

    #[test]
    fn test_wire_format() {
        let body = serde_json::to_value(request("2025-06-01", "10:00")).expect("serialize");
        assert_eq!(
            body,
            serde_json::json!({
                "topic": "Form Two parents",
                "duration": 40,
                "start_date": "2025-06-01",
                "start_time": "10:00"
            })
        );

        let created: MeetingCreated = serde_json::from_value(serde_json::json!({
            "join_url": "https://zoom.us/j/812",
            "meeting_id": 812,
            "password": "x1y2"
        }))
        .expect("created");
        assert_eq!(created.meeting_id, "812");
    }
}
