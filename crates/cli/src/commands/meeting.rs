//! Conferencing.

use bidii_core::MeetingRequest;
use bidii_portal::PortalClient;
use chrono::{NaiveDate, NaiveTime};

use super::emit;
use crate::error::CliError;

pub async fn schedule(
    portal: &PortalClient,
    topic: String,
    duration_minutes: u32,
    date: &str,
    time: &str,
) -> Result<(), CliError> {
    let request = MeetingRequest {
        topic,
        duration_minutes,
        start_date: parse_date(date)?,
        start_time: parse_time(time)?,
    };
    let role = portal.viewer()?.role;
    let created = portal.schedule_meeting(role, &request).await?;

    let mut lines = vec![
        format!("Meeting scheduled: {}", request.topic),
        format!("Join URL:   {}", created.join_url),
        format!("Meeting ID: {}", created.meeting_id),
    ];
    if !created.password.is_empty() {
        lines.push(format!("Password:   {}", created.password));
    }
    emit(lines)
}

fn parse_date(input: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| CliError::InvalidArgument {
        field: "date",
        input: input.to_owned(),
    })
}

fn parse_time(input: &str) -> Result<NaiveTime, CliError> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| CliError::InvalidArgument {
            field: "time",
            input: input.to_owned(),
        })
}
