//! Exams, CATs (continuous assessment tests) and the grades recorded
//! against them.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::filter::Searchable;
use crate::types::entity::{Draft, Entity};
use crate::types::form::{FormBody, FormError, Intent, require};
use crate::types::id::{CatAndExamId, CatGradeId, CatId, ExamGradeId, ExamId};
use crate::types::resource::Resource;

/// Accept `12`, `12.5` or `"12"` and keep the text form.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Text(s)) => s,
        None => String::new(),
    })
}

fn invalid(field: &'static str, reason: &str) -> FormError {
    FormError::InvalidField {
        field,
        reason: reason.to_owned(),
    }
}

/// Date, start time and `HH:MM:SS` duration, each optional but well-formed.
fn check_sitting(date_done: &str, start_time: &str, duration: &str) -> Result<(), FormError> {
    if !date_done.is_empty() && NaiveDate::parse_from_str(date_done, "%Y-%m-%d").is_err() {
        return Err(invalid("Date", "expected YYYY-MM-DD"));
    }
    if !start_time.is_empty()
        && NaiveTime::parse_from_str(start_time, "%H:%M").is_err()
        && NaiveTime::parse_from_str(start_time, "%H:%M:%S").is_err()
    {
        return Err(invalid("Start time", "expected HH:MM"));
    }
    if !duration.is_empty() && NaiveTime::parse_from_str(duration, "%H:%M:%S").is_err() {
        return Err(invalid("Duration", "expected HH:MM:SS"));
    }
    Ok(())
}

fn check_marks(marks: &str) -> Result<(), FormError> {
    require("Marks", marks)?;
    match marks.trim().parse::<f64>() {
        Ok(value) if (0.0..=100.0).contains(&value) => Ok(()),
        _ => Err(invalid("Marks", "expected a number from 0 to 100")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    #[serde(default)]
    pub exam_name: String,
    #[serde(default)]
    pub exam_code: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date_done: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub exam_term: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamDraft {
    pub exam_name: String,
    pub content: String,
    pub exam_class: String,
    pub exam_stream: String,
    pub subject: String,
    pub duration: String,
    pub date_done: String,
    pub start_time: String,
    pub exam_term: String,
}

impl Draft for ExamDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Exam name", &self.exam_name)?;
        require("Subject", &self.subject)?;
        check_sitting(&self.date_done, &self.start_time, &self.duration)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Exam {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.date_done.as_str()),
            Cow::Borrowed(self.exam_code.as_str()),
            Cow::Borrowed(self.exam_name.as_str()),
            Cow::Borrowed(self.subject.as_str()),
            Cow::Borrowed(self.exam_term.as_str()),
        ]
    }
}

impl Entity for Exam {
    const RESOURCE: Resource = Resource::Exams;
    const COLUMNS: &'static [&'static str] =
        &["Name", "Code", "Subject", "Date", "Start", "Term"];
    type Key = ExamId;
    type Draft = ExamDraft;

    fn key(&self) -> ExamId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.exam_name.clone(),
            self.exam_code.clone(),
            self.subject.clone(),
            self.date_done.clone(),
            self.start_time.clone(),
            self.exam_term.clone(),
        ]
    }

    fn to_draft(&self) -> ExamDraft {
        ExamDraft {
            exam_name: self.exam_name.clone(),
            content: self.content.clone(),
            subject: self.subject.clone(),
            duration: self.duration.clone(),
            date_done: self.date_done.clone(),
            start_time: self.start_time.clone(),
            exam_term: self.exam_term.clone(),
            ..ExamDraft::default()
        }
    }
}

/// A continuous assessment test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cat {
    pub id: CatId,
    #[serde(default)]
    pub cat_name: String,
    #[serde(default)]
    pub cat_code: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date_done: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub cat_term: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatDraft {
    pub cat_name: String,
    pub content: String,
    pub cat_class: String,
    pub cat_stream: String,
    pub subject: String,
    pub duration: String,
    pub date_done: String,
    pub start_time: String,
    pub cat_term: String,
}

impl Draft for CatDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Cat name", &self.cat_name)?;
        require("Subject", &self.subject)?;
        check_sitting(&self.date_done, &self.start_time, &self.duration)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for Cat {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.date_done.as_str()),
            Cow::Borrowed(self.cat_code.as_str()),
            Cow::Borrowed(self.cat_name.as_str()),
            Cow::Borrowed(self.subject.as_str()),
            Cow::Borrowed(self.cat_term.as_str()),
        ]
    }
}

impl Entity for Cat {
    const RESOURCE: Resource = Resource::Cats;
    const COLUMNS: &'static [&'static str] =
        &["Name", "Code", "Subject", "Date", "Start", "Term"];
    type Key = CatId;
    type Draft = CatDraft;

    fn key(&self) -> CatId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.cat_name.clone(),
            self.cat_code.clone(),
            self.subject.clone(),
            self.date_done.clone(),
            self.start_time.clone(),
            self.cat_term.clone(),
        ]
    }

    fn to_draft(&self) -> CatDraft {
        CatDraft {
            cat_name: self.cat_name.clone(),
            content: self.content.clone(),
            subject: self.subject.clone(),
            duration: self.duration.clone(),
            date_done: self.date_done.clone(),
            start_time: self.start_time.clone(),
            cat_term: self.cat_term.clone(),
            ..CatDraft::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatGrade {
    pub id: CatGradeId,
    #[serde(default)]
    pub cat_name: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub marks: String,
    #[serde(default)]
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatGradeDraft {
    pub cat_name: String,
    pub student: String,
    pub subject: String,
    pub marks: String,
}

impl Draft for CatGradeDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Cat", &self.cat_name)?;
        require("Student code", &self.student)?;
        require("Subject", &self.subject)?;
        check_marks(&self.marks)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for CatGrade {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.cat_name.as_str()),
            Cow::Borrowed(self.student.as_str()),
            Cow::Borrowed(self.subject.as_str()),
        ]
    }
}

impl Entity for CatGrade {
    const RESOURCE: Resource = Resource::CatGrades;
    const COLUMNS: &'static [&'static str] = &["Cat", "Student", "Subject", "Marks", "Grade"];
    type Key = CatGradeId;
    type Draft = CatGradeDraft;

    fn key(&self) -> CatGradeId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.cat_name.clone(),
            self.student.clone(),
            self.subject.clone(),
            self.marks.clone(),
            self.grade.clone(),
        ]
    }

    fn to_draft(&self) -> CatGradeDraft {
        CatGradeDraft {
            cat_name: self.cat_name.clone(),
            student: self.student.clone(),
            subject: self.subject.clone(),
            marks: self.marks.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamGrade {
    pub id: ExamGradeId,
    #[serde(default)]
    pub exam_name: String,
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub marks: String,
    #[serde(default)]
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamGradeDraft {
    pub exam_name: String,
    pub student: String,
    pub subject: String,
    pub marks: String,
}

impl Draft for ExamGradeDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Exam", &self.exam_name)?;
        require("Student code", &self.student)?;
        require("Subject", &self.subject)?;
        check_marks(&self.marks)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for ExamGrade {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.exam_name.as_str()),
            Cow::Borrowed(self.student.as_str()),
            Cow::Borrowed(self.subject.as_str()),
        ]
    }
}

impl Entity for ExamGrade {
    const RESOURCE: Resource = Resource::ExamGrades;
    const COLUMNS: &'static [&'static str] = &["Exam", "Student", "Subject", "Marks", "Grade"];
    type Key = ExamGradeId;
    type Draft = ExamGradeDraft;

    fn key(&self) -> ExamGradeId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.exam_name.clone(),
            self.student.clone(),
            self.subject.clone(),
            self.marks.clone(),
            self.grade.clone(),
        ]
    }

    fn to_draft(&self) -> ExamGradeDraft {
        ExamGradeDraft {
            exam_name: self.exam_name.clone(),
            student: self.student.clone(),
            subject: self.subject.clone(),
            marks: self.marks.clone(),
        }
    }
}

/// A student's combined CAT and exam marks for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatAndExam {
    pub id: CatAndExamId,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub stream_name: String,
    #[serde(default)]
    pub class_student: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub student_cat: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub student_exam: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatAndExamDraft {
    pub class_name: String,
    pub stream_name: String,
    pub class_student: String,
    pub subject: String,
}

impl Draft for CatAndExamDraft {
    fn validate(&self, _intent: Intent) -> Result<(), FormError> {
        require("Class", &self.class_name)?;
        require("Stream", &self.stream_name)?;
        require("Student code", &self.class_student)?;
        require("Subject", &self.subject)
    }

    fn to_body(&self, _intent: Intent) -> Result<FormBody, serde_json::Error> {
        FormBody::json(self)
    }
}

impl Searchable for CatAndExam {
    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.class_name.as_str()),
            Cow::Borrowed(self.stream_name.as_str()),
            Cow::Borrowed(self.class_student.as_str()),
            Cow::Borrowed(self.subject.as_str()),
        ]
    }
}

impl Entity for CatAndExam {
    const RESOURCE: Resource = Resource::CatsAndExams;
    const COLUMNS: &'static [&'static str] =
        &["Student", "Class", "Stream", "Subject", "Cat", "Exam"];
    type Key = CatAndExamId;
    type Draft = CatAndExamDraft;

    fn key(&self) -> CatAndExamId {
        self.id
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.class_student.clone(),
            self.class_name.clone(),
            self.stream_name.clone(),
            self.subject.clone(),
            self.student_cat.clone(),
            self.student_exam.clone(),
        ]
    }

    fn to_draft(&self) -> CatAndExamDraft {
        CatAndExamDraft {
            class_name: self.class_name.clone(),
            stream_name: self.stream_name.clone(),
            class_student: self.class_student.clone(),
            subject: self.subject.clone(),
        }
    }
}
