//! Record commands over every resource.
//!
//! Each command is written once against [`Entity`] and instantiated per
//! resource by [`dispatch!`].

use std::io::{self, BufRead, Write};
use std::path::Path;

use bidii_core::{
    Admin, Announcement, Cat, CatAndExam, CatGrade, Class, ClassStreamSubject, Draft, Entity,
    Exam, ExamGrade, Parent, Resource, RoleRecord, Rows, Stream, Student, Subject, Teacher,
    Upload, NO_MATCHING_CONTENT,
};
use bidii_portal::PortalClient;
use bidii_portal::views::{DeleteOutcome, FormView, ListView};
use serde_json::Value;

use super::{emit, table};
use crate::error::CliError;

/// Run `$handler::<E>(args..)` for the record type behind `$resource`.
macro_rules! dispatch {
    ($resource:expr, $handler:ident($($arg:expr),* $(,)?)) => {
        match $resource {
            Resource::Admins => $handler::<Admin>($($arg),*).await,
            Resource::Teachers => $handler::<Teacher>($($arg),*).await,
            Resource::Parents => $handler::<Parent>($($arg),*).await,
            Resource::Students => $handler::<Student>($($arg),*).await,
            Resource::Roles => $handler::<RoleRecord>($($arg),*).await,
            Resource::Classes => $handler::<Class>($($arg),*).await,
            Resource::Streams => $handler::<Stream>($($arg),*).await,
            Resource::Subjects => $handler::<Subject>($($arg),*).await,
            Resource::Exams => $handler::<Exam>($($arg),*).await,
            Resource::Cats => $handler::<Cat>($($arg),*).await,
            Resource::CatGrades => $handler::<CatGrade>($($arg),*).await,
            Resource::ExamGrades => $handler::<ExamGrade>($($arg),*).await,
            Resource::CatsAndExams => $handler::<CatAndExam>($($arg),*).await,
            Resource::ClassStreamSubjects => $handler::<ClassStreamSubject>($($arg),*).await,
            Resource::Announcements => $handler::<Announcement>($($arg),*).await,
        }
    };
}

pub async fn list(portal: &PortalClient, resource: Resource, filter: &str) -> Result<(), CliError> {
    dispatch!(resource, list_records(portal, filter))
}

pub async fn show(portal: &PortalClient, resource: Resource, key: &str) -> Result<(), CliError> {
    dispatch!(resource, show_record(portal, key))
}

pub async fn create(
    portal: &PortalClient,
    resource: Resource,
    data: &str,
    picture: Option<&Path>,
) -> Result<(), CliError> {
    dispatch!(resource, create_record(portal, data, picture))
}

pub async fn update(
    portal: &PortalClient,
    resource: Resource,
    key: &str,
    data: &str,
    picture: Option<&Path>,
) -> Result<(), CliError> {
    dispatch!(resource, update_record(portal, key, data, picture))
}

pub async fn delete(
    portal: &PortalClient,
    resource: Resource,
    key: &str,
    yes: bool,
) -> Result<(), CliError> {
    dispatch!(resource, delete_record(portal, key, yes))
}

// =============================================================================
// Generic handlers
// =============================================================================

async fn list_records<E: Entity>(portal: &PortalClient, filter: &str) -> Result<(), CliError> {
    let mut view = ListView::<E>::new();
    view.load(portal).await;
    if let Some(error) = view.error() {
        return Err(CliError::Failed(error.to_owned()));
    }
    view.set_query(filter);

    match view.rows() {
        Rows::Records(records) => {
            let mut headers = vec!["Key"];
            headers.extend_from_slice(E::COLUMNS);
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|record| {
                    let mut cells = vec![record.key().to_string()];
                    cells.extend(record.row());
                    cells
                })
                .collect();
            emit(table(&headers, &rows))
        }
        Rows::NoMatchingContent => emit([NO_MATCHING_CONTENT]),
    }
}

async fn show_record<E: Entity>(portal: &PortalClient, key: &str) -> Result<(), CliError> {
    let key: E::Key = key.parse()?;
    let record = portal.get::<E>(&key).await?;
    let width = E::COLUMNS.iter().map(|c| c.len()).max().unwrap_or_default();
    emit(
        E::COLUMNS
            .iter()
            .zip(record.row())
            .map(|(column, value)| format!("{column:<width$}  {value}")),
    )
}

async fn create_record<E: Entity>(
    portal: &PortalClient,
    data: &str,
    picture: Option<&Path>,
) -> Result<(), CliError> {
    let mut draft: E::Draft = serde_json::from_str(data)?;
    if let Some(path) = picture {
        attach::<E>(&mut draft, path)?;
    }

    let mut view = FormView::<E>::create();
    *view.draft_mut() = draft;
    let saved = view.submit(portal).await?;
    emit([saved
        .message
        .unwrap_or_else(|| format!("{} created", E::RESOURCE.label()))])
}

async fn update_record<E: Entity>(
    portal: &PortalClient,
    key: &str,
    data: &str,
    picture: Option<&Path>,
) -> Result<(), CliError> {
    let key: E::Key = key.parse()?;
    let mut view = FormView::<E>::edit(portal, key).await;
    if let Some(error) = view.error() {
        return Err(CliError::Failed(error.to_owned()));
    }

    let mut current = serde_json::to_value(view.draft())?;
    merge(&mut current, serde_json::from_str(data)?);
    let mut draft: E::Draft = serde_json::from_value(current)?;
    if let Some(path) = picture {
        attach::<E>(&mut draft, path)?;
    }
    *view.draft_mut() = draft;

    let saved = view.submit(portal).await?;
    emit([saved
        .message
        .unwrap_or_else(|| format!("{} updated", E::RESOURCE.label()))])
}

async fn delete_record<E: Entity>(
    portal: &PortalClient,
    key: &str,
    yes: bool,
) -> Result<(), CliError> {
    let key: E::Key = key.parse()?;
    let mut view = ListView::<E>::new();
    let outcome = if yes {
        view.delete(portal, &key, &|_: &str| true).await
    } else {
        view.delete(portal, &key, &ask).await
    };
    match outcome {
        DeleteOutcome::Cancelled => emit(["Cancelled"]),
        DeleteOutcome::Deleted => emit([format!("{} deleted", E::RESOURCE.label())]),
        DeleteOutcome::Failed(message) => Err(CliError::Failed(message)),
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Prompt on stderr and read a yes/no answer from stdin.
fn ask(prompt: &str) -> bool {
    let mut err = io::stderr().lock();
    if write!(err, "{prompt} [y/N] ").and_then(|()| err.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn attach<E: Entity>(draft: &mut E::Draft, path: &Path) -> Result<(), CliError> {
    let upload = Upload {
        file_name: path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned()),
        content_type: content_type(path).to_owned(),
        bytes: std::fs::read(path)?,
    };
    if draft.attach_picture(upload) {
        Ok(())
    } else {
        Err(CliError::PictureUnsupported(E::RESOURCE))
    }
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Overlay `patch` onto `base`, recursing into objects.
fn merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut base = json!({
            "user": { "first_name": "Wanjiru", "email": "w@bidii.ac.ke" },
            "phone": "0700000000"
        });
        merge(&mut base, json!({ "user": { "email": "wk@bidii.ac.ke" }, "address": "Thika" }));
        assert_eq!(
            base,
            json!({
                "user": { "first_name": "Wanjiru", "email": "wk@bidii.ac.ke" },
                "phone": "0700000000",
                "address": "Thika"
            })
        );
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type(Path::new("me.PNG")), "image/png");
        assert_eq!(content_type(Path::new("me.jpeg")), "image/jpeg");
        assert_eq!(content_type(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn test_picture_rejected_for_plain_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("crest.png");
        std::fs::write(&path, [0x89, 0x50]).expect("write");

        let mut draft = bidii_core::ClassDraft::default();
        let err = attach::<Class>(&mut draft, &path).expect_err("unsupported");
        assert_eq!(err.to_string(), "Class records have no profile picture");

        let mut draft = bidii_core::TeacherDraft::default();
        attach::<Teacher>(&mut draft, &path).expect("teachers take pictures");
        assert_eq!(
            draft.profile_picture.map(|upload| upload.content_type).as_deref(),
            Some("image/png")
        );
    }
}
