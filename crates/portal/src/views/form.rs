//! Create and update forms.

use bidii_core::{Draft, Entity, FormError, Intent, Resource, Route};
use tracing::{info, instrument};

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::gateway::Saved;
use crate::transport::Transport;

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode<K> {
    Create,
    Update(K),
}

impl<K> FormMode<K> {
    #[must_use]
    pub const fn intent(&self) -> Intent {
        match self {
            Self::Create => Intent::Create,
            Self::Update(_) => Intent::Update,
        }
    }
}

/// State of a form screen for `E`.
#[derive(Debug, Clone)]
pub struct FormView<E: Entity> {
    mode: FormMode<E::Key>,
    draft: E::Draft,
    error: Option<String>,
    loading: bool,
}

impl<E: Entity> FormView<E> {
    /// An empty form that creates a new record.
    #[must_use]
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            draft: E::Draft::default(),
            error: None,
            loading: false,
        }
    }

    /// A form editing the record at `key`, pre-filled from the backend.
    ///
    /// If the fetch fails the form starts empty with the error recorded.
    #[instrument(skip(client), fields(resource = E::RESOURCE.slug()))]
    pub async fn edit<T: Transport>(client: &PortalClient<T>, key: E::Key) -> Self {
        let mut view = Self {
            mode: FormMode::Update(key.clone()),
            draft: E::Draft::default(),
            error: None,
            loading: true,
        };
        match client.get::<E>(&key).await {
            Ok(record) => view.draft = record.to_draft(),
            Err(err) => view.error = Some(err.message),
        }
        view.loading = false;
        view
    }

    #[must_use]
    pub const fn mode(&self) -> &FormMode<E::Key> {
        &self.mode
    }

    #[must_use]
    pub const fn draft(&self) -> &E::Draft {
        &self.draft
    }

    pub const fn draft_mut(&mut self) -> &mut E::Draft {
        &mut self.draft
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Where a successful submit leads.
    #[must_use]
    pub fn destination(&self) -> Route {
        match (&self.mode, E::RESOURCE) {
            (FormMode::Update(_), resource) => Route::List(resource),
            (FormMode::Create, resource) if resource.is_registration() => Route::Login,
            (FormMode::Create, Resource::Announcements) => Route::Dashboard,
            (FormMode::Create, resource) => Route::List(resource),
        }
    }

    /// Validate and send the form, then redirect.
    ///
    /// The draft is checked locally first, then the session: forms other than
    /// registration need a stored access token. Either failure is recorded
    /// and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` that was recorded as the form's error.
    #[instrument(skip_all, fields(resource = E::RESOURCE.slug()))]
    pub async fn submit<T: Transport>(
        &mut self,
        client: &PortalClient<T>,
    ) -> Result<Saved<E>, ApiError> {
        self.loading = true;
        let result = self.send(client).await;
        self.loading = false;

        match result {
            Ok(saved) => {
                self.error = None;
                let route = self.destination();
                info!(route = %route, "Form saved");
                client.navigator().redirect(route);
                Ok(saved)
            }
            Err(err) => {
                self.error = Some(err.message.clone());
                Err(err)
            }
        }
    }

    async fn send<T: Transport>(&self, client: &PortalClient<T>) -> Result<Saved<E>, ApiError> {
        self.draft.validate(self.mode.intent())?;
        if !E::RESOURCE.is_registration() && client.session().access_token()?.is_none() {
            return Err(FormError::LoginRequired.into());
        }
        match &self.mode {
            FormMode::Create => client.create::<E>(&self.draft).await,
            FormMode::Update(key) => client.update::<E>(key, &self.draft).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use bidii_core::{
        AccountDraft, Announcement, Class, ClassId, Student, StudentDraft, Subject,
    };
    use serde_json::json;

    use super::*;
    use crate::error::ApiErrorKind;
    use crate::testing::{self, FakeTransport};

    fn acknowledging() -> FakeTransport {
        FakeTransport::new(|_, _| testing::json(201, &json!({ "message": "Created" })))
    }

    #[tokio::test]
    async fn test_edit_prefills_from_backend() {
        let transport = FakeTransport::new(|_, _| testing::json(200, &json!({ "id": 5, "name": "Form 3" })));
        let (client, _) = testing::client(transport.clone());
        client
            .session()
            .save(&testing::session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let view = FormView::<Class>::edit(&client, ClassId::new(5)).await;

        assert_eq!(view.draft().name, "Form 3");
        assert_eq!(view.mode(), &FormMode::Update(ClassId::new(5)));
        assert!(!view.is_loading());
        assert_eq!(transport.calls()[0].path, "class_info/5/");
    }

    #[tokio::test]
    async fn test_update_redirects_to_list() {
        let transport = FakeTransport::new(|_, _| testing::json(200, &json!({ "id": 5, "name": "Form 3" })));
        let (client, navigator) = testing::client(transport);
        client
            .session()
            .save(&testing::session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let mut view = FormView::<Class>::edit(&client, ClassId::new(5)).await;
        view.draft_mut().name = "Form 3 East".to_owned();
        view.submit(&client).await.expect("submit");

        assert_eq!(navigator.last(), Some(Route::List(Resource::Classes)));
    }

    #[tokio::test]
    async fn test_password_mismatch_is_rejected_before_login_check() {
        let transport = acknowledging();
        let (client, navigator) = testing::client(transport.clone());
        let mut view = FormView::<Student>::create();
        *view.draft_mut() = StudentDraft {
            user: AccountDraft {
                first_name: "Achieng".to_owned(),
                last_name: "Otieno".to_owned(),
                username: "aotieno".to_owned(),
                email: "aotieno@bidii.ac.ke".to_owned(),
                password: "first-pass".to_owned(),
                confirm_password: "second-pass".to_owned(),
            },
            parent_email: "mzazi@bidii.ac.ke".to_owned(),
            parent_code: "PAR-001".to_owned(),
        };

        let err = view.submit(&client).await.expect_err("mismatch");

        assert_eq!(err.to_string(), "Password Mismatch!");
        assert_eq!(view.error(), Some("Password Mismatch!"));
        assert!(transport.calls().is_empty());
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_login_required_without_token() {
        let transport = acknowledging();
        let (client, _) = testing::client(transport.clone());
        let mut view = FormView::<Subject>::create();
        view.draft_mut().name = "Chemistry".to_owned();

        let err = view.submit(&client).await.expect_err("login required");

        assert_eq!(err.to_string(), "Login Required!");
        assert_eq!(err.kind, ApiErrorKind::Invalid);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_registration_submits_without_login_and_goes_to_login() {
        let transport = acknowledging();
        let (client, navigator) = testing::client(transport.clone());
        let mut view = FormView::<Student>::create();
        *view.draft_mut() = StudentDraft {
            user: AccountDraft {
                first_name: "Achieng".to_owned(),
                last_name: "Otieno".to_owned(),
                username: "aotieno".to_owned(),
                email: "aotieno@bidii.ac.ke".to_owned(),
                password: "s3cret-pass".to_owned(),
                confirm_password: "s3cret-pass".to_owned(),
            },
            parent_email: "mzazi@bidii.ac.ke".to_owned(),
            parent_code: "PAR-001".to_owned(),
        };

        let saved = view.submit(&client).await.expect("submit");

        assert_eq!(saved.message.as_deref(), Some("Created"));
        assert_eq!(navigator.last(), Some(Route::Login));
        let calls = transport.calls();
        assert_eq!(calls[0].path, "create_student/");
        assert_eq!(calls[0].bearer, None);
    }

    #[test]
    fn test_create_destinations() {
        assert_eq!(FormView::<Subject>::create().destination(), Route::List(Resource::Subjects));
        assert_eq!(FormView::<Announcement>::create().destination(), Route::Dashboard);
        assert_eq!(FormView::<Student>::create().destination(), Route::Login);
    }

    #[tokio::test]
    async fn test_backend_error_is_recorded() {
        let transport = FakeTransport::new(|_, _| {
            testing::json(400, &json!({ "name": ["subject with this name already exists."] }))
        });
        let (client, navigator) = testing::client(transport);
        client
            .session()
            .save(&testing::session_with("acc-1", "ref-1", "is_teacher"))
            .expect("save");
        let mut view = FormView::<Subject>::create();
        view.draft_mut().name = "Chemistry".to_owned();

        let err = view.submit(&client).await.expect_err("rejected");

        assert_eq!(err.status(), Some(400));
        assert_eq!(view.error(), Some("name: subject with this name already exists."));
        assert!(navigator.history().is_empty());
    }
}
