//! Login and logout.

use bidii_core::{Credentials, FormBody, LoginResponse, Route, Session, Viewer};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::client::PortalClient;
use crate::error::{ApiError, ApiErrorKind, ClientError};
use crate::transport::{ApiRequest, Transport};

/// Login endpoint.
pub const LOGIN_PATH: &str = "user_login/";

/// Shown when a login fails without a backend message.
pub const LOGIN_FAILED: &str = "Login Failed";

/// Returned by a successful logout.
pub const LOGGED_OUT: &str = "Logged Out Successfully";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl<T: Transport> PortalClient<T> {
    /// Sign in and persist the session.
    ///
    /// The request carries no bearer token. On success all eleven session
    /// keys are written and the navigator is sent to the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an `Invalid` error if either field is blank (nothing is sent),
    /// otherwise the backend's message or "Login Failed".
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Viewer, ApiError> {
        let credentials = Credentials::new(email, password)?;
        let body = FormBody::json(&LoginRequest {
            email: &credentials.email,
            password: &credentials.password,
        })
        .map_err(|_| ApiError::decode(LOGIN_FAILED))?;

        let response = match self
            .send_anonymous(&ApiRequest::post(LOGIN_PATH, body))
            .await
        {
            Ok(response) => response,
            Err(ClientError::Transport(e)) => {
                warn!(error = %e, "Login request failed");
                return Err(ApiError {
                    kind: ApiErrorKind::Transport,
                    message: LOGIN_FAILED.to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        if !response.is_success() {
            return Err(ApiError::rejected(
                response.status,
                &response.body,
                LOGIN_FAILED,
            ));
        }

        let session = Session::from(
            response
                .json::<LoginResponse>()
                .map_err(|_| ApiError::decode(LOGIN_FAILED))?,
        );
        self.session().save(&session)?;
        let viewer = Viewer::from_session(&session);
        info!(user_id = %session.user_id, role = %viewer.role, "Logged in");

        self.navigator().redirect(Route::Dashboard);
        Ok(viewer)
    }

    /// Forget the session and return to the home screen.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the session store cannot be cleared.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<&'static str, ApiError> {
        self.session().clear()?;
        self.navigator().redirect(Route::Home);
        info!("Logged out");
        Ok(LOGGED_OUT)
    }
}

#[cfg(test)]
mod tests {
    use bidii_core::{Role, SessionKey};
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;
    use crate::testing::{self, FakeTransport};

    fn login_backend() -> FakeTransport {
        FakeTransport::new(|request, _| {
            let Some(FormBody::Json(body)) = &request.body else {
                return testing::empty(400);
            };
            if body["password"] == "correct-horse" {
                testing::json(
                    200,
                    &json!({
                        "access_token": "acc-1",
                        "refresh_token": "ref-1",
                        "user_id": 12,
                        "user_email": body["email"],
                        "first_letter": "W",
                        "is_admin": false,
                        "is_teacher": true,
                        "is_student": false,
                        "is_parent": false,
                        "teacher_profile_picture": "/media/teacher_profile/w.png",
                        "parent_profile_picture": null
                    }),
                )
            } else {
                testing::json(400, &json!({ "error": "Invalid Credentials" }))
            }
        })
    }

    #[tokio::test]
    async fn test_login_stores_session_and_redirects() {
        let transport = login_backend();
        let (client, navigator) = testing::client(transport.clone());

        let viewer = client
            .login("mwalimu@bidii.ac.ke", "correct-horse")
            .await
            .expect("login");

        assert_eq!(viewer.role, Role::Teacher);
        assert_eq!(navigator.last(), Some(Route::Dashboard));
        for key in SessionKey::ALL {
            assert!(client.session().read(key).expect("read").is_some(), "{key} missing");
        }
        let token = client.session().access_token().expect("read").expect("token");
        assert_eq!(token.expose_secret(), "acc-1");

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, LOGIN_PATH);
        assert_eq!(calls[0].bearer, None);
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_backend_message() {
        let (client, navigator) = testing::client(login_backend());

        let err = client
            .login("mwalimu@bidii.ac.ke", "wrong")
            .await
            .expect_err("rejected");

        assert_eq!(err.to_string(), "Invalid Credentials");
        assert_eq!(err.status(), Some(400));
        assert!(navigator.history().is_empty());
        assert!(!client.viewer().expect("viewer").is_authenticated());
    }

    #[tokio::test]
    async fn test_login_failure_without_message_uses_default() {
        let (client, _) = testing::client(FakeTransport::new(|_, _| testing::empty(500)));

        let err = client.login("a@b.c", "pw").await.expect_err("rejected");

        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_login_and_stores_nothing() {
        let transport = FakeTransport::new(|request, _| testing::unreachable(request));
        let (client, navigator) = testing::client(transport.clone());

        let err = client
            .login("mwalimu@bidii.ac.ke", "correct-horse")
            .await
            .expect_err("unreachable");

        assert_eq!(err.kind, ApiErrorKind::Transport);
        assert_eq!(err.to_string(), LOGIN_FAILED);
        assert_eq!(transport.calls().len(), 1);
        assert!(navigator.history().is_empty());
        for key in SessionKey::ALL {
            assert_eq!(client.session().read(key).expect("read"), None);
        }
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected_locally() {
        let transport = login_backend();
        let (client, _) = testing::client(transport.clone());

        let err = client.login("", "pw").await.expect_err("invalid");

        assert_eq!(err.kind, ApiErrorKind::Invalid);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_redirects_home() {
        let (client, navigator) = testing::client(login_backend());
        client
            .session()
            .save(&testing::session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        assert_eq!(client.logout().expect("logout"), "Logged Out Successfully");

        assert_eq!(navigator.last(), Some(Route::Home));
        for key in SessionKey::ALL {
            assert_eq!(client.session().read(key).expect("read"), None);
        }
    }
}
