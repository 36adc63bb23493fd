//! Authenticated API client.
//!
//! Every request carries the stored access token. A `401` triggers one token
//! refresh and one replay of the original request. Concurrent requests that
//! hit `401` together share a single refresh: the first takes the refresh
//! gate, the rest wait on it and then reuse the token it stored.
//!
//! When the refresh itself fails the session is purged, the navigator is sent
//! to the login screen, and the caller gets [`ClientError::SessionExpired`].

use std::sync::Arc;

use bidii_core::{FormBody, Route, Viewer};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::PortalConfig;
use crate::error::ClientError;
use crate::navigator::Navigator;
use crate::store::{FileStore, SessionState, StoreError};
use crate::transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "token/refresh/";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Client for the portal backend.
///
/// Cheap to clone; clones share the transport, the session and the refresh
/// gate.
pub struct PortalClient<T: Transport = ReqwestTransport> {
    inner: Arc<PortalClientInner<T>>,
}

impl<T: Transport> Clone for PortalClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PortalClientInner<T> {
    transport: T,
    session: SessionState,
    navigator: Arc<dyn Navigator>,
    /// Held for the duration of a token refresh.
    refresh_gate: Mutex<()>,
}

impl PortalClient<ReqwestTransport> {
    /// Build a client over HTTP with the session persisted to the configured
    /// file.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Store` if the session file cannot be read, or
    /// `ClientError::Transport` if the HTTP client cannot be created.
    pub fn from_config(
        config: &PortalConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let store = FileStore::open(config.session_file())?;
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(
            transport,
            SessionState::new(Arc::new(store)),
            navigator,
        ))
    }
}

impl<T: Transport> PortalClient<T> {
    #[must_use]
    pub fn new(transport: T, session: SessionState, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner: Arc::new(PortalClientInner {
                transport,
                session,
                navigator,
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    #[must_use]
    pub fn navigator(&self) -> &dyn Navigator {
        self.inner.navigator.as_ref()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// The viewer context for the stored session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the session cannot be read.
    pub fn viewer(&self) -> Result<Viewer, StoreError> {
        self.inner.session.viewer()
    }

    /// Send a request with the stored access token.
    ///
    /// Non-`401` responses are returned as they are, error statuses included.
    /// On `401` the token is refreshed and the request replayed once; the
    /// replay's response is returned whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SessionExpired` if the refresh fails,
    /// `ClientError::Transport` if a request never completes, or
    /// `ClientError::Store` if the session cannot be read.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let token = self.inner.session.access_token()?;
        let response = self.inner.transport.send(request, token.as_ref()).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!("Access token rejected");
        let fresh = self.refresh_after(token.as_ref()).await?;
        let replay = self.inner.transport.send(request, Some(&fresh)).await?;
        if replay.is_unauthorized() {
            warn!("Request rejected again after token refresh");
        }
        Ok(replay)
    }

    /// Send a request without a token and without refresh handling.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the request never completes.
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.path))]
    pub async fn send_anonymous(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        Ok(self.inner.transport.send(request, None).await?)
    }

    /// Get a usable token after `stale` was rejected.
    ///
    /// Waits for any refresh already in flight. If that refresh stored a
    /// different token, it is reused without another round trip. If it failed
    /// and purged the session, this fails too without a second redirect.
    async fn refresh_after(
        &self,
        stale: Option<&SecretString>,
    ) -> Result<SecretString, ClientError> {
        let _gate = self.inner.refresh_gate.lock().await;

        match self.inner.session.access_token()? {
            Some(current) => {
                let replaced =
                    stale.is_none_or(|stale| stale.expose_secret() != current.expose_secret());
                if replaced {
                    debug!("Reusing token from concurrent refresh");
                    return Ok(current);
                }
            }
            // A concurrent refresh failed and already purged the session.
            None if stale.is_some() => {
                debug!("Session purged by concurrent refresh");
                return Err(ClientError::SessionExpired);
            }
            None => {}
        }

        if let Some(token) = self.refresh().await {
            return Ok(token);
        }

        if let Err(e) = self.inner.session.clear() {
            warn!(error = %e, "Failed to clear session after refresh failure");
        }
        self.inner.navigator.redirect(Route::Login);
        Err(ClientError::SessionExpired)
    }

    /// Exchange the refresh token for a new access token and store it.
    ///
    /// Returns `None` on any failure; the reason is logged.
    #[instrument(skip(self))]
    async fn refresh(&self) -> Option<SecretString> {
        let refresh = match self.inner.session.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No refresh token stored");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token");
                return None;
            }
        };

        let body = FormBody::json(&RefreshRequest {
            refresh: refresh.expose_secret(),
        })
        .ok()?;
        let response = match self
            .inner
            .transport
            .send(&ApiRequest::post(REFRESH_PATH, body), None)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh request failed");
                return None;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "Token refresh rejected");
            return None;
        }

        let access = match response.json::<RefreshResponse>() {
            Ok(body) => body.access,
            Err(e) => {
                warn!(error = %e, "Token refresh response unreadable");
                return None;
            }
        };
        if let Err(e) = self.inner.session.set_access_token(&access) {
            warn!(error = %e, "Failed to store refreshed token");
            return None;
        }
        debug!("Access token refreshed");
        Some(SecretString::from(access))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bidii_core::SessionKey;
    use serde_json::json;

    use super::*;
    use crate::testing::{self, FakeTransport, empty, session_with};

    /// Accepts only `good`; the refresh endpoint hands out `good`.
    fn backend(good: &'static str) -> FakeTransport {
        FakeTransport::new(move |request, bearer| {
            if request.path == REFRESH_PATH {
                return testing::json(200, &json!({ "access": good }));
            }
            if bearer == Some(good) {
                testing::json(200, &json!([]))
            } else {
                empty(401)
            }
        })
    }

    #[tokio::test]
    async fn test_send_attaches_stored_token() {
        let transport = backend("acc-1");
        let (client, _) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let response = client.send(&ApiRequest::get("create_class/")).await.expect("send");

        assert_eq!(response.status, 200);
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].bearer.as_deref(), Some("acc-1"));
    }

    #[tokio::test]
    async fn test_401_refreshes_and_replays_once() {
        let transport = backend("acc-2");
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let response = client.send(&ApiRequest::get("create_class/")).await.expect("send");

        assert_eq!(response.status, 200);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(transport.calls_to("create_class/"), 2);

        let refresh_call = transport
            .calls()
            .into_iter()
            .find(|call| call.path == REFRESH_PATH)
            .expect("refresh call");
        assert_eq!(refresh_call.bearer, None);
        assert_eq!(
            refresh_call.body,
            Some(FormBody::Json(json!({ "refresh": "ref-1" })))
        );

        let stored = client.session().access_token().expect("read").expect("token");
        assert_eq!(stored.expose_secret(), "acc-2");
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_purges_session_and_redirects() {
        let transport = FakeTransport::new(|request, _| {
            if request.path == REFRESH_PATH {
                testing::json(401, &json!({ "detail": "Token is blacklisted" }))
            } else {
                empty(401)
            }
        });
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_teacher"))
            .expect("save");

        let err = client
            .send(&ApiRequest::get("create_exam/"))
            .await
            .expect_err("expired");

        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(navigator.history(), vec![Route::Login]);
        for key in SessionKey::ALL {
            assert_eq!(client.session().read(key).expect("read"), None);
        }
        assert_eq!(transport.calls_to("create_exam/"), 1);
    }

    #[tokio::test]
    async fn test_unreachable_refresh_endpoint_expires_session() {
        let transport = FakeTransport::new(|request, _| {
            if request.path == REFRESH_PATH {
                testing::unreachable(request)
            } else {
                empty(401)
            }
        });
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_parent"))
            .expect("save");

        let err = client
            .send(&ApiRequest::get("create_cat/"))
            .await
            .expect_err("expired");

        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(navigator.history(), vec![Route::Login]);
        for key in SessionKey::ALL {
            assert_eq!(client.session().read(key).expect("read"), None);
        }
    }

    #[tokio::test]
    async fn test_concurrent_refresh_failure_redirects_once() {
        let transport = FakeTransport::new(|request, _| {
            if request.path == REFRESH_PATH {
                testing::json(401, &json!({ "detail": "Token is blacklisted" }))
            } else {
                empty(401)
            }
        })
        .with_delay(Duration::from_millis(20));
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let req_a = ApiRequest::get("create_class/");
        let req_b = ApiRequest::get("create_stream/");
        let req_c = ApiRequest::get("create_subject/");
        let (a, b, c) = tokio::join!(
            client.send(&req_a),
            client.send(&req_b),
            client.send(&req_c),
        );
        for result in [a, b, c] {
            assert!(matches!(result, Err(ClientError::SessionExpired)));
        }

        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(navigator.history(), vec![Route::Login]);
        assert!(client.session().access_token().expect("read").is_none());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_expires_session() {
        let transport = FakeTransport::new(|_, _| empty(401));
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .write(SessionKey::AccessToken, "acc-1")
            .expect("write");

        let err = client
            .send(&ApiRequest::get("create_role/"))
            .await
            .expect_err("expired");

        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
        assert_eq!(navigator.last(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_replay_401_is_returned_without_second_refresh() {
        let transport = FakeTransport::new(|request, _| {
            if request.path == REFRESH_PATH {
                testing::json(200, &json!({ "access": "acc-2" }))
            } else {
                empty(401)
            }
        });
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let response = client.send(&ApiRequest::get("create_role/")).await.expect("send");

        assert_eq!(response.status, 401);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
        assert_eq!(transport.calls_to("create_role/"), 2);
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let transport = FakeTransport::new(|_, _| testing::json(403, &json!({ "detail": "no" })));
        let (client, _) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let response = client.send(&ApiRequest::delete("class_info/1/")).await.expect("send");

        assert_eq!(response.status, 403);
        assert_eq!(transport.calls_to(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let transport = FakeTransport::new(move |request, bearer| {
            if request.path == REFRESH_PATH {
                counter.fetch_add(1, Ordering::SeqCst);
                return testing::json(200, &json!({ "access": "acc-2" }));
            }
            if bearer == Some("acc-2") {
                testing::json(200, &json!([]))
            } else {
                empty(401)
            }
        })
        .with_delay(Duration::from_millis(20));
        let (client, _) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let requests = ["create_class/", "create_stream/", "create_subject/"]
            .map(|path| {
                let client = client.clone();
                tokio::spawn(async move { client.send(&ApiRequest::get(path)).await })
            });
        for handle in requests {
            let response = handle.await.expect("join").expect("send");
            assert_eq!(response.status, 200);
        }

        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls_to(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn test_anonymous_send_skips_token_and_refresh() {
        let transport = FakeTransport::new(|_, _| empty(401));
        let (client, navigator) = testing::client(transport.clone());
        client
            .session()
            .save(&session_with("acc-1", "ref-1", "is_admin"))
            .expect("save");

        let response = client
            .send_anonymous(&ApiRequest::get("user_login/"))
            .await
            .expect("send");

        assert_eq!(response.status, 401);
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].bearer, None);
        assert!(navigator.history().is_empty());
    }
}
