//! Test doubles shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bidii_core::{FormBody, LoginResponse, Session};
use secrecy::{ExposeSecret, SecretString};

use crate::client::PortalClient;
use crate::navigator::RecordingNavigator;
use crate::store::SessionState;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport, TransportError};

type Handler = dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, TransportError> + Send + Sync;

/// One request as the fake backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<FormBody>,
}

/// A transport answering from a closure and logging every call.
#[derive(Clone)]
pub struct FakeTransport {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<Call>>>,
    delay: Duration,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Delay every answer, so concurrent requests overlap.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|call| call.path == path).count()
    }
}

impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<ApiResponse, TransportError> {
        let bearer = bearer.map(|token| token.expose_secret().to_owned());
        self.calls.lock().expect("calls lock").push(Call {
            method: request.method,
            path: request.path.clone(),
            bearer: bearer.clone(),
            body: request.body.clone(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.handler)(request, bearer.as_deref())
    }
}

pub fn json(status: u16, body: &serde_json::Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        body: serde_json::to_vec(body).expect("json body"),
    })
}

pub fn empty(status: u16) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        body: Vec::new(),
    })
}

/// A request that never produced a status code.
pub fn unreachable(request: &ApiRequest) -> Result<ApiResponse, TransportError> {
    Err(TransportError::InvalidPath(
        request.path.clone(),
        url::ParseError::EmptyHost,
    ))
}

/// A saved session for the given role flag (`"is_admin"`, `"is_teacher"`, ...).
pub fn session_with(access: &str, refresh: &str, flag: &str) -> Session {
    let mut body = serde_json::json!({
        "access_token": access,
        "refresh_token": refresh,
        "user_id": 7,
        "user_email": "user@bidii.ac.ke",
        "first_letter": "U"
    });
    body[flag] = serde_json::Value::Bool(true);
    let response: LoginResponse = serde_json::from_value(body).expect("login body");
    Session::from(response)
}

/// A client over `transport` with a fresh in-memory session.
pub fn client(transport: FakeTransport) -> (PortalClient<FakeTransport>, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new());
    let client = PortalClient::new(transport, SessionState::in_memory(), navigator.clone());
    (client, navigator)
}
