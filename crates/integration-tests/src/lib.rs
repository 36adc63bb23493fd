//! Bidii Integration Tests
//!
//! An in-process mock of the school backend, served with axum on a loopback
//! port, and helpers for pointing a real [`PortalClient`] at it.
//!
//! The mock issues numbered token pairs on login, accepts only the most
//! recently issued access token, and records every request it sees so tests
//! can assert on what went over the wire.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bidii-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::BTreeMap;
use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path as UrlPath, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bidii_portal::{PortalClient, PortalConfig, RecordingNavigator};
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Password shared by every seeded account.
pub const PASSWORD: &str = "bidii-pass";

pub const ADMIN_EMAIL: &str = "admin@bidii.ac.ke";
pub const TEACHER_EMAIL: &str = "teacher@bidii.ac.ke";
pub const PARENT_EMAIL: &str = "parent@bidii.ac.ke";
pub const STUDENT_EMAIL: &str = "student@bidii.ac.ke";

/// Head counts served by the totals endpoints.
pub const TOTAL_STUDENTS: u64 = 412;
pub const TOTAL_PARENTS: u64 = 367;

/// A client wired to the mock, and the navigator recording its redirects.
pub type TestClient = (PortalClient, Arc<RecordingNavigator>);

// =============================================================================
// Shared state
// =============================================================================

/// A request as the mock saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    /// Path below `/api/`, e.g. `class_info/3/`.
    pub path: String,
    pub bearer: Option<String>,
}

/// One part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub value: String,
}

#[derive(Debug)]
struct Backend {
    issued: u32,
    access_token: Option<String>,
    refresh_token: Option<String>,
    refresh_enabled: bool,
    refresh_delay: Duration,
    lists_failing: bool,
    requests: Vec<Recorded>,
    classes: BTreeMap<i64, String>,
    next_class_id: i64,
    teachers: Vec<Value>,
    uploads: Vec<Vec<ReceivedPart>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            issued: 0,
            access_token: None,
            refresh_token: None,
            refresh_enabled: true,
            refresh_delay: Duration::ZERO,
            lists_failing: false,
            requests: Vec::new(),
            classes: BTreeMap::new(),
            next_class_id: 1,
            teachers: Vec::new(),
            uploads: Vec::new(),
        }
    }
}

impl Backend {
    fn issue_access(&mut self) -> String {
        self.issued += 1;
        let token = format!("access-{}", self.issued);
        self.access_token = Some(token.clone());
        token
    }
}

#[derive(Clone, Default)]
struct MockState {
    backend: Arc<Mutex<Backend>>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Server
// =============================================================================

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    server: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Bind a loopback port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if no port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = MockState::default();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL to configure the client with.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// A client talking to this backend over HTTP, persisting its session to
    /// `session_file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected or the client cannot
    /// be built.
    pub fn client(&self, session_file: &Path) -> Result<TestClient, Box<dyn Error>> {
        let config = PortalConfig::new(
            &self.api_url(),
            session_file.to_path_buf(),
            Duration::from_secs(5),
        )?;
        let navigator = Arc::new(RecordingNavigator::new());
        let client = PortalClient::from_config(&config, navigator.clone())?;
        Ok((client, navigator))
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Invalidate the current access token, as if it had expired.
    pub fn expire_access_token(&self) {
        self.state.lock().access_token = None;
    }

    /// Make the refresh endpoint reject every refresh token.
    pub fn reject_refresh(&self) {
        self.state.lock().refresh_enabled = false;
    }

    /// Hold every refresh response for `delay`.
    pub fn delay_refresh(&self, delay: Duration) {
        self.state.lock().refresh_delay = delay;
    }

    /// Make every list endpoint answer `500` with an empty body.
    pub fn fail_lists(&self) {
        self.state.lock().lists_failing = true;
    }

    pub fn seed_classes(&self, names: &[&str]) {
        let mut backend = self.state.lock();
        for name in names {
            let id = backend.next_class_id;
            backend.next_class_id += 1;
            backend.classes.insert(id, (*name).to_owned());
        }
    }

    // -------------------------------------------------------------------------
    // Observations
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().requests.clone()
    }

    /// How many requests hit `path` (relative to `/api/`).
    #[must_use]
    pub fn calls_to(&self, path: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.path == path)
            .count()
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.calls_to("token/refresh/")
    }

    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        self.state.lock().classes.values().cloned().collect()
    }

    /// Parts of every multipart registration received, oldest first.
    #[must_use]
    pub fn uploads(&self) -> Vec<Vec<ReceivedPart>> {
        self.state.lock().uploads.clone()
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A backend, a client pointed at it, and the directory holding the client's
/// session file.
pub struct Harness {
    pub backend: MockBackend,
    pub client: PortalClient,
    pub navigator: Arc<RecordingNavigator>,
    dir: TempDir,
}

impl Harness {
    /// Start a backend and connect a client with an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server or the client cannot be set up.
    pub async fn start() -> Result<Self, Box<dyn Error>> {
        let backend = MockBackend::start().await?;
        let dir = tempfile::tempdir()?;
        let (client, navigator) = backend.client(&dir.path().join("session.json"))?;
        Ok(Self {
            backend,
            client,
            navigator,
            dir,
        })
    }

    /// Start a backend and sign in as `email`.
    ///
    /// # Errors
    ///
    /// Returns an error if set-up or the login fails.
    pub async fn signed_in(email: &str) -> Result<Self, Box<dyn Error>> {
        let harness = Self::start().await?;
        harness.client.login(email, PASSWORD).await?;
        Ok(harness)
    }

    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    /// The session file as a key/value map; empty if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not a JSON object.
    pub fn stored_session(&self) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
        match std::fs::read_to_string(self.session_file()) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn router(state: MockState) -> Router {
    let protected = Router::new()
        .route("/create_class/", get(list_classes).post(create_class))
        .route(
            "/class_info/{id}/",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route("/fetch_all_teachers/", get(list_teachers))
        .route("/all_students/", get(|| total(TOTAL_STUDENTS)))
        .route("/all_parents/", get(|| total(TOTAL_PARENTS)))
        .route("/all_teachers/", get(total_teachers))
        .route(
            "/teacher_targeted_announcements/",
            get(|| feed("Teachers")),
        )
        .route("/parent_targeted_announcements/", get(|| feed("Parents")))
        .route(
            "/student_targeted_announcements/",
            get(|| feed("Students")),
        )
        .route("/admin_targeted_announcements/", get(|| feed("Admins")))
        .route("/create_meeting/", post(create_meeting))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_access_token,
        ));

    let public = Router::new()
        .route("/user_login/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/create_teacher/", post(register_teacher));

    Router::new()
        .nest("/api", public.merge(protected))
        .fallback(unrouted)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// Middleware
// =============================================================================

fn bearer(request: &Request) -> Option<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

async fn record(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let recorded = Recorded {
        method: request.method().clone(),
        path: request
            .uri()
            .path()
            .trim_start_matches("/api/")
            .to_owned(),
        bearer: bearer(&request),
    };
    state.lock().requests.push(recorded);
    next.run(request).await
}

async fn require_access_token(
    State(state): State<MockState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = bearer(&request);
    let accepted = {
        let backend = state.lock();
        presented.is_some() && presented == backend.access_token
    };
    if accepted {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "detail": "Given token not valid for any token type",
                "code": "token_not_valid"
            })),
        )
            .into_response()
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    let (user_id, flag) = match body.email.as_str() {
        ADMIN_EMAIL => (1, "is_admin"),
        TEACHER_EMAIL => (2, "is_teacher"),
        PARENT_EMAIL => (3, "is_parent"),
        STUDENT_EMAIL => (4, "is_student"),
        _ => return invalid_credentials(),
    };
    if body.password != PASSWORD {
        return invalid_credentials();
    }

    let mut backend = state.lock();
    let access = backend.issue_access();
    let refresh = format!("refresh-{}", backend.issued);
    backend.refresh_token = Some(refresh.clone());

    let mut response = json!({
        "access_token": access,
        "refresh_token": refresh,
        "user_id": user_id,
        "user_email": body.email,
        "first_letter": body.email.chars().next().map(|c| c.to_ascii_uppercase().to_string()),
        "is_admin": false,
        "is_teacher": false,
        "is_student": false,
        "is_parent": false,
        "teacher_profile_picture": null,
        "parent_profile_picture": null
    });
    response[flag] = Value::Bool(true);
    (StatusCode::OK, Json(response)).into_response()
}

fn invalid_credentials() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid credentials" })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

async fn refresh(State(state): State<MockState>, Json(body): Json<RefreshBody>) -> Response {
    let delay = state.lock().refresh_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut backend = state.lock();
    if backend.refresh_enabled && backend.refresh_token.as_deref() == Some(body.refresh.as_str())
    {
        let access = backend.issue_access();
        (StatusCode::OK, Json(json!({ "access": access }))).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "detail": "Token is invalid or expired",
                "code": "token_not_valid"
            })),
        )
            .into_response()
    }
}

// =============================================================================
// Classes
// =============================================================================

fn class_json(id: i64, name: &str) -> Value {
    json!({ "id": id, "name": name })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

/// Any path the mock does not model. Reads fail like the modelled lists
/// while `fail_lists` is set.
async fn unrouted(State(state): State<MockState>, method: Method) -> Response {
    if method == Method::GET && state.lock().lists_failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    not_found()
}

async fn list_classes(State(state): State<MockState>) -> Response {
    let backend = state.lock();
    if backend.lists_failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let classes: Vec<Value> = backend
        .classes
        .iter()
        .map(|(id, name)| class_json(*id, name))
        .collect();
    Json(classes).into_response()
}

#[derive(Deserialize)]
struct ClassBody {
    #[serde(default)]
    name: Option<String>,
}

async fn create_class(State(state): State<MockState>, Json(body): Json<ClassBody>) -> Response {
    let name = body.name.unwrap_or_default();
    let mut backend = state.lock();
    if backend.classes.values().any(|existing| *existing == name) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "name": ["class with this name already exists."] })),
        )
            .into_response();
    }
    let id = backend.next_class_id;
    backend.next_class_id += 1;
    backend.classes.insert(id, name);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Class created successfully" })),
    )
        .into_response()
}

async fn get_class(State(state): State<MockState>, UrlPath(id): UrlPath<i64>) -> Response {
    state
        .lock()
        .classes
        .get(&id)
        .map_or_else(not_found, |name| Json(class_json(id, name)).into_response())
}

async fn update_class(
    State(state): State<MockState>,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<ClassBody>,
) -> Response {
    let mut backend = state.lock();
    let Some(stored) = backend.classes.get_mut(&id) else {
        return not_found();
    };
    if let Some(name) = body.name {
        *stored = name;
    }
    Json(class_json(id, stored)).into_response()
}

async fn delete_class(State(state): State<MockState>, UrlPath(id): UrlPath<i64>) -> Response {
    match state.lock().classes.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

// =============================================================================
// Teachers
// =============================================================================

async fn list_teachers(State(state): State<MockState>) -> Response {
    let backend = state.lock();
    if backend.lists_failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(backend.teachers.clone()).into_response()
}

async fn register_teacher(State(state): State<MockState>, mut multipart: Multipart) -> Response {
    let mut parts = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_owned();
                let file_name = field.file_name().map(str::to_owned);
                let value = match field.bytes().await {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => return (e.status(), e.body_text()).into_response(),
                };
                parts.push(ReceivedPart {
                    name,
                    file_name,
                    value,
                });
            }
            Ok(None) => break,
            Err(e) => return (e.status(), e.body_text()).into_response(),
        }
    }

    let text = |name: &str| {
        parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| part.value.clone())
            .unwrap_or_default()
    };
    let mut backend = state.lock();
    let id = backend.teachers.len() + 1;
    let teacher = json!({
        "id": id,
        "user": {
            "first_name": text("user.first_name"),
            "last_name": text("user.last_name"),
            "username": text("user.username"),
            "email": text("user.email")
        },
        "phone": text("phone"),
        "address": text("address"),
        "teacher_code": format!("TCH{id:03}"),
        "profile_picture": parts
            .iter()
            .find(|part| part.name == "profile_picture")
            .and_then(|part| part.file_name.clone())
    });
    backend.teachers.push(teacher);
    backend.uploads.push(parts);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Teacher registered successfully" })),
    )
        .into_response()
}

// =============================================================================
// Dashboard and conferencing
// =============================================================================

async fn total(count: u64) -> Json<Value> {
    Json(json!({ "Total": count }))
}

async fn total_teachers(State(state): State<MockState>) -> Json<Value> {
    let count = state.lock().teachers.len();
    Json(json!({ "Total": count }))
}

async fn feed(audience: &'static str) -> Json<Value> {
    Json(json!({
        "message": format!("Announcements for {audience}"),
        "Total": 1,
        "Announcements": [{
            "id": 1,
            "title": format!("{audience} briefing"),
            "description": "Term dates are out.",
            "date_created": "2026-09-01T08:00:00+03:00"
        }]
    }))
}

async fn create_meeting(Json(body): Json<Value>) -> Response {
    if body.get("topic").and_then(Value::as_str).is_none_or(str::is_empty) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Topic is required" })),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "join_url": "https://zoom.us/j/81234567890",
            "meeting_id": 81_234_567_890_i64,
            "password": "b1d11"
        })),
    )
        .into_response()
}
