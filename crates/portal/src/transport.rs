//! HTTP transport.
//!
//! Requests are plain data ([`ApiRequest`]) so that the client can send the
//! same request twice when it replays after a token refresh. The transport
//! only moves bytes; status handling belongs to the client.

use std::future::Future;

use bidii_core::{FormBody, FormField};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::PortalConfig;

/// Errors raised before a status code is available.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint {0}: {1}")]
    InvalidPath(String, url::ParseError),
}

/// HTTP verbs used by the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<FormBody>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: FormBody) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn patch(path: impl Into<String>, body: FormBody) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }
}

/// A raw response: status and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Sends requests to the backend.
///
/// `bearer` is attached as an `Authorization: Bearer` header when present.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be created.
    pub fn new(config: &PortalConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url().clone(),
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Transport for ReqwestTransport {
    #[instrument(skip(self, request, bearer), fields(method = request.method.as_str(), path = %request.path))]
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| TransportError::InvalidPath(request.path.clone(), e))?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Patch => self.client.patch(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }
        builder = match &request.body {
            Some(FormBody::Json(value)) => builder.json(value),
            Some(FormBody::Multipart(fields)) => builder.multipart(multipart_form(fields)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "Response received");

        Ok(ApiResponse { status, body })
    }
}

fn multipart_form(fields: &[FormField]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, upload } => {
                let part = Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.content_type)?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}
