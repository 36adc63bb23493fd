//! Generic CRUD gateway and the non-CRUD reads.
//!
//! Every operation returns `Result<_, ApiError>`: HTTP failures, transport
//! failures and undecodable bodies all come back as an [`ApiError`] with a
//! displayable message. Endpoint paths come from each entity's
//! [`Resource`](bidii_core::Resource).

use bidii_core::{
    AnnouncementFeed, Audience, Draft, Entity, FormBody, Intent, MeetingCreated, MeetingRequest,
    Role, Total, TotalKind,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::client::PortalClient;
use crate::error::{ApiError, Operation};
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Meeting creation endpoint.
pub const MEETING_PATH: &str = "create_meeting/";

/// Result of a create or update.
///
/// The backend answers some writes with the saved record and others with a
/// `{"message": ..}` acknowledgement; whichever was sent is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved<E> {
    pub record: Option<E>,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct Acknowledgement {
    message: String,
}

impl<E: DeserializeOwned> Saved<E> {
    fn from_response(response: &ApiResponse) -> Self {
        Self {
            record: response.json().ok(),
            message: response
                .json::<Acknowledgement>()
                .ok()
                .map(|ack| ack.message),
        }
    }
}

impl<T: Transport> PortalClient<T> {
    // =========================================================================
    // CRUD
    // =========================================================================

    /// Fetch every record of `E`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self), fields(resource = E::RESOURCE.slug()))]
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        let fallback = Operation::List.fallback(E::RESOURCE);
        let response = self
            .checked(&ApiRequest::get(E::RESOURCE.list_path()), &fallback)
            .await?;
        let records: Vec<E> = decode(&response, &fallback)?;
        debug!(count = records.len(), "Fetched records");
        Ok(records)
    }

    /// Fetch one record of `E`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self), fields(resource = E::RESOURCE.slug(), key = %key))]
    pub async fn get<E: Entity>(&self, key: &E::Key) -> Result<E, ApiError> {
        let fallback = Operation::Get.fallback(E::RESOURCE);
        let response = self
            .checked(&ApiRequest::get(E::RESOURCE.item_path(key)), &fallback)
            .await?;
        decode(&response, &fallback)
    }

    /// Create a record of `E` from `draft`.
    ///
    /// The draft is validated before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns an `Invalid` error if validation fails, otherwise `ApiError`
    /// on any failure.
    #[instrument(skip(self, draft), fields(resource = E::RESOURCE.slug()))]
    pub async fn create<E: Entity>(&self, draft: &E::Draft) -> Result<Saved<E>, ApiError> {
        let fallback = Operation::Create.fallback(E::RESOURCE);
        draft.validate(Intent::Create)?;
        let body = draft
            .to_body(Intent::Create)
            .map_err(|_| ApiError::decode(&fallback))?;
        let response = self
            .checked(&ApiRequest::post(E::RESOURCE.create_path(), body), &fallback)
            .await?;
        Ok(Saved::from_response(&response))
    }

    /// Update the record of `E` at `key` with a partial `PATCH`.
    ///
    /// # Errors
    ///
    /// Returns an `Invalid` error if validation fails, otherwise `ApiError`
    /// on any failure.
    #[instrument(skip(self, draft), fields(resource = E::RESOURCE.slug(), key = %key))]
    pub async fn update<E: Entity>(
        &self,
        key: &E::Key,
        draft: &E::Draft,
    ) -> Result<Saved<E>, ApiError> {
        let fallback = Operation::Update.fallback(E::RESOURCE);
        draft.validate(Intent::Update)?;
        let body = draft
            .to_body(Intent::Update)
            .map_err(|_| ApiError::decode(&fallback))?;
        let response = self
            .checked(&ApiRequest::patch(E::RESOURCE.item_path(key), body), &fallback)
            .await?;
        Ok(Saved::from_response(&response))
    }

    /// Delete the record of `E` at `key`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self), fields(resource = E::RESOURCE.slug(), key = %key))]
    pub async fn delete<E: Entity>(&self, key: &E::Key) -> Result<(), ApiError> {
        let fallback = Operation::Delete.fallback(E::RESOURCE);
        self.checked(&ApiRequest::delete(E::RESOURCE.item_path(key)), &fallback)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Dashboard reads
    // =========================================================================

    /// Head count for one population.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self))]
    pub async fn total(&self, kind: TotalKind) -> Result<u64, ApiError> {
        let fallback = format!("Error fetching {}", kind.label().to_lowercase());
        let response = self.checked(&ApiRequest::get(kind.path()), &fallback).await?;
        let total: Total = decode(&response, &fallback)?;
        Ok(total.total)
    }

    /// Announcements targeted at `audience`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on any failure.
    #[instrument(skip(self))]
    pub async fn feed(&self, audience: Audience) -> Result<AnnouncementFeed, ApiError> {
        let fallback = format!("Error fetching {}", audience.label().to_lowercase());
        let response = self
            .checked(&ApiRequest::get(audience.feed_path()), &fallback)
            .await?;
        decode(&response, &fallback)
    }

    // =========================================================================
    // Conferencing
    // =========================================================================

    /// Schedule a meeting on behalf of a viewer with `role`.
    ///
    /// The request is checked against the local clock first; nothing is sent
    /// for a meeting in the past or a role that may not schedule.
    ///
    /// # Errors
    ///
    /// Returns an `Invalid` error if the local check fails, otherwise
    /// `ApiError` on any failure.
    #[instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn schedule_meeting(
        &self,
        role: Role,
        request: &MeetingRequest,
    ) -> Result<MeetingCreated, ApiError> {
        const FALLBACK: &str = "Error creating meeting";
        request.validate(role)?;
        let body = FormBody::json(request).map_err(|_| ApiError::decode(FALLBACK))?;
        let response = self
            .checked(&ApiRequest::post(MEETING_PATH, body), FALLBACK)
            .await?;
        decode(&response, FALLBACK)
    }

    /// Send and turn any non-success status into an `ApiError`.
    async fn checked(&self, request: &ApiRequest, fallback: &str) -> Result<ApiResponse, ApiError> {
        let response = self.send(request).await.map_err(|e| {
            warn!(error = %e, "Request failed");
            ApiError::from(e)
        })?;
        if response.is_success() {
            Ok(response)
        } else {
            warn!(status = response.status, "Request rejected");
            Err(ApiError::rejected(response.status, &response.body, fallback))
        }
    }
}

fn decode<R: DeserializeOwned>(response: &ApiResponse, fallback: &str) -> Result<R, ApiError> {
    response.json().map_err(|e| {
        warn!(error = %e, "Response body did not decode");
        ApiError::decode(fallback)
    })
}
