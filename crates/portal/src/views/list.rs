//! Filterable record list with confirmed delete.

use bidii_core::{Entity, Rows};
use tracing::{debug, instrument};

use super::Confirm;
use crate::client::PortalClient;
use crate::transport::Transport;

/// What a delete request came to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Cancelled,
    Deleted,
    /// The backend refused; the message is also kept as the view's error.
    Failed(String),
}

/// State of a list screen for `E`.
#[derive(Debug, Clone)]
pub struct ListView<E: Entity> {
    records: Vec<E>,
    error: Option<String>,
    loading: bool,
    query: String,
}

impl<E: Entity> Default for ListView<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            error: None,
            loading: false,
            query: String::new(),
        }
    }
}

impl<E: Entity> ListView<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[E] {
        &self.records
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Fetch the records, replacing the current list or recording the error.
    #[instrument(skip_all, fields(resource = E::RESOURCE.slug()))]
    pub async fn load<T: Transport>(&mut self, client: &PortalClient<T>) {
        self.loading = true;
        match client.list::<E>().await {
            Ok(records) => {
                self.records = records;
                self.error = None;
            }
            Err(err) => self.error = Some(err.message),
        }
        self.loading = false;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// The rows to show for the current query.
    #[must_use]
    pub fn rows(&self) -> Rows<'_, E> {
        Rows::build(&self.records, &self.query)
    }

    /// Delete the record at `key` after the user confirms.
    ///
    /// The list is fetched again afterwards whether or not the delete
    /// succeeded; nothing is removed locally.
    #[instrument(skip_all, fields(resource = E::RESOURCE.slug(), key = %key))]
    pub async fn delete<T: Transport>(
        &mut self,
        client: &PortalClient<T>,
        key: &E::Key,
        confirm: &impl Confirm,
    ) -> DeleteOutcome {
        let prompt = format!("Delete {}?", E::RESOURCE.label());
        if !confirm.confirm(&prompt) {
            debug!("Delete cancelled");
            return DeleteOutcome::Cancelled;
        }

        let outcome = match client.delete::<E>(key).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(err) => DeleteOutcome::Failed(err.message),
        };
        self.load(client).await;
        if let DeleteOutcome::Failed(message) = &outcome {
            self.error = Some(message.clone());
        }
        outcome
    }
}
