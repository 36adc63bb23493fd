//! Role-gated dashboard.

use bidii_core::{Action, AnnouncementFeed, Audience, DashboardPanel, TotalKind, Viewer};
use tracing::{instrument, warn};

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::transport::Transport;

/// One fetched dashboard value, or why it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> From<Result<T, ApiError>> for Panel<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "Dashboard panel failed");
                Self {
                    data: None,
                    error: Some(err.message),
                }
            }
        }
    }
}

/// Dashboard state for one viewer.
///
/// Only the panels the viewer's role may see are fetched. Each fetch stands
/// alone: one failing leaves the others intact.
#[derive(Debug, Clone)]
pub struct DashboardView {
    viewer: Viewer,
    totals: Vec<(TotalKind, Panel<u64>)>,
    feeds: Vec<(Audience, Panel<AnnouncementFeed>)>,
}

impl DashboardView {
    #[must_use]
    pub const fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            totals: Vec::new(),
            feeds: Vec::new(),
        }
    }

    #[must_use]
    pub const fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    #[must_use]
    pub fn totals(&self) -> &[(TotalKind, Panel<u64>)] {
        &self.totals
    }

    #[must_use]
    pub fn feeds(&self) -> &[(Audience, Panel<AnnouncementFeed>)] {
        &self.feeds
    }

    /// Actions offered to the viewer ("New Meeting", "New Announcement").
    #[must_use]
    pub fn actions(&self) -> Vec<Action> {
        Action::allowed_for(self.viewer.role)
    }

    /// Fetch every panel visible to the viewer.
    #[instrument(skip_all, fields(role = %self.viewer.role))]
    pub async fn load<T: Transport>(&mut self, client: &PortalClient<T>) {
        self.totals.clear();
        self.feeds.clear();
        for panel in DashboardPanel::visible_to(self.viewer.role) {
            match panel {
                DashboardPanel::Totals => {
                    for kind in TotalKind::ALL {
                        let panel = Panel::from(client.total(kind).await);
                        self.totals.push((kind, panel));
                    }
                }
                DashboardPanel::Announcements(audience) => {
                    let panel = Panel::from(client.feed(audience).await);
                    self.feeds.push((audience, panel));
                }
            }
        }
    }
}
