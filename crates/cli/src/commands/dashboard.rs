//! Dashboard summary.

use bidii_portal::PortalClient;
use bidii_portal::views::DashboardView;

use super::emit;
use crate::error::CliError;

pub async fn show(portal: &PortalClient) -> Result<(), CliError> {
    let viewer = portal.viewer()?;
    if !viewer.is_authenticated() {
        return emit(["Not logged in"]);
    }
    let mut view = DashboardView::new(viewer);
    view.load(portal).await;

    let mut lines = Vec::new();
    for (kind, panel) in view.totals() {
        lines.push(match (&panel.data, &panel.error) {
            (Some(total), _) => format!("{:<16} {total}", kind.label()),
            (None, error) => format!(
                "{:<16} unavailable ({})",
                kind.label(),
                error.as_deref().unwrap_or_default()
            ),
        });
    }

    for (audience, panel) in view.feeds() {
        lines.push(String::new());
        lines.push(audience.label().to_owned());
        match (&panel.data, &panel.error) {
            (Some(feed), _) if feed.announcements.is_empty() => lines.push("  (none)".to_owned()),
            (Some(feed), _) => lines.extend(feed.announcements.iter().map(|announcement| {
                format!("  {}: {}", announcement.title, announcement.description)
            })),
            (None, error) => lines.push(format!("  {}", error.as_deref().unwrap_or_default())),
        }
    }

    let actions = view.actions();
    if !actions.is_empty() {
        lines.push(String::new());
        lines.push(
            actions
                .iter()
                .map(|action| format!("[{}] {}", action.label(), action.route()))
                .collect::<Vec<_>>()
                .join("  "),
        );
    }
    emit(lines)
}
