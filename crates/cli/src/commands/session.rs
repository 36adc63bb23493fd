//! Login, logout and the current user.

use bidii_core::menu_for;
use bidii_portal::PortalClient;

use super::emit;
use crate::error::CliError;

pub async fn login(portal: &PortalClient, email: &str, password: &str) -> Result<(), CliError> {
    let viewer = portal.login(email, password).await?;
    emit([format!(
        "Logged in as {} ({})",
        viewer.email.as_deref().unwrap_or(email),
        viewer.role
    )])
}

pub fn logout(portal: &PortalClient) -> Result<(), CliError> {
    emit([portal.logout()?])
}

pub fn whoami(portal: &PortalClient) -> Result<(), CliError> {
    let viewer = portal.viewer()?;
    if !viewer.is_authenticated() {
        return emit(["Not logged in"]);
    }

    let mut lines = vec![format!(
        "{} ({})",
        viewer.email.as_deref().unwrap_or_default(),
        viewer.role
    )];
    for (title, items) in menu_for(viewer.role) {
        lines.push(String::new());
        lines.push(title.to_owned());
        lines.extend(
            items
                .into_iter()
                .map(|item| format!("  {:<16} {}", item.label, item.route)),
        );
    }
    emit(lines)
}
