//! Command implementations.

pub mod dashboard;
pub mod meeting;
pub mod records;
pub mod session;

use std::io::{self, Write};
use std::sync::Arc;

use bidii_portal::{PortalClient, PortalConfig, TracingNavigator};

use crate::error::CliError;

/// Build a client from the environment.
pub fn connect() -> Result<PortalClient, CliError> {
    let config = PortalConfig::from_env()?;
    tracing::debug!(
        api_url = %config.api_url(),
        session_file = %config.session_file().display(),
        "Loaded configuration"
    );
    Ok(PortalClient::from_config(&config, Arc::new(TracingNavigator))?)
}

/// Write lines to stdout.
pub fn emit<I, S>(lines: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    Ok(())
}

/// Render rows as a plain aligned table.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let dashes: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.iter().copied(), &widths));
    lines.push(render_row(dashes.iter().map(String::as_str), &widths));
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_aligns_columns() {
        let lines = table(
            &["Name", "Code"],
            &[
                vec!["Wanjiru Kamau".to_owned(), "T-1".to_owned()],
                vec!["Ali".to_owned(), "T-22".to_owned()],
            ],
        );
        assert_eq!(
            lines,
            vec![
                "Name           Code",
                "-------------  ----",
                "Wanjiru Kamau  T-1",
                "Ali            T-22",
            ]
        );
    }
}
