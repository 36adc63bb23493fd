//! Screen state for lists, forms and the dashboard.
//!
//! Views hold what a screen shows (records, the current error, the loading
//! flag) and drive the gateway. Rendering is left to the caller.

mod dashboard;
mod form;
mod list;

pub use dashboard::{DashboardView, Panel};
pub use form::{FormMode, FormView};
pub use list::{DeleteOutcome, ListView};

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
