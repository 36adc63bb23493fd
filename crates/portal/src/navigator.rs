//! Redirect sink.
//!
//! Flows that end on another screen (login, logout, a saved form, an expired
//! session) hand the target [`Route`] to a [`Navigator`] instead of returning
//! it through every layer.

use std::sync::Mutex;

use bidii_core::Route;
use tracing::info;

/// Receives redirects.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Logs each redirect and otherwise ignores it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, route: Route) {
        info!(route = %route, "Redirect");
    }
}

/// Records every redirect in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All redirects so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// The most recent redirect.
    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.history().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        if let Ok(mut history) = self.history.lock() {
            history.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator_keeps_order() {
        let navigator = RecordingNavigator::new();
        navigator.redirect(Route::Login);
        navigator.redirect(Route::Dashboard);
        assert_eq!(navigator.history(), vec![Route::Login, Route::Dashboard]);
        assert_eq!(navigator.last(), Some(Route::Dashboard));
    }
}
