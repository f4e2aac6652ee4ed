//! The navigation capability the inbound stage dispatches to on 401.
//!
//! The host decides what "navigate" means. In a browsing context it is a
//! full top-level load of the login page; elsewhere it may be a log line or
//! a recorded flag the host polls.

use std::sync::{Arc, Mutex};

use tracing::info;

/// Fire-and-forget navigation to an href.
///
/// Called once per unauthorized response. Concurrent 401s each call it, so
/// implementations must tolerate repeated calls with the same href.
pub trait Navigator: Send + Sync {
    fn navigate(&self, href: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, href: &str) {
        self(href)
    }
}

/// Emits a tracing event instead of navigating.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, href: &str) {
        info!(href, "navigating to login page");
    }
}

/// Records every href it is asked to navigate to. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    hrefs: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hrefs(&self) -> Vec<String> {
        self.hrefs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.hrefs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, href: &str) {
        self.hrefs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(href.to_string());
    }
}
