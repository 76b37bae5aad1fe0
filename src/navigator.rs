//! Redirect boundary used when a session cannot be recovered

use tracing::warn;

/// Sends the user to another client-side location
pub trait Navigator: Send + Sync + 'static {
    fn redirect(&self, path: &str);
}

/// Navigator for headless use: only records the redirect in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        warn!(path = %path, "Session ended, login required");
    }
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn redirect(&self, path: &str) {
        self(path)
    }
}
