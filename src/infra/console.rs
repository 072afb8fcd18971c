//! Terminal-facing navigation sink and error reporter for the CLI.

use std::io::Write;

use tracing::warn;
use url::Url;

use crate::application::error::SubmissionError;
use crate::application::ports::{ErrorReporter, Navigator};

/// Prints the absolute address of the destination view on stdout.
#[derive(Debug, Clone)]
pub struct ConsoleNavigator {
    site: Url,
}

impl ConsoleNavigator {
    pub fn new(site: Url) -> Self {
        Self { site }
    }

    /// Append the segments of `path` to the site URL, keeping any path
    /// prefix the site is hosted under. `None` when the site URL cannot be a base.
    pub fn resolve(&self, path: &str) -> Option<Url> {
        let mut url = self.site.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Some(url)
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate_to(&self, path: &str) {
        let target = match self.resolve(path) {
            Some(url) => url.to_string(),
            None => {
                warn!(path, site = %self.site, "could not resolve destination against site URL");
                path.to_string()
            }
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{target}") {
            warn!(error = %err, "failed to write destination");
        }
    }
}

/// Writes failures to stderr, one line per failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ErrorReporter for ConsoleReporter {
    fn report(&self, error: &SubmissionError) {
        let mut stderr = std::io::stderr().lock();
        if let Err(err) = writeln!(
            stderr,
            "{} failed: {}",
            error.kind().as_str(),
            error.user_message()
        ) {
            warn!(error = %err, "failed to write error report");
        }
    }
}
