//! Test utilities: mock fetcher and recording reporter.
//!
//! Handwritten mocks for dependency injection in unit tests. Shared state
//! uses `Arc<Mutex<_>>` so clones handed to workers record into the same place.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::report::{RunEvent, RunReporter};
use crate::traits::Fetcher;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Page {
    Html { body: String, delay: Duration },
    Fail(String),
}

/// Mock fetcher serving canned pages per URL.
///
/// Unknown URLs fail with an HTTP 404 error. Tracks the peak number of
/// fetches in flight at once across all clones.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: HashMap<String, Page>,
    requested: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.delayed_page(url, html, Duration::ZERO)
    }

    /// Serve `html` after sleeping for `delay`, to shuffle completion order.
    pub fn delayed_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
        self.pages.insert(
            url.to_string(),
            Page::Html {
                body: html.to_string(),
                delay,
            },
        );
        self
    }

    pub fn failing(mut self, url: &str, message: &str) -> Self {
        self.pages
            .insert(url.to_string(), Page::Fail(message.to_string()));
        self
    }

    pub fn is_failing(&self, url: &str) -> bool {
        !matches!(self.pages.get(url), Some(Page::Html { .. }))
    }

    pub fn html_for(&self, url: &str) -> Option<String> {
        match self.pages.get(url) {
            Some(Page::Html { body, .. }) => Some(body.clone()),
            _ => None,
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = match self.pages.get(url).cloned() {
            Some(Page::Html { body, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Some(Page::Fail(message)) => Err(AppError::NetworkError(message)),
            None => Err(AppError::HttpError(format!("HTTP 404 for {url}"))),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records a compact line per event.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunReporter for RecordingReporter {
    fn report(&self, event: RunEvent<'_>) {
        let line = match event {
            RunEvent::Started { urls, .. } => format!("started:{urls}"),
            RunEvent::Contributed { url, tuples, .. } => format!("contributed:{url}:{tuples}"),
            RunEvent::UrlFailed { url, .. } => format!("failed:{url}"),
            RunEvent::Finished { report } => {
                format!("finished:{}/{}", report.succeeded, report.attempted)
            }
        };
        self.events.lock().unwrap().push(line);
    }
}
