use serde::Serialize;

/// Events emitted during a run for monitoring/logging.
#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Started {
        urls: usize,
        concurrency: Option<usize>,
    },
    Contributed {
        url: &'a str,
        tag: &'a str,
        tuples: usize,
    },
    UrlFailed {
        url: &'a str,
        error: &'a str,
    },
    Finished {
        report: &'a RunReport,
    },
}

/// Trait for receiving run events (decoupled logging).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started { urls, concurrency } => {
                tracing::info!(%urls, ?concurrency, "Run started");
            }
            RunEvent::Contributed { url, tag, tuples } => {
                tracing::debug!(%url, %tag, %tuples, "Results appended");
            }
            RunEvent::UrlFailed { url, error } => {
                tracing::warn!(%url, %error, "URL skipped");
            }
            RunEvent::Finished { report } => {
                tracing::info!(
                    attempted = report.attempted,
                    succeeded = report.succeeded,
                    failed = report.failures.len(),
                    tuples = report.tuples,
                    "Run finished"
                );
            }
        }
    }
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl RunReporter for SilentReporter {}

/// A URL whose document could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

/// Summary of one run of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// URLs handed to workers.
    pub attempted: usize,
    /// URLs fetched and processed (with or without results).
    pub succeeded: usize,
    pub failures: Vec<UrlFailure>,
    /// Tuples appended to the output during this run.
    pub tuples: usize,
}

impl RunReport {
    pub fn new(attempted: usize) -> Self {
        Self {
            attempted,
            ..Self::default()
        }
    }

    /// True when at least one URL was attempted and none could be processed.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_failed() {
        assert!(!RunReport::new(0).all_failed());

        let mut report = RunReport::new(2);
        assert!(report.all_failed());
        report.succeeded = 1;
        assert!(!report.all_failed());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = RunReport::new(1);
        report.failures.push(UrlFailure {
            url: "https://a.test".into(),
            error: "HTTP 404".into(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["url"], "https://a.test");
        assert_eq!(json["attempted"], 1);
    }
}
