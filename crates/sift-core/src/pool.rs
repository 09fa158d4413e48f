//! Concurrent execution of a job's URLs.
//!
//! One tokio task per URL. Workers never touch the output: each sends its
//! [`Contribution`] over a channel to a single collector, which owns the
//! output for the duration of the run. Tuples from one URL stay together;
//! across URLs, arrival order is whatever order the workers finish in.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{Id, JoinSet};

use crate::error::AppError;
use crate::output::Output;
use crate::report::{RunEvent, RunReport, RunReporter, UrlFailure};
use crate::traits::{Fetcher, PageJob};
use crate::worker::{Contribution, process_url};

/// Default number of URLs processed at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Configuration for the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Maximum URLs in flight; `None` runs every URL at once.
    pub concurrency: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: Some(DEFAULT_CONCURRENCY),
        }
    }
}

impl WorkerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `SIFT_CONCURRENCY` (optional): a positive integer no larger than
    ///   [`Semaphore::MAX_PERMITS`], or `unbounded`. Defaults to
    ///   [`DEFAULT_CONCURRENCY`].
    pub fn from_env() -> Result<Self, AppError> {
        match std::env::var("SIFT_CONCURRENCY") {
            Err(_) => Ok(Self::default()),
            Ok(raw) => Self::parse_concurrency(&raw),
        }
    }

    fn parse_concurrency(raw: &str) -> Result<Self, AppError> {
        if raw.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::unbounded());
        }
        let parsed: usize = raw.parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid SIFT_CONCURRENCY '{raw}': must be a positive integer or 'unbounded'"
            ))
        })?;
        if parsed == 0 {
            return Err(AppError::ConfigError(
                "SIFT_CONCURRENCY must be at least 1".into(),
            ));
        }
        if parsed > Semaphore::MAX_PERMITS {
            return Err(AppError::ConfigError(format!(
                "SIFT_CONCURRENCY must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(Self::default().with_concurrency(parsed))
    }

    pub fn unbounded() -> Self {
        Self { concurrency: None }
    }

    /// Bound the pool to `concurrency` URLs at once, clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency.clamp(1, Semaphore::MAX_PERMITS));
        self
    }
}

/// Runs jobs over a fetcher with bounded (or unbounded) parallelism.
pub struct WorkerPool<F: Fetcher> {
    fetcher: F,
    config: WorkerConfig,
}

impl<F: Fetcher + 'static> WorkerPool<F> {
    pub fn new(fetcher: F, config: WorkerConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Process every URL against `job`, appending results to `output`.
    ///
    /// Returns once every worker has finished. A URL that fails is reported
    /// and skipped; it never stops the run.
    pub async fn execute<J, R>(
        &self,
        urls: Vec<String>,
        job: Arc<J>,
        output: &mut Output,
        reporter: &R,
    ) -> RunReport
    where
        J: PageJob + 'static,
        R: RunReporter,
    {
        let mut report = RunReport::new(urls.len());
        reporter.report(RunEvent::Started {
            urls: urls.len(),
            concurrency: self.config.concurrency,
        });

        let limiter = self
            .config
            .concurrency
            .map(|n| Arc::new(Semaphore::new(n.clamp(1, Semaphore::MAX_PERMITS))));
        let (tx, mut rx) = mpsc::unbounded_channel::<Contribution>();
        let mut workers = JoinSet::new();
        let mut running: HashMap<Id, String> = HashMap::new();

        for url in urls {
            let job = Arc::clone(&job);
            let fetcher = self.fetcher.clone();
            let limiter = limiter.clone();
            let tx = tx.clone();
            let worker_url = url.clone();
            let handle = workers.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                process_url(&worker_url, job.as_ref(), &fetcher, &tx).await
            });
            running.insert(handle.id(), url);
        }
        // The channel closes once the last worker drops its sender.
        drop(tx);

        while let Some(contribution) = rx.recv().await {
            reporter.report(RunEvent::Contributed {
                url: &contribution.url,
                tag: &contribution.tag,
                tuples: contribution.tuples.len(),
            });
            report.tuples += contribution.tuples.len();
            output.append(contribution.tag, contribution.tuples);
        }

        while let Some(joined) = workers.join_next_with_id().await {
            let (id, error) = match joined {
                Ok((_, Ok(_))) => {
                    report.succeeded += 1;
                    continue;
                }
                Ok((id, Err(e))) => (id, e.to_string()),
                Err(e) => {
                    tracing::error!(error = %e, "Worker task aborted");
                    (e.id(), format!("worker aborted: {e}"))
                }
            };
            let url = running.remove(&id).unwrap_or_default();
            reporter.report(RunEvent::UrlFailed {
                url: &url,
                error: &error,
            });
            report.failures.push(UrlFailure { url, error });
        }

        reporter.report(RunEvent::Finished { report: &report });
        report
    }
}
