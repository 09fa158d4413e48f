use std::future::Future;

use crate::document::Document;
use crate::error::AppError;
use crate::output::Tuple;

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// The part of a job a worker needs to process one URL.
///
/// Workers only read job state: they resolve the URL's tag and run the
/// task list. Appending results goes through a [`ResultSink`].
pub trait PageJob: Send + Sync {
    /// Tag the URL's results are grouped under (the URL itself when untagged).
    fn tag_for(&self, url: &str) -> String;

    /// Runs every task against the document, in task-list order.
    fn run_tasks(&self, url: &str, doc: &Document) -> Vec<Tuple>;
}

/// Receives the tuples one URL contributed.
pub trait ResultSink: Send + Sync {
    fn append(&self, url: &str, tag: String, tuples: Vec<Tuple>);
}
