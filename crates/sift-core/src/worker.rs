use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::document::Document;
use crate::error::AppError;
use crate::output::{Output, Tuple};
use crate::traits::{Fetcher, PageJob, ResultSink};

/// Everything one URL added to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub url: String,
    pub tag: String,
    pub tuples: Vec<Tuple>,
}

impl ResultSink for UnboundedSender<Contribution> {
    fn append(&self, url: &str, tag: String, tuples: Vec<Tuple>) {
        let contribution = Contribution {
            url: url.to_string(),
            tag,
            tuples,
        };
        if self.send(contribution).is_err() {
            tracing::error!(%url, "Result collector closed; dropping results");
        }
    }
}

/// One coarse lock per job: appends are serialized, extraction is not.
impl ResultSink for Mutex<Output> {
    fn append(&self, _url: &str, tag: String, tuples: Vec<Tuple>) {
        let mut output = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        output.append(tag, tuples);
    }
}

/// Process one URL: fetch, resolve its tag, run every task, append.
///
/// A fetch failure is logged and returned, and nothing is appended. Task
/// execution touches no shared state; only the final append goes through
/// the sink. Returns the number of tuples appended.
pub async fn process_url<J, F, S>(
    url: &str,
    job: &J,
    fetcher: &F,
    sink: &S,
) -> Result<usize, AppError>
where
    J: PageJob + ?Sized,
    F: Fetcher,
    S: ResultSink + ?Sized,
{
    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(%url, error = %e, "GET failed");
            return Err(e);
        }
    };
    tracing::debug!(%url, bytes = html.len(), "GET ok");

    let tag = job.tag_for(url);
    let tuples = {
        let doc = Document::parse(&html);
        job.run_tasks(url, &doc)
    };

    let count = tuples.len();
    if count > 0 {
        sink.append(url, tag, tuples);
    }
    Ok(count)
}
