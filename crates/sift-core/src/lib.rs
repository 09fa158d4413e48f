pub mod alias;
pub mod document;
pub mod error;
pub mod job;
pub mod output;
pub mod pool;
pub mod report;
pub mod selector;
pub mod task;
pub mod traits;
pub mod urls;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use alias::AliasTable;
pub use document::{Document, Selection};
pub use error::AppError;
pub use job::{JobPlan, PagingJob};
pub use output::{Output, Tuple, TupleList};
pub use pool::{WorkerConfig, WorkerPool};
pub use report::{RunEvent, RunReport, RunReporter, SilentReporter, TracingRunReporter};
pub use selector::{SelectorTask, SelectorTaskBuilder};
pub use task::{Task, TaskSlot};
pub use traits::{Fetcher, PageJob, ResultSink};
pub use urls::UrlSet;
pub use worker::{Contribution, process_url};
