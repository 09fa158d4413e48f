use std::fmt;
use std::sync::Arc;

use crate::document::Document;
use crate::output::Tuple;

/// A pure extraction from one document to zero or more tuples.
pub type Task = Arc<dyn Fn(&Document) -> Vec<Tuple> + Send + Sync>;

/// Wrap a closure as a [`Task`].
pub fn task<F>(f: F) -> Task
where
    F: Fn(&Document) -> Vec<Tuple> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The whole document's visible text as a single one-slot tuple.
pub fn page_text() -> Task {
    task(|doc| vec![Tuple::new(vec![doc.text()])])
}

/// A position in a job's task list.
///
/// Selector tasks reserve their position when they are opened and fill it
/// once built, so the order of the task list never depends on build order.
#[derive(Clone)]
pub enum TaskSlot {
    Reserved { selector: String },
    Ready(Task),
}

impl TaskSlot {
    /// Run the task, or produce nothing for a slot that was never built.
    pub fn run(&self, doc: &Document) -> Vec<Tuple> {
        match self {
            TaskSlot::Reserved { .. } => Vec::new(),
            TaskSlot::Ready(task) => task(doc),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TaskSlot::Ready(_))
    }
}

impl fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSlot::Reserved { selector } => write!(f, "Reserved({selector})"),
            TaskSlot::Ready(_) => write!(f, "Ready"),
        }
    }
}
