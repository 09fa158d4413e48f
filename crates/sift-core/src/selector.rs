//! Composable selector tasks.
//!
//! A selector task matches repeating elements (rows, cards, list items) and
//! turns each into one [`Tuple`]. Every slot of the tuple comes from a step:
//! a chain of narrowing sub-selections applied to the matched element,
//! ending in a leaf extractor that yields a string.
//!
//! ```rust,no_run
//! use sift_core::{PagingJob, UrlSet};
//!
//! # fn declare() -> Result<(), sift_core::AppError> {
//! let mut job = PagingJob::from(UrlSet::range("https://example.com/page/{}", 1, 3));
//! job.select(".product")
//!     .find(".name")
//!     .text()
//!     .alias("name")
//!     .find("a")
//!     .attr("href")
//!     .alias("link")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use scraper::Selector;

use crate::document::{Document, Selection, parse_selector};
use crate::error::AppError;
use crate::job::PagingJob;
use crate::output::Tuple;
use crate::task::{Task, task};

/// Narrows a selection before extraction.
pub type SubSelect = Arc<dyn for<'a> Fn(Selection<'a>) -> Selection<'a> + Send + Sync>;

/// Reduces a selection to a single string. Extractors never fail; `""`
/// means "no value".
pub type Extract = Arc<dyn for<'a> Fn(&Selection<'a>) -> String + Send + Sync>;

#[derive(Clone)]
enum Narrow {
    Children,
    Find(Selector),
    Custom(SubSelect),
}

impl Narrow {
    fn apply<'a>(&self, selection: Selection<'a>) -> Selection<'a> {
        match self {
            Narrow::Children => selection.children(),
            Narrow::Find(selector) => selection.find(selector),
            Narrow::Custom(f) => f(selection),
        }
    }
}

#[derive(Clone)]
enum Extractor {
    /// Combined element text, trimmed. A whitespace-only element yields `""`
    /// and so counts as empty when tuples are pruned.
    Text,
    Attr(String),
    Custom(Extract),
}

impl Extractor {
    fn extract(&self, selection: &Selection<'_>) -> String {
        match self {
            Extractor::Text => selection.text(),
            Extractor::Attr(name) => selection.attr(name).unwrap_or_default().to_string(),
            Extractor::Custom(f) => f(selection),
        }
    }
}

/// One tuple slot: narrowing chain plus leaf extractor.
#[derive(Clone)]
struct Step {
    narrowing: Vec<Narrow>,
    extractor: Extractor,
}

impl Step {
    fn run(&self, element: Selection<'_>) -> String {
        let narrowed = self
            .narrowing
            .iter()
            .fold(element, |selection, narrow| narrow.apply(selection));
        self.extractor.extract(&narrowed)
    }
}

/// A compiled selector task: a selector plus its finalized steps.
#[derive(Clone)]
pub struct SelectorTask {
    expr: String,
    selector: Selector,
    steps: Vec<Step>,
}

impl SelectorTask {
    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// One tuple per matched element, in document order.
    ///
    /// Elements for which every step yields `""` are dropped.
    pub fn apply(&self, doc: &Document) -> Vec<Tuple> {
        doc.find(&self.selector)
            .elements()
            .iter()
            .filter_map(|element| {
                let tuple: Tuple = self
                    .steps
                    .iter()
                    .map(|step| step.run(Selection::from_element(*element)))
                    .collect();
                (!tuple.is_blank()).then_some(tuple)
            })
            .collect()
    }

    pub fn into_task(self) -> Task {
        task(move |doc| self.apply(doc))
    }
}

impl fmt::Debug for SelectorTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorTask")
            .field("expr", &self.expr)
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Declares one selector task on a [`PagingJob`].
///
/// Opening the builder reserves the task's position in the job; nothing is
/// compiled until [`build`](Self::build). There is always exactly one
/// pending step: sub-selections accumulate on it, and setting its extractor
/// finalizes it and opens the next one.
#[must_use = "selector tasks do nothing until `build` is called"]
pub struct SelectorTaskBuilder<'j> {
    job: &'j mut PagingJob,
    slot: usize,
    expr: String,
    selector: Option<Selector>,
    steps: Vec<Step>,
    pending: Vec<Narrow>,
    aliases: Vec<(String, usize)>,
    error: Option<AppError>,
    carried: Option<AppError>,
}

impl<'j> SelectorTaskBuilder<'j> {
    pub(crate) fn open(job: &'j mut PagingJob, expr: &str, carried: Option<AppError>) -> Self {
        let slot = job.reserve_slot(expr);
        let (selector, error) = match parse_selector(expr) {
            Ok(selector) => (Some(selector), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            job,
            slot,
            expr: expr.to_string(),
            selector,
            steps: Vec::new(),
            pending: Vec::new(),
            aliases: Vec::new(),
            error,
            carried,
        }
    }

    /// Append a narrowing function to the pending step.
    pub fn sub_task<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(Selection<'a>) -> Selection<'a> + Send + Sync + 'static,
    {
        self.pending.push(Narrow::Custom(Arc::new(f)));
        self
    }

    /// Narrow the pending step to the element children of the selection.
    pub fn children(mut self) -> Self {
        self.pending.push(Narrow::Children);
        self
    }

    /// Narrow the pending step to descendants matching `expr`.
    pub fn find(mut self, expr: &str) -> Self {
        match parse_selector(expr) {
            Ok(selector) => self.pending.push(Narrow::Find(selector)),
            Err(e) => self.record(e),
        }
        self
    }

    /// Set the pending step's extractor and start the next step.
    pub fn extract<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(&Selection<'a>) -> String + Send + Sync + 'static,
    {
        self.finalize_step(Extractor::Custom(Arc::new(f)))
    }

    /// Extract the selection's text content.
    pub fn text(self) -> Self {
        self.finalize_step(Extractor::Text)
    }

    /// Extract attribute `name` of the first selected element.
    pub fn attr(self, name: &str) -> Self {
        self.finalize_step(Extractor::Attr(name.to_string()))
    }

    /// Name the step finalized most recently.
    ///
    /// Does nothing when no step has been finalized yet.
    pub fn alias(mut self, name: &str) -> Self {
        if let Some(slot) = self.last_finalized_slot() {
            self.aliases.push((name.to_string(), slot));
        }
        self
    }

    /// Compile the task into its reserved position and commit its aliases.
    ///
    /// On an invalid selector the position stays reserved (it contributes
    /// nothing) and no alias is bound.
    pub fn build(self) -> Result<&'j mut PagingJob, AppError> {
        let (job, error) = self.commit();
        match error {
            Some(e) => Err(e),
            None => Ok(job),
        }
    }

    /// Build this task and open another selector task on the same job.
    ///
    /// A build error is carried forward and reported by the final `build`.
    pub fn select(self, expr: &str) -> SelectorTaskBuilder<'j> {
        let (job, error) = self.commit();
        SelectorTaskBuilder::open(job, expr, error)
    }

    /// Slot index of the most recently finalized step.
    ///
    /// The pending step is never counted, so with `n` finalized steps this
    /// is `n - 1`.
    fn last_finalized_slot(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    fn finalize_step(mut self, extractor: Extractor) -> Self {
        let narrowing = std::mem::take(&mut self.pending);
        self.steps.push(Step {
            narrowing,
            extractor,
        });
        self
    }

    fn record(&mut self, error: AppError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn commit(self) -> (&'j mut PagingJob, Option<AppError>) {
        let Self {
            job,
            slot,
            expr,
            selector,
            steps,
            aliases,
            error,
            carried,
            ..
        } = self;

        if let Some(e) = error {
            tracing::warn!(selector = %expr, error = %e, "Selector task not built");
            return (job, carried.or(Some(e)));
        }
        let Some(selector) = selector else {
            return (job, carried);
        };

        let compiled = SelectorTask {
            expr,
            selector,
            steps,
        };
        tracing::debug!(selector = %compiled.expr, steps = compiled.steps.len(), slot, "Selector task built");
        job.install(slot, compiled.into_task());
        for (name, index) in aliases {
            job.bind_alias(name, index);
        }
        (job, carried)
    }
}
