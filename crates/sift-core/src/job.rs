use std::collections::HashMap;
use std::sync::Arc;

use crate::alias::AliasTable;
use crate::document::Document;
use crate::output::{Output, Tuple, TupleList};
use crate::pool::WorkerPool;
use crate::report::{RunReport, RunReporter, TracingRunReporter};
use crate::selector::SelectorTaskBuilder;
use crate::task::{Task, TaskSlot, page_text, task};
use crate::traits::{Fetcher, PageJob};
use crate::urls::UrlSet;

/// The read-only half of a job that workers share during a run.
#[derive(Debug, Clone, Default)]
pub struct JobPlan {
    tags: HashMap<String, String>,
    tasks: Vec<TaskSlot>,
}

impl PageJob for JobPlan {
    fn tag_for(&self, url: &str) -> String {
        self.tags
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string())
    }

    fn run_tasks(&self, url: &str, doc: &Document) -> Vec<Tuple> {
        let mut out = Vec::new();
        for (i, slot) in self.tasks.iter().enumerate() {
            let tuples = slot.run(doc);
            tracing::debug!(task = i, %url, tuples = tuples.len(), "Task complete");
            out.extend(tuples);
        }
        out
    }
}

/// A declarative extraction job over a set of URLs.
///
/// Building a job runs nothing: URL sets, tasks and aliases accumulate until
/// the job is handed to a [`WorkerPool`]. Results are appended to the job's
/// [`Output`]; running the same job again appends a second round of results
/// instead of replacing the first.
#[derive(Debug, Clone, Default)]
pub struct PagingJob {
    urls: Vec<String>,
    plan: JobPlan,
    aliases: AliasTable,
    output: Output,
}

impl PagingJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a URL set into the job.
    ///
    /// A tagged set records its tag for each of its URLs, replacing any tag
    /// those URLs had before.
    pub fn add_range(&mut self, set: UrlSet) -> &mut Self {
        let (urls, tag) = set.into_parts();
        if let Some(tag) = tag {
            for url in &urls {
                self.plan.tags.insert(url.clone(), tag.clone());
            }
        }
        self.urls.extend(urls);
        self
    }

    /// Append a task to run against every document.
    pub fn add_task<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Document) -> Vec<Tuple> + Send + Sync + 'static,
    {
        self.push_task(task(f))
    }

    pub fn push_task(&mut self, task: Task) -> &mut Self {
        self.plan.tasks.push(TaskSlot::Ready(task));
        self
    }

    /// Append a task yielding the document's visible text as one tuple.
    pub fn text(&mut self) -> &mut Self {
        self.push_task(page_text())
    }

    /// Open a selector task. Its position in the task list is reserved now.
    pub fn select(&mut self, expr: &str) -> SelectorTaskBuilder<'_> {
        SelectorTaskBuilder::open(self, expr, None)
    }

    pub(crate) fn reserve_slot(&mut self, selector: &str) -> usize {
        self.plan.tasks.push(TaskSlot::Reserved {
            selector: selector.to_string(),
        });
        self.plan.tasks.len() - 1
    }

    pub(crate) fn install(&mut self, slot: usize, task: Task) {
        if let Some(entry) = self.plan.tasks.get_mut(slot) {
            *entry = TaskSlot::Ready(task);
        }
    }

    pub(crate) fn bind_alias(&mut self, name: String, slot: usize) {
        self.aliases.bind(name, slot);
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.plan.tags
    }

    pub fn tasks(&self) -> &[TaskSlot] {
        &self.plan.tasks
    }

    pub fn task_count(&self) -> usize {
        self.plan.tasks.len()
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn plan(&self) -> &JobPlan {
        &self.plan
    }

    /// Run the job, logging progress through `tracing`.
    pub async fn run<F>(&mut self, pool: &WorkerPool<F>) -> RunReport
    where
        F: Fetcher + 'static,
    {
        self.run_with(pool, &TracingRunReporter).await
    }

    /// Run the job, reporting progress to `reporter`.
    pub async fn run_with<F, R>(&mut self, pool: &WorkerPool<F>, reporter: &R) -> RunReport
    where
        F: Fetcher + 'static,
        R: RunReporter,
    {
        for slot in &self.plan.tasks {
            if let TaskSlot::Reserved { selector } = slot {
                tracing::warn!(%selector, "Selector task was never built and will produce nothing");
            }
        }

        let plan = Arc::new(self.plan.clone());
        pool.execute(self.urls.clone(), plan, &mut self.output, reporter)
            .await
    }

    // Queries over the output, resolving names through this job's aliases.

    pub fn get(&self, tag: &str) -> &[Tuple] {
        self.output.get(tag)
    }

    pub fn task(&self, name: &str) -> HashMap<&str, Vec<&str>> {
        self.output.task(&self.aliases, name)
    }

    pub fn task_n(&self, i: usize) -> HashMap<&str, Vec<&str>> {
        self.output.task_n(i)
    }

    /// Non-empty values of the slot bound to `name` under one tag.
    pub fn tag_task(&self, tag: &str, name: &str) -> Vec<&str> {
        self.output.get(tag).task(&self.aliases, name)
    }

    pub fn list(&self) -> Vec<&Tuple> {
        self.output.list()
    }

    pub fn list_task(&self, name: &str) -> Vec<&str> {
        self.output.list_task(&self.aliases, name)
    }

    pub fn list_task_n(&self, i: usize) -> Vec<&str> {
        self.output.list_task_n(i)
    }
}

impl PageJob for PagingJob {
    fn tag_for(&self, url: &str) -> String {
        self.plan.tag_for(url)
    }

    fn run_tasks(&self, url: &str, doc: &Document) -> Vec<Tuple> {
        self.plan.run_tasks(url, doc)
    }
}

impl From<UrlSet> for PagingJob {
    fn from(set: UrlSet) -> Self {
        let mut job = Self::new();
        job.add_range(set);
        job
    }
}
