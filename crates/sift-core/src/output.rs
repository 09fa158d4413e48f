//! Tag-keyed extraction output and its projections.
//!
//! ```text
//! {
//!     "tag 1": [
//!         ["value 1-1", "value 1-2", ...],   // one tuple per matched element
//!         ["value 2-1", "value 2-2", ...],
//!     ],
//!     "tag 2": [...],
//! }
//! ```
//!
//! Tuples under a tag arrive in worker completion order, so they are not
//! guaranteed to follow the order the URLs were declared in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::alias::AliasTable;

/// One extraction row: one string per extraction slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tuple(Vec<String>);

impl Tuple {
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value in slot `i`, or `""` when the tuple has no such slot.
    pub fn slot(&self, i: usize) -> &str {
        self.0.get(i).map(String::as_str).unwrap_or_default()
    }

    /// Value of the slot bound to `name`, or `""` for an unknown alias.
    pub fn task(&self, aliases: &AliasTable, name: &str) -> &str {
        aliases.resolve(name).map_or("", |i| self.slot(i))
    }

    /// True when every slot is the empty string.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(String::is_empty)
    }
}

impl From<Vec<String>> for Tuple {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl<S: Into<String>> FromIterator<S> for Tuple {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Slot projections over a run of tuples (e.g. everything under one tag).
pub trait TupleList {
    /// Non-empty values of slot `i`, in order.
    fn task_n(&self, i: usize) -> Vec<&str>;

    /// Non-empty values of the slot bound to `name`; empty for an unknown alias.
    fn task(&self, aliases: &AliasTable, name: &str) -> Vec<&str>;
}

impl TupleList for [Tuple] {
    fn task_n(&self, i: usize) -> Vec<&str> {
        self.iter()
            .map(|t| t.slot(i))
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn task(&self, aliases: &AliasTable, name: &str) -> Vec<&str> {
        match aliases.resolve(name) {
            Some(i) => self.task_n(i),
            None => Vec::new(),
        }
    }
}

/// Aggregated results of a run, keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Output {
    by_tag: HashMap<String, Vec<Tuple>>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tuples under `tag`. Empty contributions leave the output untouched.
    pub fn append(&mut self, tag: impl Into<String>, tuples: Vec<Tuple>) {
        if tuples.is_empty() {
            return;
        }
        self.by_tag.entry(tag.into()).or_default().extend(tuples);
    }

    /// Tuples recorded under `tag` (empty for an unknown tag).
    pub fn get(&self, tag: &str) -> &[Tuple] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// All tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Total number of tuples across all tags.
    pub fn len(&self) -> usize {
        self.by_tag.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// Every tuple projected to slot `i`, per tag.
    ///
    /// Tuples without slot `i` are skipped; a tag with no values is absent.
    pub fn task_n(&self, i: usize) -> HashMap<&str, Vec<&str>> {
        let mut out = HashMap::new();
        for (tag, tuples) in &self.by_tag {
            let values: Vec<&str> = tuples
                .iter()
                .filter_map(|t| t.values().get(i).map(String::as_str))
                .collect();
            if !values.is_empty() {
                out.insert(tag.as_str(), values);
            }
        }
        out
    }

    pub fn task(&self, aliases: &AliasTable, name: &str) -> HashMap<&str, Vec<&str>> {
        match aliases.resolve(name) {
            Some(i) => self.task_n(i),
            None => HashMap::new(),
        }
    }

    /// All tuples flattened across tags.
    ///
    /// Order within a tag is preserved; the order of tags is unspecified.
    pub fn list(&self) -> Vec<&Tuple> {
        self.by_tag.values().flatten().collect()
    }

    /// Slot `i` of every tuple across all tags.
    pub fn list_task_n(&self, i: usize) -> Vec<&str> {
        self.by_tag
            .values()
            .flatten()
            .filter_map(|t| t.values().get(i).map(String::as_str))
            .collect()
    }

    pub fn list_task(&self, aliases: &AliasTable, name: &str) -> Vec<&str> {
        match aliases.resolve(name) {
            Some(i) => self.list_task_n(i),
            None => Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tuple])> {
        self.by_tag
            .iter()
            .map(|(tag, tuples)| (tag.as_str(), tuples.as_slice()))
    }
}
