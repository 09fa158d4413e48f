use std::collections::HashMap;

/// Names bound to tuple slot indices.
///
/// Resolution is positional: a name identifies "slot i" across the whole
/// job, so two selector tasks that each alias their second step resolve to
/// the same column. Names must be unique per job; binding a name again
/// replaces the earlier index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    slots: HashMap<String, usize>,
}

impl AliasTable {
    pub fn bind(&mut self, name: impl Into<String>, slot: usize) {
        self.slots.insert(name.into(), slot);
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bound names, sorted by slot index.
    pub fn names(&self) -> Vec<(&str, usize)> {
        let mut names: Vec<(&str, usize)> = self
            .slots
            .iter()
            .map(|(name, slot)| (name.as_str(), *slot))
            .collect();
        names.sort_unstable_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        names
    }
}
