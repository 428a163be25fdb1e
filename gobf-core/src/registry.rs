//! Identifier exclusion bookkeeping.
//!
//! Collects every spelling that must survive the rewrite untouched: reserved
//! words, exported names of external packages, aliases of external imports,
//! and names protected by directives or configuration.

use std::collections::HashSet;

use crate::builtins;

#[derive(Debug, Clone)]
pub struct IdentRegistry {
    excluded: HashSet<String>,
}

impl Default for IdentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentRegistry {
    /// Registry seeded with Go's reserved names.
    pub fn new() -> Self {
        Self {
            excluded: builtins::reserved().map(str::to_string).collect(),
        }
    }

    /// Registry with nothing excluded.
    pub fn empty() -> Self {
        Self {
            excluded: HashSet::new(),
        }
    }

    pub fn exclude(&mut self, name: impl Into<String>) {
        self.excluded.insert(name.into());
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}
