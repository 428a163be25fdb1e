//! Identifier remapping.
//!
//! Assigns every unprotected spelling one replacement for the whole run.
//! Exported-looking names draw from the upper-case generator and private ones
//! from the lower-case generator, so visibility survives the rewrite.

use std::collections::{HashMap, HashSet};

use crate::ident_gen::IdentGen;
use crate::registry::IdentRegistry;
use crate::syntax::is_exported;

#[derive(Debug)]
pub struct Remapper {
    registry: IdentRegistry,
    public_gen: IdentGen,
    private_gen: IdentGen,
    assigned: HashMap<String, String>,
    /// Spellings already handed out as replacements.
    taken: HashSet<String>,
}

impl Remapper {
    pub fn new(registry: IdentRegistry) -> Self {
        Self {
            registry,
            public_gen: IdentGen::uppercase(),
            private_gen: IdentGen::lowercase(),
            assigned: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Replacement spelling for `name`, stable for the lifetime of the remapper.
    ///
    /// Excluded names come back unchanged.
    pub fn replacement(&mut self, name: &str) -> String {
        if let Some(existing) = self.assigned.get(name) {
            return existing.clone();
        }
        if self.registry.is_excluded(name) {
            return name.to_string();
        }

        let exported = is_exported(name);
        let candidate = loop {
            let candidate = if exported {
                self.public_gen.next_name()
            } else {
                self.private_gen.next_name()
            };
            if !self.registry.is_excluded(&candidate) && !self.taken.contains(&candidate) {
                break candidate;
            }
        };

        self.taken.insert(candidate.clone());
        self.assigned.insert(name.to_string(), candidate.clone());
        candidate
    }

    /// Replacement already assigned to `name`, if any.
    pub fn assigned(&self, name: &str) -> Option<&str> {
        self.assigned.get(name).map(String::as_str)
    }

    /// Number of distinct spellings renamed so far.
    pub fn renamed(&self) -> usize {
        self.assigned.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_renaming() {
        let mut remapper = Remapper::new(IdentRegistry::new());
        let first = remapper.replacement("greeting");
        remapper.replacement("other");
        assert_eq!(remapper.replacement("greeting"), first);
        assert_eq!(remapper.assigned("greeting"), Some(first.as_str()));
        assert_eq!(remapper.renamed(), 2);
    }

    #[test]
    fn test_excluded_unchanged() {
        let mut remapper = Remapper::new(IdentRegistry::new());
        assert_eq!(remapper.replacement("len"), "len");
        assert_eq!(remapper.replacement("main"), "main");
        assert!(remapper.assigned("len").is_none());
    }

    #[test]
    fn test_visibility_preserved() {
        let mut remapper = Remapper::new(IdentRegistry::new());
        for name in ["Greet", "Config", "Ünicode"] {
            assert!(is_exported(&remapper.replacement(name)));
        }
        for name in ["greet", "config", "_hidden"] {
            assert!(!is_exported(&remapper.replacement(name)));
        }
    }

    #[test]
    fn test_skips_excluded_candidates() {
        let mut registry = IdentRegistry::new();
        registry.extend(["A", "B", "a"]);
        let mut remapper = Remapper::new(registry);
        assert_eq!(remapper.replacement("Foo"), "C");
        assert_eq!(remapper.replacement("foo"), "b");
    }

    #[test]
    fn test_reserved_keywords_never_generated() {
        let mut remapper = Remapper::new(IdentRegistry::new());
        let generated: Vec<String> = (0..2000)
            .map(|i| remapper.replacement(&format!("name{i}")))
            .collect();
        for word in ["if", "go", "for", "map", "var", "len", "nil"] {
            assert!(!generated.iter().any(|g| g == word), "generated {word}");
        }
    }

    #[test]
    fn test_no_two_names_share_a_replacement() {
        let mut remapper = Remapper::new(IdentRegistry::new());
        // `a` is handed out to `first`; the original name `a` must still move.
        let first = remapper.replacement("first");
        assert_eq!(first, "a");
        let original_a = remapper.replacement("a");
        assert_ne!(original_a, "a");

        let mut seen = HashSet::new();
        for name in ["first", "a", "b", "c", "Value", "value"] {
            assert!(seen.insert(remapper.replacement(name)), "{name} collided");
        }
    }
}
