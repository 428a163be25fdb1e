//! Deterministic short-name generator.
//!
//! Maps a counter onto the bijective base-N numbering of a character set:
//! `a, b, ..., z, aa, ab, ...`. Every name is produced exactly once per
//! generator instance.

pub const CHARSET_LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const CHARSET_UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone)]
pub struct IdentGen {
    charset: Vec<char>,
    pos: usize,
}

impl IdentGen {
    pub fn new(charset: &str) -> Self {
        let charset: Vec<char> = charset.chars().collect();
        assert!(!charset.is_empty(), "identifier charset must not be empty");
        Self { charset, pos: 0 }
    }

    pub fn lowercase() -> Self {
        Self::new(CHARSET_LOWERCASE)
    }

    pub fn uppercase() -> Self {
        Self::new(CHARSET_UPPERCASE)
    }

    /// Number of names handed out so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produce the next name and advance by one.
    pub fn next_name(&mut self) -> String {
        let name = name_at(&self.charset, self.pos);
        self.pos += 1;
        name
    }
}

impl Iterator for IdentGen {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_name())
    }
}

fn name_at(charset: &[char], mut pos: usize) -> String {
    let base = charset.len();
    let mut chars = Vec::new();
    loop {
        chars.push(charset[pos % base]);
        pos /= base;
        if pos == 0 {
            break;
        }
        pos -= 1;
    }
    chars.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_names() {
        let mut gen = IdentGen::lowercase();
        assert_eq!(gen.next_name(), "a");
        assert_eq!(gen.next_name(), "b");
        let names: Vec<String> = gen.by_ref().take(24).collect();
        assert_eq!(names.last().map(String::as_str), Some("z"));
        assert_eq!(gen.next_name(), "aa");
        assert_eq!(gen.next_name(), "ab");
    }

    #[test]
    fn test_rollover_boundaries() {
        let charset: Vec<char> = CHARSET_LOWERCASE.chars().collect();
        assert_eq!(name_at(&charset, 51), "az");
        assert_eq!(name_at(&charset, 52), "ba");
        assert_eq!(name_at(&charset, 26 + 26 * 26 - 1), "zz");
        assert_eq!(name_at(&charset, 26 + 26 * 26), "aaa");
    }

    #[test]
    fn test_uppercase_charset() {
        let mut gen = IdentGen::uppercase();
        assert_eq!(gen.next_name(), "A");
        assert_eq!(gen.position(), 1);
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<String> = IdentGen::lowercase().take(5000).collect();
        assert_eq!(names.len(), 5000);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = IdentGen::lowercase();
        let mut b = IdentGen::lowercase();
        a.next_name();
        a.next_name();
        assert_eq!(b.next_name(), "a");
        assert_eq!(a.next_name(), "c");
    }
}
