//! Offset-tracking text patcher.
//!
//! Every span handed to [`TextPatcher::replace`] is expressed in coordinates of
//! the original, unpatched source. The patcher keeps the running difference
//! between original and patched lengths so later spans still land where they
//! should. Spans must arrive sorted by start offset and must not overlap.

use std::fmt;

/// Byte range `[start, end)` in original source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("replacement at {span} starts before the previous replacement ended at {previous_end}")]
    OutOfOrder { span: Span, previous_end: usize },

    #[error("replacement span {span} is inverted")]
    Inverted { span: Span },

    #[error("replacement span {span} exceeds source length {len}")]
    OutOfBounds { span: Span, len: usize },

    #[error("replacement span {span} does not fall on character boundaries")]
    NotCharBoundary { span: Span },
}

#[derive(Debug, Clone)]
pub struct TextPatcher {
    content: String,
    original_len: usize,
    /// Patched length minus original length, over everything replaced so far.
    offset: isize,
    /// End of the last replaced span, in original coordinates.
    last_end: usize,
}

impl TextPatcher {
    pub fn new(source: &str) -> Self {
        Self {
            content: source.to_string(),
            original_len: source.len(),
            offset: 0,
            last_end: 0,
        }
    }

    /// Replace `span` of the original source with `text`.
    pub fn replace(&mut self, span: Span, text: &str) -> Result<(), PatchError> {
        if span.start > span.end {
            return Err(PatchError::Inverted { span });
        }
        if span.end > self.original_len {
            return Err(PatchError::OutOfBounds {
                span,
                len: self.original_len,
            });
        }
        if span.start < self.last_end {
            return Err(PatchError::OutOfOrder {
                span,
                previous_end: self.last_end,
            });
        }

        let start = shift(span.start, self.offset);
        let end = shift(span.end, self.offset);
        if !self.content.is_char_boundary(start) || !self.content.is_char_boundary(end) {
            return Err(PatchError::NotCharBoundary { span });
        }

        self.content.replace_range(start..end, text);
        self.offset += text.len() as isize - span.len() as isize;
        self.last_end = span.end;
        Ok(())
    }

    /// Append text after everything else (generated declarations).
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

fn shift(pos: usize, offset: isize) -> usize {
    (pos as isize + offset) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "func Greet(name string) string { return name }";

    fn span_of(needle: &str, nth: usize) -> Span {
        let start = SOURCE
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap();
        Span::new(start, start + needle.len())
    }

    #[test]
    fn test_sorted_replacements() {
        let mut patcher = TextPatcher::new(SOURCE);
        patcher.replace(span_of("Greet", 0), "A").unwrap();
        patcher.replace(span_of("name", 0), "abc").unwrap();
        patcher.replace(span_of("name", 1), "abc").unwrap();
        assert_eq!(
            patcher.as_str(),
            "func A(abc string) string { return abc }"
        );
    }

    #[test]
    fn test_growing_and_shrinking() {
        let mut patcher = TextPatcher::new("a bb ccc");
        patcher.replace(Span::new(0, 1), "xxxx").unwrap();
        patcher.replace(Span::new(2, 4), "").unwrap();
        patcher.replace(Span::new(5, 8), "y").unwrap();
        assert_eq!(patcher.into_string(), "xxxx  y");
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut patcher = TextPatcher::new(SOURCE);
        patcher.replace(span_of("name", 1), "b").unwrap();
        let err = patcher.replace(span_of("Greet", 0), "A").unwrap_err();
        assert!(matches!(err, PatchError::OutOfOrder { .. }));
        // The rejected edit left the buffer untouched.
        assert_eq!(patcher.as_str(), "func Greet(name string) string { return b }");
    }

    #[test]
    fn test_overlap_rejected() {
        let mut patcher = TextPatcher::new("abcdef");
        patcher.replace(Span::new(1, 4), "X").unwrap();
        assert!(matches!(
            patcher.replace(Span::new(3, 5), "Y"),
            Err(PatchError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_adjacent_spans_allowed() {
        let mut patcher = TextPatcher::new("abcdef");
        patcher.replace(Span::new(0, 3), "1").unwrap();
        patcher.replace(Span::new(3, 6), "2").unwrap();
        assert_eq!(patcher.as_str(), "12");
    }

    #[test]
    fn test_bounds_checked() {
        let mut patcher = TextPatcher::new("abc");
        assert!(matches!(
            patcher.replace(Span::new(2, 9), "x"),
            Err(PatchError::OutOfBounds { .. })
        ));
        assert!(matches!(
            patcher.replace(Span::new(2, 1), "x"),
            Err(PatchError::Inverted { .. })
        ));
    }

    #[test]
    fn test_multibyte_source() {
        let source = "s := \"héllo\"; n := s";
        let mut patcher = TextPatcher::new(source);
        let literal = source.find('"').unwrap();
        let literal_end = source.rfind('"').unwrap() + 1;
        patcher.replace(Span::new(0, 1), "a").unwrap();
        patcher
            .replace(Span::new(literal, literal_end), "f()")
            .unwrap();
        let last = source.len() - 1;
        patcher.replace(Span::new(last, last + 1), "a").unwrap();
        assert_eq!(patcher.as_str(), "a := f(); n := a");
        assert!(matches!(
            TextPatcher::new("é").replace(Span::new(1, 2), "e"),
            Err(PatchError::NotCharBoundary { .. })
        ));
    }

    #[test]
    fn test_append() {
        let mut patcher = TextPatcher::new("package main\n");
        patcher.append("\nfunc f() {}\n");
        assert_eq!(patcher.as_str(), "package main\n\nfunc f() {}\n");
    }
}
