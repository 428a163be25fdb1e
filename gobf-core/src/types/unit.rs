//! Compilation units and the pending edits collected for their files.

use std::path::PathBuf;

use crate::patch::Span;

/// A single pending edit, keyed by its span in the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Identifier occurrence to be renamed through the registry.
    Rename { span: Span, name: String },
    /// Exact span replaced by fixed text (protected literals).
    Literal { span: Span, text: String },
    /// The file's own `package` clause identifier.
    PackageName { span: Span },
    /// Path literal of an import that targets another project unit,
    /// identified by its canonical import path.
    ImportPath { span: Span, target: String },
}

impl Replacement {
    pub fn span(&self) -> Span {
        match self {
            Replacement::Rename { span, .. }
            | Replacement::Literal { span, .. }
            | Replacement::PackageName { span }
            | Replacement::ImportPath { span, .. } => *span,
        }
    }
}

/// A project source file with everything needed to rewrite it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    /// Pending edits in document order.
    pub replacements: Vec<Replacement>,
    /// Generated declarations appended after the original text.
    pub append_content: String,
}

impl SourceFile {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self {
            path,
            content,
            replacements: Vec::new(),
            append_content: String::new(),
        }
    }
}

/// A project package, recorded once per canonical identity.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// Declared package name.
    pub name: String,
    /// Canonical import path.
    pub id: String,
    /// True for the unit named by the root pattern.
    pub is_entry: bool,
    pub files: Vec<SourceFile>,
    /// Embedded resources, relative name to raw bytes.
    pub embeds: Vec<(String, Vec<u8>)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_spans() {
        let mut file = SourceFile::new(PathBuf::from("main.go"), String::new());
        file.replacements.push(Replacement::PackageName {
            span: Span::new(8, 12),
        });
        file.replacements.push(Replacement::ImportPath {
            span: Span::new(20, 35),
            target: "example.com/app/util".to_string(),
        });
        assert_eq!(file.replacements[0].span(), Span::new(8, 12));
        assert_eq!(file.replacements[1].span(), Span::new(20, 35));
    }
}
