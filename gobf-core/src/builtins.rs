//! Names that are never renamed and never handed out as replacements.
//!
//! Predeclared identifiers are taken from the declarations in Go's
//! `src/builtin/builtin.go`.

pub const PREDECLARED: &[&str] = &[
    "bool",
    "true",
    "false",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "int8",
    "int16",
    "int32",
    "int64",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "string",
    "int",
    "uint",
    "uintptr",
    "byte",
    "rune",
    "any",
    "comparable",
    "iota",
    "nil",
    "Type",
    "Type1",
    "IntegerType",
    "FloatType",
    "ComplexType",
    "append",
    "copy",
    "delete",
    "len",
    "cap",
    "make",
    "max",
    "min",
    "new",
    "complex",
    "real",
    "imag",
    "clear",
    "close",
    "panic",
    "recover",
    "print",
    "println",
    "error",
];

pub const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Names with meaning to the toolchain or the predeclared `error` interface.
pub const SPECIAL: &[&str] = &["main", "init", "_", "Error"];

/// Every reserved name.
pub fn reserved() -> impl Iterator<Item = &'static str> {
    PREDECLARED
        .iter()
        .chain(KEYWORDS)
        .chain(SPECIAL)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_letter_keywords_reserved() {
        let names: Vec<&str> = reserved().collect();
        assert!(names.contains(&"if"));
        assert!(names.contains(&"go"));
        assert!(names.contains(&"main"));
    }
}
