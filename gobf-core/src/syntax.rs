//! Go syntax trees.
//!
//! Thin layer over tree-sitter's Go grammar: parsing, node classification,
//! spans, and decoding of Go string literal values.

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::{ObfError, Result};
use crate::patch::Span;

/// Node kinds that spell a renameable name.
pub const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "type_identifier",
    "package_identifier",
    "label_name",
];

pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ObfError::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Option<Tree> {
        self.parser.parse(source, None)
    }
}

pub fn is_identifier(kind: &str) -> bool {
    IDENTIFIER_KINDS.contains(&kind)
}

pub fn is_string_literal(kind: &str) -> bool {
    matches!(kind, "interpreted_string_literal" | "raw_string_literal")
}

/// Go's visibility rule: a leading upper-case letter exports the name.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

pub fn span(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

/// One-based line number of the node's first byte.
pub fn line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Children paired with the grammar field they occupy, in source order.
pub fn fields<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut cursor = node.walk();
    let mut out = Vec::with_capacity(node.child_count());
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.field_name(), cursor.node()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// First error or missing node below `node`, used for diagnostics.
pub fn first_error<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    named_children(node)
        .into_iter()
        .chain(
            (0..node.child_count())
                .filter_map(|i| node.child(i as _))
                .filter(|c| c.is_missing()),
        )
        .find_map(first_error)
        .or(Some(node))
}

/// Leftmost identifier of a `a.b.c` selector chain or `pkg.Type` reference.
pub fn selector_root<'t>(node: Node<'t>) -> Option<Node<'t>> {
    match node.kind() {
        "selector_expression" => selector_root(node.child_by_field_name("operand")?),
        "qualified_type" => node.child_by_field_name("package"),
        "identifier" | "package_identifier" => Some(node),
        _ => None,
    }
}

/// A single import spec of a file.
#[derive(Debug, Clone, Copy)]
pub struct ImportSpec<'t> {
    pub node: Node<'t>,
    /// Explicit binding (`name`, `_` or `.`), when present.
    pub name: Option<Node<'t>>,
    pub path: Node<'t>,
}

impl ImportSpec<'_> {
    pub fn path_value(&self, source: &str) -> Option<String> {
        let bytes = string_value(self.path, source)?;
        String::from_utf8(bytes).ok()
    }
}

pub fn import_spec<'t>(node: Node<'t>) -> Option<ImportSpec<'t>> {
    if node.kind() != "import_spec" {
        return None;
    }
    Some(ImportSpec {
        node,
        name: node.child_by_field_name("name"),
        path: node.child_by_field_name("path")?,
    })
}

/// All import specs of a file, in source order.
pub fn import_specs<'t>(root: Node<'t>) -> Vec<ImportSpec<'t>> {
    let mut specs = Vec::new();
    for decl in named_children(root) {
        if decl.kind() != "import_declaration" {
            continue;
        }
        for child in named_children(decl) {
            match child.kind() {
                "import_spec" => specs.extend(import_spec(child)),
                "import_spec_list" => {
                    specs.extend(named_children(child).into_iter().filter_map(import_spec))
                }
                _ => {}
            }
        }
    }
    specs
}

/// Runtime value of a string literal node.
pub fn string_value(node: Node<'_>, source: &str) -> Option<Vec<u8>> {
    let raw = text(node, source);
    match node.kind() {
        "interpreted_string_literal" => unquote_interpreted(raw),
        "raw_string_literal" => unquote_raw(raw),
        _ => None,
    }
}

/// Decode a back-quoted literal. Carriage returns are dropped, as Go does.
pub fn unquote_raw(raw: &str) -> Option<Vec<u8>> {
    let inner = raw.strip_prefix('`')?.strip_suffix('`')?;
    Some(inner.bytes().filter(|&b| b != b'\r').collect())
}

/// Decode a double-quoted literal including all of Go's escape sequences.
pub fn unquote_interpreted(raw: &str) -> Option<Vec<u8>> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let escape = *bytes.get(i + 1)?;
        i += 2;
        match escape {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0B),
            b'\\' | b'"' | b'\'' => out.push(escape),
            b'0'..=b'7' => {
                let digits = inner.get(i - 1..i + 2)?;
                let value = u32::from_str_radix(digits, 8).ok()?;
                out.push(u8::try_from(value).ok()?);
                i += 2;
            }
            b'x' => {
                let digits = inner.get(i..i + 2)?;
                out.push(u8::from_str_radix(digits, 16).ok()?);
                i += 2;
            }
            b'u' | b'U' => {
                let width = if escape == b'u' { 4 } else { 8 };
                let digits = inner.get(i..i + width)?;
                let c = char::from_u32(u32::from_str_radix(digits, 16).ok()?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                i += width;
            }
            _ => return None,
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Tree {
        GoParser::new().unwrap().parse(source).unwrap()
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote_interpreted(r#""a\nb""#).unwrap(), b"a\nb");
        assert_eq!(unquote_interpreted(r#""\x41\101é""#).unwrap(), "AAé".as_bytes());
        assert_eq!(unquote_interpreted(r#""\xff""#).unwrap(), vec![0xFF]);
        assert_eq!(unquote_interpreted(r#""\U0001F600""#).unwrap(), "😀".as_bytes());
        assert_eq!(unquote_interpreted(r#""say \"hi\"""#).unwrap(), b"say \"hi\"");
        assert_eq!(unquote_interpreted(r#""""#).unwrap(), b"");
    }

    #[test]
    fn test_unquote_rejects_bad_input() {
        assert!(unquote_interpreted(r#""\q""#).is_none());
        assert!(unquote_interpreted(r#""\x4""#).is_none());
        assert!(unquote_interpreted("no quotes").is_none());
    }

    #[test]
    fn test_unquote_raw() {
        assert_eq!(unquote_raw("`a\\n\r\nb`").unwrap(), b"a\\n\nb");
    }

    #[test]
    fn test_exported() {
        assert!(is_exported("Greet"));
        assert!(is_exported("Ändern"));
        assert!(!is_exported("greet"));
        assert!(!is_exported("_Greet"));
        assert!(!is_exported(""));
    }

    #[test]
    fn test_import_specs() {
        let source = "package app\n\nimport (\n\tstr \"strings\"\n\t\"fmt\"\n)\n\nimport _ \"embed\"\n";
        let tree = parse(source);
        let root = tree.root_node();

        let specs = import_specs(root);
        let paths: Vec<String> = specs
            .iter()
            .map(|s| s.path_value(source).unwrap())
            .collect();
        assert_eq!(paths, vec!["strings", "fmt", "embed"]);
        assert_eq!(text(specs[0].name.unwrap(), source), "str");
        assert!(specs[1].name.is_none());
        assert_eq!(text(specs[2].name.unwrap(), source), "_");
    }

    #[test]
    fn test_selector_root() {
        let source = "package p\n\nvar x = a.b.c\n";
        let tree = parse(source);
        let mut stack = vec![tree.root_node()];
        let mut found = None;
        while let Some(node) = stack.pop() {
            if node.kind() == "selector_expression" && found.is_none() {
                found = Some(node);
            }
            stack.extend(named_children(node).into_iter().rev());
        }
        let root = selector_root(found.unwrap()).unwrap();
        assert_eq!(text(root, source), "a");
    }

    #[test]
    fn test_first_error_reports_line() {
        let source = "package p\n\nfunc f() {\n\tx := \n}\n";
        let tree = parse(source);
        let err = first_error(tree.root_node()).unwrap();
        assert!(line(err) >= 3);
        let clean = parse("package p\n");
        assert!(first_error(clean.root_node()).is_none());
    }
}
