//! Identifier collection.
//!
//! Walks a project file once, in document order, and produces the list of
//! edits the assembler will later apply. Because the patcher requires edits in
//! ascending source order, every edit is pushed at the moment its node is
//! reached and never reordered.
//!
//! External files go through [`harvest_exported`] instead, which only records
//! exported names so no replacement can shadow them.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::warn;
use tree_sitter::Node;

use crate::config::DirectiveConfig;
use crate::error::{ObfError, Result};
use crate::patch::Span;
use crate::registry::IdentRegistry;
use crate::resolver::ResolvedPackage;
use crate::string_protect::StringProtector;
use crate::syntax::{
    fields, import_spec, is_exported, is_identifier, is_string_literal, line, named_children,
    selector_root, span, string_value, text,
};
use crate::types::Replacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    PreserveFields,
    Protect,
}

/// Directive comments of a file, keyed by one-based line.
#[derive(Debug, Default)]
pub struct DirectiveIndex {
    lines: HashMap<usize, (Directive, Span)>,
}

impl DirectiveIndex {
    pub fn scan(root: Node<'_>, source: &str, markers: &DirectiveConfig) -> Self {
        let mut lines = HashMap::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.kind() == "comment" {
                let comment = text(node, source).trim();
                if comment == markers.preserve_fields.trim() {
                    lines.insert(line(node), (Directive::PreserveFields, span(node)));
                } else if comment == markers.protect.trim() {
                    lines.insert(line(node), (Directive::Protect, span(node)));
                }
                continue;
            }
            stack.extend(named_children(node));
        }
        Self { lines }
    }

    /// Directive on the line directly above `node`, with that line.
    pub fn above(&self, node: Node<'_>) -> Option<(usize, Directive)> {
        let directive_line = line(node).checked_sub(1)?;
        self.lines
            .get(&directive_line)
            .map(|(directive, _)| (directive_line, *directive))
    }

    /// True when `comment` is itself one of the indexed directives.
    pub fn is_marker(&self, comment: Node<'_>) -> bool {
        self.lines
            .get(&line(comment))
            .is_some_and(|(_, marker)| *marker == span(comment))
    }

    /// Lines holding `directive`, in ascending order.
    pub fn lines_of(&self, directive: Directive) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .lines
            .iter()
            .filter(|(_, (d, _))| *d == directive)
            .map(|(l, _)| *l)
            .collect();
        lines.sort_unstable();
        lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Whether the walker should continue into a node's children.
enum Walk {
    Descend,
    Skip,
}

/// Edits and generated code collected for one file.
#[derive(Debug, Default)]
pub struct FileEdits {
    pub replacements: Vec<Replacement>,
    pub append_content: String,
    pub protected_strings: usize,
}

pub struct FileCollector<'a> {
    path: &'a Path,
    source: &'a str,
    directives: DirectiveIndex,
    /// Resolution of each import spec, keyed by the spec's start byte.
    imports: HashMap<usize, ResolvedPackage>,
    /// Local names bound to external packages in this file.
    aliases: HashSet<String>,
    registry: &'a mut IdentRegistry,
    protector: &'a mut StringProtector,
    /// Directive lines acted upon during the walk.
    consumed: HashSet<usize>,
    /// Depth of preserved struct declarations currently being walked.
    preserving: usize,
    preserved_fields: usize,
    edits: FileEdits,
}

impl<'a> FileCollector<'a> {
    pub fn new(
        path: &'a Path,
        source: &'a str,
        directives: DirectiveIndex,
        imports: HashMap<usize, ResolvedPackage>,
        registry: &'a mut IdentRegistry,
        protector: &'a mut StringProtector,
    ) -> Self {
        Self {
            path,
            source,
            directives,
            imports,
            aliases: HashSet::new(),
            consumed: HashSet::new(),
            registry,
            protector,
            preserving: 0,
            preserved_fields: 0,
            edits: FileEdits::default(),
        }
    }

    pub fn collect(mut self, root: Node<'_>) -> Result<FileEdits> {
        self.walk(root)?;

        // A protect directive nothing consumed would leave its literal in plain text.
        if let Some(directive_line) = self
            .directives
            .lines_of(Directive::Protect)
            .into_iter()
            .find(|l| !self.consumed.contains(l))
        {
            return Err(ObfError::DirectiveMisuse {
                file: self.path.to_path_buf(),
                line: directive_line + 1,
                reason: "protect directive must precede a var declaration with string values"
                    .to_string(),
            });
        }
        Ok(self.edits)
    }

    fn walk(&mut self, node: Node<'_>) -> Result<()> {
        if let Walk::Descend = self.enter(node)? {
            for child in named_children(node) {
                self.walk(child)?;
            }
        }
        Ok(())
    }

    fn enter(&mut self, node: Node<'_>) -> Result<Walk> {
        let kind = node.kind();
        match kind {
            "comment" => {
                if self.directives.is_marker(node) {
                    self.push(Replacement::Literal {
                        span: span(node),
                        text: String::new(),
                    });
                }
                Ok(Walk::Skip)
            }
            "package_clause" => {
                for child in named_children(node) {
                    if child.kind() == "package_identifier" {
                        self.push(Replacement::PackageName { span: span(child) });
                    }
                }
                Ok(Walk::Skip)
            }
            "import_spec" => {
                self.enter_import(node);
                Ok(Walk::Skip)
            }
            "selector_expression" | "qualified_type" => {
                let is_alias = selector_root(node)
                    .is_some_and(|root| self.aliases.contains(text(root, self.source)));
                Ok(if is_alias { Walk::Skip } else { Walk::Descend })
            }
            "type_spec" => self.enter_type_spec(node),
            "var_spec" => self.enter_var_spec(node),
            "short_var_declaration" => self.enter_short_var(node),
            "field_declaration" if self.preserving > 0 => self.enter_preserved_field(node),
            "const_spec" | "function_declaration" | "method_declaration" | "type_alias" => {
                if let Some((_, Directive::Protect)) = self.directive_for(node) {
                    return Err(self.misuse(
                        node,
                        "protect directive must precede a var declaration".to_string(),
                    ));
                }
                Ok(Walk::Descend)
            }
            _ if is_identifier(kind) => {
                self.push(Replacement::Rename {
                    span: span(node),
                    name: text(node, self.source).to_string(),
                });
                Ok(Walk::Skip)
            }
            _ if is_string_literal(kind) => Ok(Walk::Skip),
            _ => Ok(Walk::Descend),
        }
    }

    fn enter_import(&mut self, node: Node<'_>) {
        let Some(spec) = import_spec(node) else {
            return;
        };
        let Some(resolved) = self.imports.get(&node.start_byte()).cloned() else {
            return;
        };
        let binding = spec.name.map(|n| (n, text(n, self.source)));

        if resolved.in_project {
            if let Some((name, alias)) = binding {
                if name.kind() == "package_identifier" {
                    self.push(Replacement::Rename {
                        span: span(name),
                        name: alias.to_string(),
                    });
                }
            }
            self.push(Replacement::ImportPath {
                span: span(spec.path),
                target: resolved.id,
            });
            return;
        }

        let alias = match binding {
            Some((_, "_" | ".")) => return,
            Some((_, alias)) => alias.to_string(),
            None => resolved.name,
        };
        self.registry.exclude(alias.clone());
        self.aliases.insert(alias);
    }

    fn enter_type_spec(&mut self, node: Node<'_>) -> Result<Walk> {
        match self.directive_for(node) {
            Some((directive_line, Directive::PreserveFields)) => {
                self.consumed.insert(directive_line);
                let before = self.preserved_fields;
                self.preserving += 1;
                let walked = self.walk_children(node);
                self.preserving -= 1;
                walked?;
                if self.preserved_fields == before {
                    warn!(
                        "{}:{}: preserve-fields directive on a type without struct fields",
                        self.path.display(),
                        line(node)
                    );
                }
                Ok(Walk::Skip)
            }
            Some((_, Directive::Protect)) => Err(self.misuse(
                node,
                "protect directive must precede a var declaration".to_string(),
            )),
            None => Ok(Walk::Descend),
        }
    }

    /// Field names of a preserved struct are excluded; their types are still walked.
    fn enter_preserved_field(&mut self, node: Node<'_>) -> Result<Walk> {
        for (field, child) in fields(node) {
            if !child.is_named() {
                continue;
            }
            if field == Some("name") {
                self.registry.exclude(text(child, self.source));
                self.preserved_fields += 1;
            } else {
                self.walk(child)?;
            }
        }
        Ok(Walk::Skip)
    }

    fn enter_var_spec(&mut self, node: Node<'_>) -> Result<Walk> {
        let directive_line = match self.directive_for(node) {
            Some((directive_line, Directive::Protect)) => directive_line,
            Some((_, Directive::PreserveFields)) => {
                warn!(
                    "{}:{}: preserve-fields directive ignored on a var declaration",
                    self.path.display(),
                    line(node)
                );
                return Ok(Walk::Descend);
            }
            None => return Ok(Walk::Descend),
        };

        if node.child_by_field_name("value").is_none() {
            return Err(self.misuse(node, "protected var declaration has no value".to_string()));
        }
        self.consumed.insert(directive_line);
        self.protect_values(node, "value")
    }

    /// `name := "value"` is a variable form too.
    fn enter_short_var(&mut self, node: Node<'_>) -> Result<Walk> {
        match self.directive_for(node) {
            Some((directive_line, Directive::Protect)) => {
                self.consumed.insert(directive_line);
                self.protect_values(node, "right")
            }
            _ => Ok(Walk::Descend),
        }
    }

    /// Walk `node`, protecting every expression under `value_field`.
    fn protect_values(&mut self, node: Node<'_>, value_field: &str) -> Result<Walk> {
        for (field, child) in fields(node) {
            if !child.is_named() {
                continue;
            }
            if field == Some(value_field) {
                for value in named_children(child) {
                    self.protect_value(value)?;
                }
            } else {
                self.walk(child)?;
            }
        }
        Ok(Walk::Skip)
    }

    fn protect_value(&mut self, value: Node<'_>) -> Result<()> {
        if value.kind() == "comment" {
            return Ok(());
        }
        if !is_string_literal(value.kind()) {
            return Err(self.misuse(
                value,
                format!(
                    "protected value must be a string literal, found {}",
                    value.kind()
                ),
            ));
        }
        let bytes = string_value(value, self.source).ok_or_else(|| {
            self.misuse(value, "protected string literal could not be decoded".to_string())
        })?;

        let protected = self.protector.protect(&bytes);
        self.push(Replacement::Literal {
            span: span(value),
            text: protected.call(),
        });
        self.edits.append_content.push('\n');
        self.edits.append_content.push_str(&protected.body);
        self.edits.protected_strings += 1;
        Ok(())
    }

    fn walk_children(&mut self, node: Node<'_>) -> Result<()> {
        for child in named_children(node) {
            self.walk(child)?;
        }
        Ok(())
    }

    /// Directive above a spec, or above the declaration that groups it.
    fn directive_for(&self, node: Node<'_>) -> Option<(usize, Directive)> {
        if self.directives.is_empty() {
            return None;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(found) = self.directives.above(n) {
                return Some(found);
            }
            if n.kind().ends_with("_declaration") {
                break;
            }
            current = n.parent();
        }
        None
    }

    fn push(&mut self, replacement: Replacement) {
        self.edits.replacements.push(replacement);
    }

    fn misuse(&self, node: Node<'_>, reason: String) -> ObfError {
        ObfError::DirectiveMisuse {
            file: self.path.to_path_buf(),
            line: line(node),
            reason,
        }
    }
}

/// Record every exported name of an external file.
///
/// Function and method bodies are not entered; only their names can be seen
/// from outside the package.
pub fn harvest_exported(root: Node<'_>, source: &str, registry: &mut IdentRegistry) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let kind = node.kind();
        match kind {
            "function_declaration" | "method_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = text(name, source);
                    if is_exported(name) {
                        registry.exclude(name);
                    }
                }
            }
            "import_declaration" | "comment" => {}
            _ if is_string_literal(kind) => {}
            _ if is_identifier(kind) => {
                let name = text(node, source);
                if is_exported(name) {
                    registry.exclude(name);
                }
            }
            _ => stack.extend(named_children(node)),
        }
    }
}
