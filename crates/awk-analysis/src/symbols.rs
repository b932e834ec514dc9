//! Symbol records kept by a document.

use std::sync::Arc;

use awk_grammar::SymbolKind;

use crate::SourcePosition;
use crate::SourceRange;

/// Identifies a symbol table entry by kind and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolId {
    /// The symbol kind.
    pub kind: SymbolKind,
    /// The symbol name.
    pub name: Arc<str>,
}

impl SymbolId {
    /// Constructs a new symbol identifier.
    pub fn new(kind: SymbolKind, name: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A recorded symbol definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDefinition {
    /// The symbol name.
    pub name: Arc<str>,
    /// The symbol kind.
    pub kind: SymbolKind,
    /// The position of the definition.
    pub position: SourcePosition,
    /// The name of the enclosing function, or `None` for file scope.
    pub scope: Option<Arc<str>>,
    /// The raw doc comment attached to the definition, if any.
    pub documentation: Option<String>,
    /// Whether the definition was synthesized from a first use.
    ///
    /// In AWK, referencing a global variable is its declaration; the first
    /// use of an otherwise-undefined global synthesizes a definition at the
    /// use site.
    pub implicit: bool,
}

impl SymbolDefinition {
    /// Gets the source range covering the defined name.
    pub fn range(&self) -> SourceRange {
        SourceRange::at(self.position, self.name.len() as u32)
    }

    /// Whether the definition is visible from the given enclosing function.
    ///
    /// File-scope definitions are visible everywhere; function-scoped
    /// definitions are visible only within their function.
    pub fn in_scope(&self, enclosing: Option<&str>) -> bool {
        match self.scope.as_deref() {
            None => true,
            Some(scope) => enclosing == Some(scope),
        }
    }
}

/// A recorded symbol usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolUsage {
    /// The symbol name.
    pub name: Arc<str>,
    /// The symbol kind.
    pub kind: SymbolKind,
    /// The position of the usage.
    pub position: SourcePosition,
    /// Whether the usage was emitted at a definition site.
    pub at_definition: bool,
}

impl SymbolUsage {
    /// Gets the source range covering the used name.
    pub fn range(&self) -> SourceRange {
        SourceRange::at(self.position, self.name.len() as u32)
    }

    /// Whether the usage covers the given position.
    ///
    /// A usage covers a position on its own line from its first character
    /// through the character just past its name; a zero-length usage matches
    /// only exact equality.
    pub fn covers(&self, position: SourcePosition) -> bool {
        position.line == self.position.line
            && self.position.character <= position.character
            && position.character <= self.position.character + self.name.len() as u32
    }
}

/// Left-aligns a doc comment by stripping the common leading `##` and
/// whitespace prefix from all of its lines.
pub fn align_documentation(documentation: &str) -> String {
    let lines: Vec<&str> = documentation.lines().collect();
    let Some(first) = lines.first() else {
        return String::new();
    };

    // The longest shared byte prefix across lines, truncated to its leading
    // run of `#` and ASCII whitespace. The truncation keeps the cut on a
    // character boundary.
    let mut shared = first.len();
    for line in &lines[1..] {
        let common = first
            .bytes()
            .zip(line.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        shared = shared.min(common);
    }
    let prefix_len = first
        .bytes()
        .take(shared)
        .take_while(|b| *b == b'#' || b.is_ascii_whitespace())
        .count();

    lines
        .iter()
        .map(|line| line.get(prefix_len..).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn it_aligns_documentation() {
        assert_eq!(
            align_documentation("## Adds two numbers.\n## Really."),
            "Adds two numbers.\nReally."
        );
        assert_eq!(
            align_documentation("##   One extra indent\n##   kept relative"),
            "One extra indent\nkept relative"
        );
        assert_eq!(
            align_documentation("## first\n##     indented"),
            "first\n    indented"
        );
        assert_eq!(align_documentation(""), "");
    }

    #[test]
    fn it_reports_usage_coverage() {
        let usage = SymbolUsage {
            name: "total".into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(2, 4),
            at_definition: false,
        };

        assert!(usage.covers(SourcePosition::new(2, 4)));
        assert!(usage.covers(SourcePosition::new(2, 7)));
        assert!(usage.covers(SourcePosition::new(2, 9)));
        assert!(!usage.covers(SourcePosition::new(2, 3)));
        assert!(!usage.covers(SourcePosition::new(2, 10)));
        assert!(!usage.covers(SourcePosition::new(1, 4)));
    }

    #[test]
    fn it_matches_zero_length_usages_exactly() {
        let usage = SymbolUsage {
            name: "".into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(0, 2),
            at_definition: false,
        };

        assert!(usage.covers(SourcePosition::new(0, 2)));
        assert!(!usage.covers(SourcePosition::new(0, 1)));
        assert!(!usage.covers(SourcePosition::new(0, 3)));
    }

    #[test]
    fn it_scopes_definitions() {
        let file_scope = SymbolDefinition {
            name: "count".into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(0, 0),
            scope: None,
            documentation: None,
            implicit: false,
        };
        let fn_scope = SymbolDefinition {
            name: "i".into(),
            kind: SymbolKind::Parameter,
            position: SourcePosition::new(1, 12),
            scope: Some("walk".into()),
            documentation: None,
            implicit: false,
        };

        assert!(file_scope.in_scope(None));
        assert!(file_scope.in_scope(Some("walk")));
        assert!(fn_scope.in_scope(Some("walk")));
        assert!(!fn_scope.in_scope(Some("other")));
        assert!(!fn_scope.in_scope(None));
    }
}
