//! Representation of a single analyzed document.

use std::sync::Arc;

use awk_grammar::Mode;
use awk_grammar::SymbolKind;
use indexmap::IndexMap;
use url::Url;

use crate::Config;
use crate::Diagnostic;
use crate::SourcePosition;
use crate::SourceRange;
use crate::symbols::SymbolDefinition;
use crate::symbols::SymbolId;
use crate::symbols::SymbolUsage;

/// The recorded signature of a function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FunctionSignature {
    /// The parameter names, in order.
    pub parameters: Vec<String>,
    /// The index of the first optional parameter, if any.
    pub first_optional: Option<usize>,
}

/// The lexical extent of a function body.
#[derive(Debug, Clone)]
pub(crate) struct FunctionBlock {
    /// The range of the body, from its opening brace through its closing
    /// brace.
    pub range: SourceRange,
    /// The name of the function.
    pub function: Arc<str>,
}

/// A recorded function call, used for arity checking.
#[derive(Debug, Clone)]
pub(crate) struct FunctionCall {
    /// The callee name.
    pub name: Arc<str>,
    /// The range of the call, from the callee through the closing
    /// parenthesis.
    pub range: SourceRange,
    /// The number of arguments supplied.
    pub arguments: usize,
}

/// An argument-position marker, used for signature help.
///
/// A marker with a negative index is the sentinel recorded at a call's
/// closing parenthesis.
#[derive(Debug, Clone)]
pub(crate) struct ParameterUsage {
    /// The name of the called function.
    pub function: Arc<str>,
    /// The zero-based argument index, or `-1` for the closing sentinel.
    pub index: i32,
    /// The position of the marker.
    pub position: SourcePosition,
}

/// The analysis state for one source file URI.
#[derive(Debug)]
pub(crate) struct Document {
    /// The URI of the document.
    uri: Arc<Url>,
    /// The most recently parsed source text.
    source: Arc<str>,
    /// The dialect override detected from the document's shebang, if any.
    mode_override: Option<Mode>,
    /// Diagnostics produced by the parse.
    parse_diagnostics: Vec<Diagnostic>,
    /// Diagnostics produced by cross-document analysis.
    analysis_diagnostics: Vec<Diagnostic>,
    /// Definitions keyed by kind and name, each in recording order.
    defined: IndexMap<SymbolId, Vec<SymbolDefinition>>,
    /// Usages, sorted by position after each parse.
    used: Vec<SymbolUsage>,
    /// Argument-position markers, sorted by position after each parse.
    parameter_usage: Vec<ParameterUsage>,
    /// Function body extents, sorted by start and non-overlapping.
    function_blocks: Vec<FunctionBlock>,
    /// Function calls in source order.
    function_calls: Vec<FunctionCall>,
    /// The signatures of the functions defined by the document.
    signatures: IndexMap<Arc<str>, FunctionSignature>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new(uri: Arc<Url>) -> Self {
        Self {
            uri,
            source: "".into(),
            mode_override: None,
            parse_diagnostics: Vec::new(),
            analysis_diagnostics: Vec::new(),
            defined: IndexMap::new(),
            used: Vec::new(),
            parameter_usage: Vec::new(),
            function_blocks: Vec::new(),
            function_calls: Vec::new(),
            signatures: IndexMap::new(),
        }
    }

    /// Gets the URI of the document.
    pub fn uri(&self) -> &Arc<Url> {
        &self.uri
    }

    /// Gets the most recently parsed source text.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// Gets the dialect the document is analyzed under.
    ///
    /// A shebang override takes precedence over the configured mode.
    pub fn mode(&self, config: &Config) -> Mode {
        self.mode_override.unwrap_or_else(|| config.mode())
    }

    /// Resets the document for a new parse.
    ///
    /// Returns the previous function signatures so the caller can detect
    /// signature changes.
    pub fn begin_parse(
        &mut self,
        source: Arc<str>,
        mode_override: Option<Mode>,
    ) -> IndexMap<Arc<str>, FunctionSignature> {
        self.source = source;
        self.mode_override = mode_override;
        self.parse_diagnostics.clear();
        self.defined.clear();
        self.used.clear();
        self.parameter_usage.clear();
        self.function_blocks.clear();
        self.function_calls.clear();
        std::mem::take(&mut self.signatures)
    }

    /// Finishes a parse by sorting the position-indexed tables.
    pub fn finish_parse(&mut self) {
        self.used.sort_by_key(|u| u.position);
        self.parameter_usage.sort_by_key(|m| m.position);
        self.function_blocks.sort_by_key(|b| b.range.start);
    }

    /// Records a definition.
    pub fn record_definition(&mut self, definition: SymbolDefinition) {
        self.defined
            .entry(SymbolId::new(definition.kind, definition.name.clone()))
            .or_default()
            .push(definition);
    }

    /// Records a usage.
    ///
    /// Referencing a global variable is its declaration: a global usage with
    /// no definition for the name in this document synthesizes an implicit
    /// definition at the usage position.
    pub fn record_usage(&mut self, usage: SymbolUsage) {
        if usage.kind == SymbolKind::Global {
            let id = SymbolId::new(SymbolKind::Global, usage.name.clone());
            if !self.defined.contains_key(&id) {
                self.record_definition(SymbolDefinition {
                    name: usage.name.clone(),
                    kind: SymbolKind::Global,
                    position: usage.position,
                    scope: None,
                    documentation: None,
                    implicit: true,
                });
            }
        }

        self.used.push(usage);
    }

    /// Records a parse diagnostic.
    pub fn push_parse_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.parse_diagnostics.push(diagnostic);
    }

    /// Replaces the analysis diagnostics.
    pub fn set_analysis_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        self.analysis_diagnostics = diagnostics;
    }

    /// Records a function block extent.
    pub fn push_function_block(&mut self, block: FunctionBlock) {
        self.function_blocks.push(block);
    }

    /// Records a function call.
    pub fn push_function_call(&mut self, call: FunctionCall) {
        self.function_calls.push(call);
    }

    /// Records an argument-position marker.
    pub fn push_parameter_usage(&mut self, marker: ParameterUsage) {
        self.parameter_usage.push(marker);
    }

    /// Records a function signature.
    pub fn record_signature(&mut self, name: Arc<str>, signature: FunctionSignature) {
        self.signatures.insert(name, signature);
    }

    /// Gets the signatures of the functions defined by the document.
    pub fn signatures(&self) -> &IndexMap<Arc<str>, FunctionSignature> {
        &self.signatures
    }

    /// Gets the signature of a function defined by the document.
    pub fn signature_of(&self, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(name)
    }

    /// Iterates the definition table.
    pub fn defined(&self) -> impl Iterator<Item = (&SymbolId, &Vec<SymbolDefinition>)> {
        self.defined.iter()
    }

    /// Gets the definitions for a kind and name.
    pub fn definitions_of(&self, kind: SymbolKind, name: &str) -> &[SymbolDefinition] {
        self.defined
            .get(&SymbolId::new(kind, name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates the usages in position order.
    pub fn usages(&self) -> &[SymbolUsage] {
        &self.used
    }

    /// Iterates the recorded function calls.
    pub fn function_calls(&self) -> &[FunctionCall] {
        &self.function_calls
    }

    /// Finds the usage covering a position via binary search.
    pub fn find_usage_at(&self, position: SourcePosition) -> Option<&SymbolUsage> {
        let index = self.used.partition_point(|u| u.position <= position);
        let usage = self.used[..index].last()?;
        usage.covers(position).then_some(usage)
    }

    /// Finds the name of the function whose body covers a position.
    pub fn enclosing_function(&self, position: SourcePosition) -> Option<&Arc<str>> {
        let index = self
            .function_blocks
            .partition_point(|b| b.range.start <= position);
        let block = self.function_blocks[..index].last()?;
        block.range.contains(position).then_some(&block.function)
    }

    /// Finds the argument-position marker at or immediately before a
    /// position via binary search.
    pub fn parameter_marker_at(&self, position: SourcePosition) -> Option<&ParameterUsage> {
        let index = self
            .parameter_usage
            .partition_point(|m| m.position <= position);
        self.parameter_usage[..index].last()
    }

    /// Gets the document's diagnostics, parse first, capped at the given
    /// maximum.
    pub fn diagnostics_capped(&self, max: usize) -> Vec<Diagnostic> {
        self.parse_diagnostics
            .iter()
            .chain(self.analysis_diagnostics.iter())
            .take(max)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    /// Gets the usages table for invariant checks.
    pub fn parameter_markers(&self) -> &[ParameterUsage] {
        &self.parameter_usage
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Creates a test document.
    fn document() -> Document {
        Document::new(Arc::new(
            Url::parse("file:///test.awk").expect("URI should parse"),
        ))
    }

    /// Creates a usage record.
    fn usage(name: &str, line: u32, character: u32) -> SymbolUsage {
        SymbolUsage {
            name: name.into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(line, character),
            at_definition: false,
        }
    }

    #[test]
    fn it_synthesizes_implicit_definitions_on_first_use() {
        let mut doc = document();
        doc.record_usage(usage("y", 0, 17));
        doc.record_usage(usage("y", 2, 3));

        let defs = doc.definitions_of(SymbolKind::Global, "y");
        assert_eq!(defs.len(), 1);
        assert!(defs[0].implicit);
        assert_eq!(defs[0].position, SourcePosition::new(0, 17));
    }

    #[test]
    fn it_does_not_synthesize_when_a_definition_exists() {
        let mut doc = document();
        doc.record_definition(SymbolDefinition {
            name: "x".into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(0, 8),
            scope: None,
            documentation: None,
            implicit: false,
        });
        doc.record_usage(usage("x", 0, 8));

        let defs = doc.definitions_of(SymbolKind::Global, "x");
        assert_eq!(defs.len(), 1);
        assert!(!defs[0].implicit);
    }

    #[test]
    fn it_keeps_an_earlier_implicit_definition_alongside_a_later_explicit_one() {
        let mut doc = document();
        doc.record_usage(usage("n", 0, 4));
        doc.record_definition(SymbolDefinition {
            name: "n".into(),
            kind: SymbolKind::Global,
            position: SourcePosition::new(3, 0),
            scope: None,
            documentation: None,
            implicit: false,
        });

        let defs = doc.definitions_of(SymbolKind::Global, "n");
        assert_eq!(defs.len(), 2);
        assert!(defs[0].implicit);
        assert!(!defs[1].implicit);
    }

    #[test]
    fn it_finds_usages_by_position() {
        let mut doc = document();
        doc.record_usage(usage("bb", 1, 8));
        doc.record_usage(usage("a", 0, 4));
        doc.record_usage(usage("cc", 1, 12));
        doc.finish_parse();

        assert_eq!(
            doc.find_usage_at(SourcePosition::new(0, 5)).map(|u| &*u.name),
            Some("a")
        );
        assert_eq!(
            doc.find_usage_at(SourcePosition::new(1, 10)).map(|u| &*u.name),
            Some("bb")
        );
        assert_eq!(
            doc.find_usage_at(SourcePosition::new(1, 12)).map(|u| &*u.name),
            Some("cc")
        );
        assert!(doc.find_usage_at(SourcePosition::new(1, 11)).is_none());
        assert!(doc.find_usage_at(SourcePosition::new(3, 0)).is_none());
    }

    #[test]
    fn it_sorts_usages_on_finish() {
        let mut doc = document();
        doc.record_usage(usage("b", 2, 0));
        doc.record_usage(usage("a", 0, 0));
        doc.record_usage(usage("c", 1, 5));
        doc.finish_parse();

        let positions: Vec<_> = doc.usages().iter().map(|u| u.position).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn it_resolves_enclosing_functions() {
        let mut doc = document();
        doc.push_function_block(FunctionBlock {
            range: SourceRange::new(SourcePosition::new(5, 16), SourcePosition::new(8, 1)),
            function: "second".into(),
        });
        doc.push_function_block(FunctionBlock {
            range: SourceRange::new(SourcePosition::new(0, 14), SourcePosition::new(3, 1)),
            function: "first".into(),
        });
        doc.finish_parse();

        assert_eq!(
            doc.enclosing_function(SourcePosition::new(1, 0)).map(|f| &**f),
            Some("first")
        );
        assert_eq!(
            doc.enclosing_function(SourcePosition::new(6, 0)).map(|f| &**f),
            Some("second")
        );
        assert!(doc.enclosing_function(SourcePosition::new(4, 0)).is_none());
        assert!(doc.enclosing_function(SourcePosition::new(9, 0)).is_none());
    }

    #[test]
    fn it_caps_diagnostics() {
        let mut doc = document();
        let range = SourceRange::at(SourcePosition::new(0, 0), 1);
        for i in 0..5 {
            doc.push_parse_diagnostic(Diagnostic::error(format!("problem {i}"), range));
        }
        doc.set_analysis_diagnostics(vec![Diagnostic::warning("analysis", range)]);

        assert_eq!(doc.diagnostics_capped(3).len(), 3);
        assert_eq!(doc.diagnostics_capped(100).len(), 6);
    }

    #[test]
    fn it_returns_previous_signatures_on_begin_parse() {
        let mut doc = document();
        doc.record_signature(
            "f".into(),
            FunctionSignature {
                parameters: vec!["x".to_string()],
                first_optional: None,
            },
        );

        let previous = doc.begin_parse("".into(), None);
        assert_eq!(previous.len(), 1);
        assert!(doc.signatures().is_empty());
    }
}
