//! Adaptation of the parser event stream into document mutations.
//!
//! The adapter owns the boundary between the parser's one-based positions and
//! the zero-based positions used everywhere else, filters style warnings by
//! configuration, tracks the call and block stacks behind the position
//! events, and collects discovered `@include` directives for the queue to
//! resolve after the parse.

use std::sync::Arc;

use awk_grammar::CallEvent;
use awk_grammar::EventSink;
use awk_grammar::ParseOptions;
use awk_grammar::Severity;
use awk_grammar::SymbolKind;
use awk_grammar::TokenPos;
use awk_grammar::WarningKind;
use tracing::debug;
use url::Url;

use crate::Config;
use crate::Diagnostic;
use crate::SourcePosition;
use crate::SourceRange;
use crate::document::Document;
use crate::document::FunctionBlock;
use crate::document::FunctionCall;
use crate::document::FunctionSignature;
use crate::document::ParameterUsage;
use crate::symbols::SymbolDefinition;
use crate::symbols::SymbolUsage;

/// An `@include` directive discovered during a parse.
#[derive(Debug, Clone)]
pub(crate) struct DiscoveredInclude {
    /// The path as written in the directive.
    pub path: String,
    /// Whether the path resolves against the includer's directory only.
    pub relative: bool,
    /// The range of the directive, used for resolution-failure diagnostics.
    pub site: SourceRange,
}

/// The result of validating a document.
#[derive(Debug)]
pub(crate) struct ParseOutcome {
    /// The includes discovered during the parse, in discovery order.
    pub includes: Vec<DiscoveredInclude>,
    /// Whether the parse changed the document's set of function signatures.
    pub signatures_changed: bool,
}

/// Converts a one-based parser position to a zero-based source position.
fn convert(pos: TokenPos) -> SourcePosition {
    SourcePosition::new(pos.line - 1, pos.column - 1)
}

/// An open call span on the adapter's stack.
struct OpenCall {
    /// The callee name.
    name: Arc<str>,
    /// The position of the callee.
    start: SourcePosition,
}

/// The event sink wired to a document for one parse.
struct ParseAdapter<'a> {
    /// The document being mutated.
    document: &'a mut Document,
    /// The active configuration, used to filter style warnings.
    config: &'a Config,
    /// The includes discovered so far.
    includes: Vec<DiscoveredInclude>,
    /// The stack of open call spans.
    calls: Vec<OpenCall>,
    /// The stack of open function blocks.
    blocks: Vec<(SourcePosition, Arc<str>)>,
    /// The most recent function usage, which names the next call span.
    last_callee: Option<Arc<str>>,
    /// The most recent function definition, which names the next block.
    last_function: Option<Arc<str>>,
    /// The last position observed, used to close dangling spans.
    last_position: SourcePosition,
}

impl ParseAdapter<'_> {
    /// Notes a position as the latest observed.
    fn observe(&mut self, pos: SourcePosition) {
        if pos > self.last_position {
            self.last_position = pos;
        }
    }
}

impl EventSink for ParseAdapter<'_> {
    fn define(
        &mut self,
        kind: SymbolKind,
        scope: Option<&str>,
        name: &str,
        pos: TokenPos,
        documentation: Option<&str>,
    ) {
        let pos = convert(pos);
        self.observe(pos);

        let name: Arc<str> = name.into();
        if kind == SymbolKind::Function {
            self.last_function = Some(name.clone());
        }

        self.document.record_definition(SymbolDefinition {
            name,
            kind,
            position: pos,
            scope: scope.map(Into::into),
            documentation: documentation.map(Into::into),
            implicit: false,
        });
    }

    fn usage(&mut self, kind: SymbolKind, name: &str, pos: TokenPos, at_definition: bool) {
        let pos = convert(pos);
        self.observe(pos);

        let name: Arc<str> = name.into();
        if kind == SymbolKind::Function && !at_definition {
            self.last_callee = Some(name.clone());
        }

        self.document.record_usage(SymbolUsage {
            name,
            kind,
            position: pos,
            at_definition,
        });
    }

    fn include(&mut self, path: &str, relative: bool, pos: TokenPos, len: u32) {
        let pos = convert(pos);
        self.observe(pos);
        self.includes.push(DiscoveredInclude {
            path: path.to_string(),
            relative,
            site: SourceRange::at(pos, len),
        });
    }

    fn message(
        &mut self,
        severity: Severity,
        warning: Option<WarningKind>,
        message: &str,
        pos: TokenPos,
        len: u32,
    ) {
        let wanted = match warning {
            None => true,
            Some(WarningKind::Comma) => self.config.stylistic_warnings().missing_semicolon,
            Some(WarningKind::Future) => self.config.stylistic_warnings().compatibility,
        };
        if !wanted {
            return;
        }

        let pos = convert(pos);
        self.observe(pos);
        self.document.push_parse_diagnostic(Diagnostic::new(
            severity,
            message,
            SourceRange::at(pos, len),
        ));
    }

    fn function_call(&mut self, event: CallEvent) {
        match event {
            CallEvent::Start { pos } => {
                let pos = convert(pos);
                self.observe(pos);
                self.calls.push(OpenCall {
                    name: self.last_callee.clone().unwrap_or_else(|| "".into()),
                    start: pos,
                });
            }
            CallEvent::End { pos, arguments } => {
                let pos = convert(pos);
                self.observe(pos);
                if let Some(call) = self.calls.pop() {
                    self.document.push_function_call(FunctionCall {
                        name: call.name,
                        range: SourceRange::new(call.start, pos),
                        arguments,
                    });
                }
            }
        }
    }

    fn function_block(&mut self, start: bool, pos: TokenPos) {
        let pos = convert(pos);
        self.observe(pos);
        if start {
            let function = self.last_function.clone().unwrap_or_else(|| "".into());
            self.blocks.push((pos, function));
        } else if let Some((start, function)) = self.blocks.pop() {
            self.document.push_function_block(FunctionBlock {
                range: SourceRange::new(start, pos),
                function,
            });
        }
    }

    fn parameter(&mut self, index: i32, start: bool, pos: TokenPos) {
        let pos = convert(pos);
        self.observe(pos);
        let Some(call) = self.calls.last() else {
            return;
        };

        self.document.push_parameter_usage(ParameterUsage {
            function: call.name.clone(),
            index: if start { index } else { -1 },
            position: pos,
        });
    }

    fn arity(&mut self, name: &str, parameters: &[String], first_optional: Option<usize>) {
        self.document.record_signature(
            name.into(),
            FunctionSignature {
                parameters: parameters.to_vec(),
                first_optional,
            },
        );
    }
}

/// Computes the base-name hint for a document.
///
/// The hint associates a file's leading doc block with a same-named function;
/// base names ending in `Constants` suppress it.
fn base_name_hint(uri: &Url) -> Option<String> {
    let path = uri.to_file_path().ok()?;
    let stem = path.file_stem()?.to_str()?;
    if stem.ends_with("Constants") {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Parses a source text into a document.
///
/// Any still-open function blocks are closed at the last observed position,
/// and the position-indexed tables are left sorted.
pub(crate) fn validate_document(
    document: &mut Document,
    source: Arc<str>,
    config: &Config,
) -> ParseOutcome {
    let mode_override = awk_grammar::detect_mode(&source);
    let previous = document.begin_parse(source.clone(), mode_override);

    let options = ParseOptions {
        mode: mode_override.unwrap_or_else(|| config.mode()),
        base_name: base_name_hint(document.uri()),
    };

    let mut adapter = ParseAdapter {
        document: &mut *document,
        config,
        includes: Vec::new(),
        calls: Vec::new(),
        blocks: Vec::new(),
        last_callee: None,
        last_function: None,
        last_position: SourcePosition::default(),
    };

    let result = awk_grammar::parse(&source, &options, &mut adapter);

    let last = adapter.last_position;
    let includes = adapter.includes;
    let blocks = adapter.blocks;
    for (start, function) in blocks.into_iter().rev() {
        document.push_function_block(FunctionBlock {
            range: SourceRange::new(start, last),
            function,
        });
    }

    if let Err(e) = result {
        debug!(
            "parser gave up on `{uri}` at {pos}",
            uri = document.uri(),
            pos = e.pos
        );
        document.push_parse_diagnostic(Diagnostic::error(
            "the parser could not process this file",
            SourceRange::at(convert(e.pos), 1),
        ));
    }

    document.finish_parse();

    let signatures_changed = previous != *document.signatures();
    ParseOutcome {
        includes,
        signatures_changed,
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::StylisticWarnings;

    /// Creates a test document.
    fn document(name: &str) -> Document {
        Document::new(Arc::new(
            Url::parse(&format!("file:///{name}")).expect("URI should parse"),
        ))
    }

    /// Validates a source string against a fresh document.
    fn validate(name: &str, source: &str, config: &Config) -> (Document, ParseOutcome) {
        let mut doc = document(name);
        let outcome = validate_document(&mut doc, source.into(), config);
        (doc, outcome)
    }

    #[test]
    fn it_keeps_usages_sorted_after_a_parse() {
        let source = "function f(a) { return a }\nBEGIN { x = f(1); print x }\n";
        let (doc, _) = validate("test.awk", source, &Config::default());

        let positions: Vec<_> = doc.usages().iter().map(|u| u.position).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn it_collects_includes_in_discovery_order() {
        let source = "@include \"a.awk\"\n@include \"b.awk\"\n";
        let (_, outcome) = validate("test.awk", source, &Config::default());

        let paths: Vec<_> = outcome.includes.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["a.awk", "b.awk"]);
    }

    #[test]
    fn it_builds_function_blocks_and_call_records() {
        let source = "function add(a, b) {\n    return a + b\n}\nBEGIN { print add(1, 2) }\n";
        let (doc, _) = validate("test.awk", source, &Config::default());

        assert_eq!(
            doc.enclosing_function(SourcePosition::new(1, 8)).map(|f| &**f),
            Some("add")
        );
        assert!(doc.enclosing_function(SourcePosition::new(3, 0)).is_none());

        let calls = doc.function_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(&*calls[0].name, "add");
        assert_eq!(calls[0].arguments, 2);
    }

    #[test]
    fn it_closes_dangling_function_blocks_at_the_last_position() {
        let source = "function f(a) { a";
        let (doc, _) = validate("test.awk", source, &Config::default());

        assert_eq!(
            doc.enclosing_function(SourcePosition::new(0, 16)).map(|f| &**f),
            Some("f")
        );
    }

    #[test]
    fn it_records_sentinel_markers() {
        let source = "BEGIN { print substr(\"abc\", 1, 2) }\n";
        let (doc, _) = validate("test.awk", source, &Config::default());

        let markers = doc.parameter_markers();
        let indexes: Vec<_> = markers.iter().map(|m| m.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, -1]);
        assert!(markers.iter().all(|m| &*m.function == "substr"));
    }

    #[test]
    fn it_detects_signature_changes() {
        let mut doc = document("lib.awk");
        let config = Config::default();

        let outcome = validate_document(&mut doc, "function f(x, y) {}\n".into(), &config);
        assert!(outcome.signatures_changed);

        // Same signatures parse cleanly as unchanged.
        let outcome = validate_document(&mut doc, "function f(x, y) {}\n".into(), &config);
        assert!(!outcome.signatures_changed);

        // Adding a parameter changes the signature set.
        let outcome = validate_document(&mut doc, "function f(x, y, z) {}\n".into(), &config);
        assert!(outcome.signatures_changed);

        // A body-only edit does not.
        let outcome =
            validate_document(&mut doc, "function f(x, y, z) { return x }\n".into(), &config);
        assert!(!outcome.signatures_changed);
    }

    #[test]
    fn it_filters_style_warnings_by_configuration() {
        let source = "BEGIN {\n    x = 1\n}\n";

        let silent = Config::default();
        let (doc, _) = validate("test.awk", source, &silent);
        assert!(doc.diagnostics_capped(100).is_empty());

        let noisy = silent.with_stylistic_warnings(StylisticWarnings {
            missing_semicolon: true,
            ..Default::default()
        });
        let (doc, _) = validate("test.awk", source, &noisy);
        let diagnostics = doc.diagnostics_capped(100);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message().contains("missing `;`"));
    }

    #[test]
    fn it_applies_the_shebang_mode_override() {
        let source = "#!/usr/bin/awk -f\nBEGIN { x = 2 ** 3 }\n";
        let config = Config::default();
        let (doc, _) = validate("test.awk", source, &config);

        assert_eq!(doc.mode(&config), awk_grammar::Mode::Awk);
        let diagnostics = doc.diagnostics_capped(100);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message().contains("gawk extension"));
    }

    #[test]
    fn it_suppresses_the_base_name_hint_for_constants_files() {
        let source = "## Header doc.\n\nfunction colorConstants() {}\n";
        let (doc, _) = validate("colorConstants.awk", source, &Config::default());
        let defs = doc.definitions_of(SymbolKind::Function, "colorConstants");
        assert_eq!(defs.len(), 1);
        assert!(defs[0].documentation.is_none());

        let source = "## Header doc.\n\nfunction colors() {}\n";
        let (doc, _) = validate("colors.awk", source, &Config::default());
        let defs = doc.definitions_of(SymbolKind::Function, "colors");
        assert_eq!(defs[0].documentation.as_deref(), Some("## Header doc."));
    }
}
