//! The event stream produced by a parse.
//!
//! The parser does not build a syntax tree; it drives an [`EventSink`] with a
//! flat stream of definition, usage, include, message, and position-tracking
//! events. Consumers turn the stream into whatever representation they need.

use std::fmt;

/// The kind of a symbol reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// A variable at file scope.
    Global,
    /// A variable scoped to a function body.
    ///
    /// In AWK proper every non-parameter name is global, so the bundled
    /// parser never reports this kind; it exists for dialects that do have
    /// function-local declarations.
    Local,
    /// A function parameter.
    Parameter,
    /// A function.
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global variable"),
            Self::Local => write!(f, "local variable"),
            Self::Parameter => write!(f, "parameter"),
            Self::Function => write!(f, "function"),
        }
    }
}

/// The severity of a parser message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The message is an error.
    Error,
    /// The message is a warning.
    Warning,
    /// The message is informational.
    Information,
}

/// The stylistic subtype of a warning message.
///
/// Subtypes let the consumer filter style warnings by configuration without
/// the parser knowing about configuration at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A statement terminated by a newline instead of an explicit `;`.
    Comma,
    /// Syntax that is only meaningful to an extended dialect.
    Future,
}

/// A one-based line and column pair as reported by the parser.
///
/// Consumers that index documents with zero-based positions convert at their
/// own boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenPos {
    /// The one-based line number.
    // NOTE: this field must come before `column` to maintain a correct sort
    // order.
    pub line: u32,
    /// The one-based column number.
    pub column: u32,
}

impl TokenPos {
    /// Constructs a new token position from a one-based line and column.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TokenPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{line}:{column}", line = self.line, column = self.column)
    }
}

/// A call span boundary event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    /// Opens a call span at the callee name.
    ///
    /// The callee itself is reported as a function usage immediately before
    /// this event.
    Start {
        /// The position of the callee name.
        pos: TokenPos,
    },
    /// Closes the innermost open call span.
    End {
        /// The position just past the closing parenthesis.
        pos: TokenPos,
        /// The number of arguments the call supplied.
        arguments: usize,
    },
}

/// The sink for parse events.
///
/// The parser calls these methods in source order as it walks the token
/// stream. A sink is installed per parse call; no state is shared between
/// parses.
pub trait EventSink {
    /// Reports a symbol definition.
    ///
    /// `scope` is the name of the enclosing function for function-scoped
    /// kinds, or `None` for file scope. `documentation` is the raw `##` doc
    /// comment block preceding the definition, if any.
    fn define(
        &mut self,
        kind: SymbolKind,
        scope: Option<&str>,
        name: &str,
        pos: TokenPos,
        documentation: Option<&str>,
    );

    /// Reports a symbol usage.
    ///
    /// `at_definition` is set for the usage emitted at a definition site.
    fn usage(&mut self, kind: SymbolKind, name: &str, pos: TokenPos, at_definition: bool);

    /// Reports an `@include` directive.
    ///
    /// `relative` is set when the path must be resolved against the including
    /// document's directory rather than the include search path. `len` is the
    /// length of the directive through the closing quote.
    fn include(&mut self, path: &str, relative: bool, pos: TokenPos, len: u32);

    /// Reports a diagnostic message.
    fn message(
        &mut self,
        severity: Severity,
        warning: Option<WarningKind>,
        message: &str,
        pos: TokenPos,
        len: u32,
    );

    /// Reports a call span boundary.
    fn function_call(&mut self, event: CallEvent);

    /// Reports a function body boundary.
    fn function_block(&mut self, start: bool, pos: TokenPos);

    /// Reports an argument boundary of the innermost open call.
    ///
    /// A start event marks the beginning of argument slot `index`; an end
    /// event marks the closing parenthesis.
    fn parameter(&mut self, index: i32, start: bool, pos: TokenPos);

    /// Records the observed arity of a function definition.
    ///
    /// Parameters at and beyond `first_optional` were separated from the
    /// preceding ones by an extra-whitespace gap, the conventional way of
    /// declaring locals in an AWK parameter list.
    fn arity(&mut self, name: &str, parameters: &[String], first_optional: Option<usize>);
}
