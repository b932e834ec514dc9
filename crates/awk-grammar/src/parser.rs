//! Module for the parser implementation.
//!
//! The parser performs a single permissive pass over the token stream and
//! drives an [`EventSink`] with everything a consumer needs to build symbol
//! tables: definitions, usages, includes, call spans with argument markers,
//! function body spans, and diagnostic messages. It recovers from anything it
//! does not understand; the only hard failure is pathological nesting.

use line_index::LineIndex;

use crate::Mode;
use crate::events::CallEvent;
use crate::events::EventSink;
use crate::events::Severity;
use crate::events::SymbolKind;
use crate::events::TokenPos;
use crate::events::WarningKind;
use crate::lexer::Lexeme;
use crate::lexer::Token;
use crate::lexer::tokenize;

/// The maximum nesting depth of braces or grouping constructs.
///
/// Exceeding the limit aborts the parse with a [`ParseError`].
const MAX_NESTING: usize = 256;

/// Options controlling a single parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// The dialect to parse under.
    pub mode: Mode,
    /// The base name of the file being parsed, if any.
    ///
    /// When present, a leading `##` doc block of the file is attached to a
    /// function definition of the same name.
    pub base_name: Option<String>,
}

/// An unrecoverable parse failure.
///
/// The position is the last token position the parser observed, suitable for
/// anchoring a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("parsing gave up at {pos}")]
pub struct ParseError {
    /// The last observed token position.
    pub pos: TokenPos,
}

/// Statements recognized by the grammar that never name symbols.
fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "BEGIN"
            | "END"
            | "break"
            | "case"
            | "continue"
            | "default"
            | "delete"
            | "do"
            | "else"
            | "exit"
            | "for"
            | "func"
            | "function"
            | "getline"
            | "if"
            | "in"
            | "next"
            | "nextfile"
            | "print"
            | "printf"
            | "return"
            | "switch"
            | "while"
    )
}

/// Keywords that may lawfully end a statement.
fn keyword_may_end_statement(name: &str) -> bool {
    matches!(
        name,
        "break" | "continue" | "exit" | "getline" | "next" | "nextfile" | "print" | "return"
    )
}

/// An open grouping construct.
enum Group {
    /// A call's argument list.
    Call(CallFrame),
    /// A plain parenthesized expression.
    Paren,
    /// A subscript.
    Bracket,
}

/// Bookkeeping for an open call's argument list.
struct CallFrame {
    /// The zero-based index of the current argument slot.
    slot: i32,
    /// Whether the call supplies at least one argument.
    saw_argument: bool,
}

/// Bookkeeping for the function whose definition is being parsed.
struct FunctionCtx {
    /// The function name.
    name: String,
    /// The declared parameter names.
    params: Vec<String>,
    /// The brace depth of the function body.
    body_depth: u32,
    /// Whether the body's opening brace has been seen.
    entered: bool,
}

/// Statement state used for the missing-semicolon style warning.
#[derive(Default)]
struct Statement {
    /// Whether the current statement has any content.
    content: bool,
    /// Whether the last significant token may end a statement.
    endable: bool,
    /// Whether the statement began with a control keyword.
    ///
    /// A control statement's closing parenthesis expects a body, so it never
    /// warrants a missing-semicolon warning.
    control: bool,
    /// The position just past the last significant token.
    end: TokenPos,
}

/// The parser state for a single parse call.
struct Parser<'a> {
    /// The source text.
    source: &'a str,
    /// The token stream.
    tokens: Vec<Lexeme>,
    /// The index of the current token.
    index: usize,
    /// The line index for position conversion.
    lines: LineIndex,
    /// The parse options.
    options: &'a ParseOptions,
    /// The event sink.
    sink: &'a mut dyn EventSink,
    /// The current brace depth.
    brace_depth: u32,
    /// The stack of open grouping constructs.
    groups: Vec<Group>,
    /// The function definition currently in effect.
    function: Option<FunctionCtx>,
    /// The doc comment block preceding the next definition.
    pending_doc: Option<String>,
    /// The leading doc block of the file.
    header_doc: Option<String>,
    /// Whether the previous line ended in a doc comment.
    doc_continues: bool,
    /// Whether any significant token has been seen.
    seen_code: bool,
    /// The kind of the previous significant token, if the statement is open.
    prev: Option<Token>,
    /// Whether the previous significant token was a keyword.
    prev_keyword: bool,
    /// The current statement state.
    stmt: Statement,
    /// The last token position observed.
    last_pos: TokenPos,
}

/// Parses a source string, driving the given sink with events.
pub fn parse(
    source: &str,
    options: &ParseOptions,
    sink: &mut dyn EventSink,
) -> Result<(), ParseError> {
    let mut parser = Parser {
        source,
        tokens: tokenize(source),
        index: 0,
        lines: LineIndex::new(source),
        options,
        sink,
        brace_depth: 0,
        groups: Vec::new(),
        function: None,
        pending_doc: None,
        header_doc: None,
        doc_continues: false,
        seen_code: false,
        prev: None,
        prev_keyword: false,
        stmt: Statement::default(),
        last_pos: TokenPos::new(1, 1),
    };

    parser.run()
}

impl<'a> Parser<'a> {
    /// Runs the main token loop.
    fn run(&mut self) -> Result<(), ParseError> {
        while self.index < self.tokens.len() {
            let lex = self.tokens[self.index];
            match lex.token {
                Token::Whitespace | Token::LineContinuation | Token::Comment => {
                    self.index += 1;
                }
                Token::DocComment => {
                    let line = self.slice(lex).to_string();
                    match &mut self.pending_doc {
                        Some(doc) => {
                            doc.push('\n');
                            doc.push_str(&line);
                        }
                        None => self.pending_doc = Some(line),
                    }
                    self.doc_continues = true;
                    self.index += 1;
                }
                Token::Newline => self.newline(),
                Token::Ident => self.identifier(),
                Token::Directive => self.directive(),
                Token::String | Token::Number => {
                    self.end_operand(lex);
                    self.advance(lex);
                }
                Token::Dollar => {
                    self.stmt.content = true;
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::LeftBrace => self.open_brace(lex),
                Token::RightBrace => self.close_brace(lex),
                Token::LeftParen => {
                    self.groups.push(Group::Paren);
                    self.stmt.content = true;
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::RightParen => self.close_paren(lex),
                Token::LeftBracket => {
                    self.groups.push(Group::Bracket);
                    self.stmt.content = true;
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::RightBracket => {
                    if matches!(self.groups.last(), Some(Group::Bracket)) {
                        self.groups.pop();
                    } else {
                        let pos = self.pos_at(lex.start);
                        self.sink
                            .message(Severity::Error, None, "unmatched `]`", pos, 1);
                    }
                    self.end_operand(lex);
                    self.advance(lex);
                }
                Token::Comma => {
                    let pos = self.pos_at(lex.end);
                    if let Some(Group::Call(frame)) = self.groups.last_mut() {
                        frame.slot += 1;
                        let slot = frame.slot;
                        self.sink.parameter(slot, true, pos);
                    }
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::Semicolon => {
                    self.stmt = Statement::default();
                    self.prev = None;
                    self.prev_keyword = false;
                    self.seen_code = true;
                    self.index += 1;
                }
                Token::Assign => {
                    self.stmt.content = true;
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::Slash => {
                    if self.operand_expected() {
                        self.regex_literal(lex);
                    } else {
                        self.stmt.endable = false;
                        self.advance(lex);
                    }
                }
                Token::Operator => {
                    let slice = self.slice(lex);
                    if self.options.mode == Mode::Awk && matches!(slice, "**" | "|&") {
                        let pos = self.pos_at(lex.start);
                        let message = format!("`{slice}` is a gawk extension");
                        self.sink.message(
                            Severity::Warning,
                            Some(WarningKind::Future),
                            &message,
                            pos,
                            (lex.end - lex.start) as u32,
                        );
                    }
                    if matches!(self.slice(lex), "++" | "--") {
                        self.end_operand(lex);
                    } else {
                        self.stmt.content = true;
                        self.stmt.endable = false;
                    }
                    self.advance(lex);
                }
                Token::Punct => {
                    self.stmt.content = true;
                    self.stmt.endable = false;
                    self.advance(lex);
                }
                Token::Unknown => {
                    let pos = self.pos_at(lex.start);
                    self.sink.message(
                        Severity::Error,
                        None,
                        "unexpected character",
                        pos,
                        (lex.end - lex.start) as u32,
                    );
                    self.advance(lex);
                }
            }

            if self.groups.len() > MAX_NESTING || self.brace_depth as usize > MAX_NESTING {
                return Err(ParseError { pos: self.last_pos });
            }
        }

        if self.brace_depth > 0 {
            self.sink.message(
                Severity::Error,
                None,
                "missing `}` at end of file",
                self.last_pos,
                1,
            );
        }

        if self
            .groups
            .iter()
            .any(|g| matches!(g, Group::Call(_) | Group::Paren))
        {
            self.sink.message(
                Severity::Error,
                None,
                "missing `)` at end of file",
                self.last_pos,
                1,
            );
        }

        Ok(())
    }

    /// Gets the source text of a lexeme.
    fn slice(&self, lex: Lexeme) -> &'a str {
        &self.source[lex.start..lex.end]
    }

    /// Converts a byte offset to a one-based token position.
    fn pos_at(&self, offset: usize) -> TokenPos {
        let line_col = self.lines.line_col((offset as u32).into());
        TokenPos::new(line_col.line + 1, line_col.col + 1)
    }

    /// Advances past a significant token, recording it as the previous token.
    fn advance(&mut self, lex: Lexeme) {
        self.last_pos = self.pos_at(lex.start);
        self.prev = Some(lex.token);
        self.prev_keyword = false;
        self.seen_code = true;
        self.clear_doc();
        self.index += 1;
    }

    /// Marks the statement as endable at the given lexeme.
    fn end_operand(&mut self, lex: Lexeme) {
        self.stmt.content = true;
        self.stmt.endable = true;
        self.stmt.end = self.pos_at(lex.end);
    }

    /// Discards any accumulated doc comment block.
    ///
    /// The first block discarded before any code is kept as the file header
    /// doc.
    fn clear_doc(&mut self) {
        if let Some(doc) = self.pending_doc.take()
            && self.header_doc.is_none()
            && !self.seen_code
        {
            self.header_doc = Some(doc);
        }
    }

    /// Takes the doc block for a definition at the current point.
    fn take_doc(&mut self, name: &str) -> Option<String> {
        self.pending_doc.take().or_else(|| {
            if self.options.base_name.as_deref() == Some(name) {
                self.header_doc.clone()
            } else {
                None
            }
        })
    }

    /// Handles a line break.
    fn newline(&mut self) {
        let lex = self.tokens[self.index];

        if !self.doc_continues {
            // A blank line detaches an accumulated doc block; stash the first
            // such block as the file header doc.
            let seen = self.seen_code;
            if let Some(doc) = self.pending_doc.take()
                && self.header_doc.is_none()
                && !seen
            {
                self.header_doc = Some(doc);
            }
        }
        self.doc_continues = false;

        if self.groups.is_empty() {
            if self.brace_depth > 0 && self.stmt.content && self.stmt.endable {
                let pos = self.stmt.end;
                self.sink.message(
                    Severity::Warning,
                    Some(WarningKind::Comma),
                    "missing `;` at end of statement",
                    pos,
                    1,
                );
            }
            self.stmt = Statement::default();
            self.prev = None;
            self.prev_keyword = false;
        }

        self.last_pos = self.pos_at(lex.start);
        self.index += 1;
    }

    /// Whether the next token sits in operand position.
    ///
    /// Used to disambiguate `/` between division and a regex literal.
    fn operand_expected(&self) -> bool {
        match self.prev {
            None => true,
            Some(token) => match token {
                Token::LeftBrace
                | Token::RightBrace
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Comma
                | Token::Assign
                | Token::Operator
                | Token::Punct
                | Token::Slash => true,
                Token::Ident => self.prev_keyword,
                _ => false,
            },
        }
    }

    /// Skips a regex literal starting at the given slash.
    fn regex_literal(&mut self, lex: Lexeme) {
        let bytes = self.source.as_bytes();
        let mut i = lex.end;
        let mut in_class = false;
        let mut closed = None;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    closed = Some(i);
                    break;
                }
                b'\n' => break,
                _ => {}
            }
            i += 1;
        }

        let end = match closed {
            Some(close) => close + 1,
            None => {
                let pos = self.pos_at(lex.start);
                self.sink
                    .message(Severity::Error, None, "unterminated regex literal", pos, 1);
                i
            }
        };

        while self.index < self.tokens.len() && self.tokens[self.index].start < end {
            self.index += 1;
        }

        self.last_pos = self.pos_at(lex.start);
        self.prev = Some(Token::String);
        self.prev_keyword = false;
        self.seen_code = true;
        self.clear_doc();
        self.stmt.content = true;
        self.stmt.endable = true;
        self.stmt.end = self.pos_at(end);
    }

    /// Finds the next significant token at or after `from`, skipping only
    /// horizontal trivia.
    fn next_significant(&self, from: usize) -> Option<(usize, Token)> {
        let mut i = from;
        while i < self.tokens.len() {
            match self.tokens[i].token {
                Token::Whitespace | Token::LineContinuation | Token::Comment => i += 1,
                token => return Some((i, token)),
            }
        }
        None
    }

    /// Finds the next significant token at or after `from`, skipping line
    /// breaks as well.
    fn next_significant_multiline(&self, from: usize) -> Option<(usize, Token)> {
        let mut i = from;
        while i < self.tokens.len() {
            match self.tokens[i].token {
                Token::Whitespace
                | Token::LineContinuation
                | Token::Comment
                | Token::DocComment
                | Token::Newline => i += 1,
                token => return Some((i, token)),
            }
        }
        None
    }

    /// Whether the tokens at `from` form `[subscript]? =`, making the
    /// preceding identifier an assignment target.
    fn is_assignment_target(&self, from: usize) -> bool {
        let mut i = from;
        if let Some((at, Token::LeftBracket)) = self.next_significant(i) {
            let mut depth = 0usize;
            i = at;
            while i < self.tokens.len() {
                match self.tokens[i].token {
                    Token::LeftBracket => depth += 1,
                    Token::RightBracket => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            i += 1;
        }

        matches!(self.next_significant(i), Some((_, Token::Assign)))
    }

    /// Handles an identifier: keyword, function definition, call, or variable.
    fn identifier(&mut self) {
        let source = self.source;
        let lex = self.tokens[self.index];
        let name = &source[lex.start..lex.end];
        let pos = self.pos_at(lex.start);
        self.last_pos = pos;

        if (name == "function" || name == "func")
            && self.brace_depth == 0
            && self.groups.is_empty()
        {
            self.index += 1;
            self.seen_code = true;
            self.function_definition(pos);
            return;
        }

        if is_keyword(name) {
            if self.options.mode == Mode::Awk
                && matches!(name, "switch" | "case" | "default" | "nextfile")
            {
                let message = format!("`{name}` is a gawk extension");
                self.sink.message(
                    Severity::Warning,
                    Some(WarningKind::Future),
                    &message,
                    pos,
                    (lex.end - lex.start) as u32,
                );
            }

            if !self.stmt.content && matches!(name, "do" | "else" | "for" | "if" | "switch" | "while")
            {
                self.stmt.control = true;
            }
            self.stmt.content = true;
            self.stmt.endable = keyword_may_end_statement(name);
            self.stmt.end = self.pos_at(lex.end);
            self.prev = Some(Token::Ident);
            self.prev_keyword = true;
            self.seen_code = true;
            self.clear_doc();
            self.index += 1;
            return;
        }

        // A following `(` makes this a call.
        if let Some((paren_at, Token::LeftParen)) = self.next_significant(self.index + 1) {
            self.sink.usage(SymbolKind::Function, name, pos, false);
            self.sink.function_call(CallEvent::Start { pos });

            let paren = self.tokens[paren_at];
            self.index = paren_at + 1;
            let empty = matches!(
                self.next_significant_multiline(self.index),
                Some((_, Token::RightParen))
            );
            self.groups.push(Group::Call(CallFrame {
                slot: 0,
                saw_argument: !empty,
            }));
            let slot_pos = self.pos_at(paren.end);
            self.sink.parameter(0, true, slot_pos);

            self.stmt.content = true;
            self.stmt.endable = false;
            self.prev = Some(Token::LeftParen);
            self.prev_keyword = false;
            self.seen_code = true;
            self.clear_doc();
            return;
        }

        // Otherwise this is a variable reference; an assignment target at
        // file scope is a definition site.
        let kind = match &self.function {
            Some(f) if f.entered && f.params.iter().any(|p| p == name) => SymbolKind::Parameter,
            _ => SymbolKind::Global,
        };

        if kind == SymbolKind::Global && self.is_assignment_target(self.index + 1) {
            let doc = self.take_doc(name);
            self.sink
                .define(SymbolKind::Global, None, name, pos, doc.as_deref());
            self.sink.usage(SymbolKind::Global, name, pos, true);
        } else {
            self.sink.usage(kind, name, pos, false);
        }

        self.end_operand(lex);
        self.advance(lex);
    }

    /// Parses a function definition after the `function` keyword.
    fn function_definition(&mut self, kw_pos: TokenPos) {
        let source = self.source;

        let name_lex = match self.next_significant(self.index) {
            Some((at, Token::Ident)) => {
                self.index = at + 1;
                self.tokens[at]
            }
            _ => {
                self.sink.message(
                    Severity::Error,
                    None,
                    "expected function name after `function`",
                    kw_pos,
                    8,
                );
                return;
            }
        };

        let name = &source[name_lex.start..name_lex.end];
        let name_pos = self.pos_at(name_lex.start);
        let doc = self.take_doc(name);

        self.sink
            .define(SymbolKind::Function, None, name, name_pos, doc.as_deref());
        self.sink.usage(SymbolKind::Function, name, name_pos, true);

        match self.next_significant(self.index) {
            Some((at, Token::LeftParen)) => self.index = at + 1,
            _ => {
                self.sink.message(
                    Severity::Error,
                    None,
                    "expected `(` after function name",
                    name_pos,
                    (name_lex.end - name_lex.start) as u32,
                );
                return;
            }
        }

        // The parameter list. An extra-whitespace gap conventionally starts
        // the optional (local) parameters.
        let mut params: Vec<String> = Vec::new();
        let mut first_optional = None;
        let mut gap = false;
        loop {
            let Some(lex) = self.tokens.get(self.index).copied() else {
                self.sink.message(
                    Severity::Error,
                    None,
                    "unterminated parameter list",
                    self.last_pos,
                    1,
                );
                break;
            };

            match lex.token {
                Token::Whitespace => {
                    let slice = &source[lex.start..lex.end];
                    gap |= slice.len() >= 2 || slice.contains('\t');
                    self.index += 1;
                }
                Token::LineContinuation | Token::Newline | Token::Comment | Token::DocComment => {
                    gap = true;
                    self.index += 1;
                }
                Token::Ident => {
                    let param = &source[lex.start..lex.end];
                    let param_pos = self.pos_at(lex.start);
                    if gap && !params.is_empty() && first_optional.is_none() {
                        first_optional = Some(params.len());
                    }
                    self.sink
                        .define(SymbolKind::Parameter, Some(name), param, param_pos, None);
                    self.sink
                        .usage(SymbolKind::Parameter, param, param_pos, true);
                    params.push(param.to_string());
                    gap = false;
                    self.last_pos = param_pos;
                    self.index += 1;
                }
                Token::Comma => {
                    gap = false;
                    self.index += 1;
                }
                Token::RightParen => {
                    self.index += 1;
                    break;
                }
                _ => {
                    let pos = self.pos_at(lex.start);
                    self.sink.message(
                        Severity::Error,
                        None,
                        "unexpected token in parameter list",
                        pos,
                        (lex.end - lex.start) as u32,
                    );
                    self.index += 1;
                }
            }
        }

        self.sink.arity(name, &params, first_optional);

        match self.next_significant_multiline(self.index) {
            Some((at, Token::LeftBrace)) => {
                // The brace itself is handled by the main loop.
                self.index = at;
                self.function = Some(FunctionCtx {
                    name: name.to_string(),
                    params,
                    body_depth: self.brace_depth + 1,
                    entered: false,
                });
            }
            _ => {
                self.sink.message(
                    Severity::Error,
                    None,
                    "expected `{` to begin function body",
                    name_pos,
                    (name_lex.end - name_lex.start) as u32,
                );
            }
        }
    }

    /// Handles an `@` directive.
    fn directive(&mut self) {
        let source = self.source;
        let lex = self.tokens[self.index];
        let name = &source[lex.start..lex.end];
        let pos = self.pos_at(lex.start);
        self.last_pos = pos;
        self.seen_code = true;
        self.clear_doc();
        self.index += 1;

        match name {
            "@include" => match self.next_significant(self.index) {
                Some((at, Token::String)) => {
                    let string = self.tokens[at];
                    let path = &source[string.start + 1..string.end - 1];
                    let relative = path.starts_with("./")
                        || path.starts_with("../")
                        || std::path::Path::new(path).is_absolute();
                    let len = (string.end - lex.start) as u32;
                    self.sink.include(path, relative, pos, len);
                    self.index = at + 1;
                }
                _ => {
                    self.sink.message(
                        Severity::Error,
                        None,
                        "expected string after `@include`",
                        pos,
                        (lex.end - lex.start) as u32,
                    );
                }
            },
            "@namespace" | "@load" => {
                if self.options.mode == Mode::Awk {
                    let message = format!("`{name}` is a gawk extension");
                    self.sink.message(
                        Severity::Warning,
                        Some(WarningKind::Future),
                        &message,
                        pos,
                        (lex.end - lex.start) as u32,
                    );
                }
                if let Some((at, Token::String | Token::Ident)) = self.next_significant(self.index)
                {
                    self.index = at + 1;
                }
            }
            _ => {
                let message = format!("unrecognized directive `{name}`");
                self.sink.message(
                    Severity::Warning,
                    None,
                    &message,
                    pos,
                    (lex.end - lex.start) as u32,
                );
            }
        }

        self.stmt = Statement::default();
        self.prev = None;
        self.prev_keyword = false;
    }

    /// Handles `{`.
    fn open_brace(&mut self, lex: Lexeme) {
        self.brace_depth += 1;
        if let Some(f) = &mut self.function
            && !f.entered
            && self.brace_depth == f.body_depth
        {
            f.entered = true;
            let pos = self.pos_at(lex.start);
            self.sink.function_block(true, pos);
        }

        self.stmt = Statement::default();
        self.prev = Some(Token::LeftBrace);
        self.prev_keyword = false;
        self.seen_code = true;
        self.clear_doc();
        self.last_pos = self.pos_at(lex.start);
        self.index += 1;
    }

    /// Handles `}`.
    fn close_brace(&mut self, lex: Lexeme) {
        let pos = self.pos_at(lex.start);
        if self.brace_depth == 0 {
            self.sink.message(Severity::Error, None, "unmatched `}`", pos, 1);
        } else {
            self.brace_depth -= 1;
            if let Some(f) = &self.function
                && f.entered
                && self.brace_depth < f.body_depth
            {
                let end = self.pos_at(lex.end);
                self.sink.function_block(false, end);
                self.function = None;
            }
        }

        self.stmt = Statement::default();
        self.prev = Some(Token::RightBrace);
        self.prev_keyword = false;
        self.seen_code = true;
        self.clear_doc();
        self.last_pos = pos;
        self.index += 1;
    }

    /// Handles `)`.
    fn close_paren(&mut self, lex: Lexeme) {
        let close = self.pos_at(lex.start);
        let after = self.pos_at(lex.end);
        match self.groups.pop() {
            Some(Group::Call(frame)) => {
                let arguments = if frame.saw_argument {
                    frame.slot as usize + 1
                } else {
                    0
                };
                self.sink.parameter(frame.slot, false, close);
                self.sink
                    .function_call(CallEvent::End { pos: after, arguments });
            }
            Some(_) => {}
            None => {
                self.sink.message(Severity::Error, None, "unmatched `)`", close, 1);
            }
        }

        self.end_operand(lex);
        if self.stmt.control {
            self.stmt.endable = false;
        }
        self.advance(lex);
    }
}
