//! Analysis of AWK documents.
//!
//! An analyzer can be used to implement the [Language Server Protocol (LSP)](https://microsoft.github.io/language-server-protocol/).
//!
//! Documents are linked by `@include` directives into a graph; a document
//! persists while the editor or any includer references it. Editor events
//! are processed in arrival order on a queue that never parses while a
//! filesystem read is outstanding, and diagnostics are published once per
//! drained batch after cross-document analysis.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

mod adapter;
mod analyzer;
pub mod builtins;
mod config;
mod diagnostics;
mod document;
mod graph;
mod handlers;
mod queue;
mod semantic;
pub mod symbols;

pub use analyzer::*;
pub use awk_grammar::Mode;
pub use awk_grammar::Severity;
pub use awk_grammar::SymbolKind;
pub use config::*;
pub use diagnostics::*;
