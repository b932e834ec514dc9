//! Handlers for workspace symbols.
//!
//! This module implements the LSP `workspace/symbol` functionality for AWK
//! files, searching the functions of every document in the graph.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#workspace_symbol)

use anyhow::Result;
use awk_grammar::SymbolKind;
use lsp_types::SymbolInformation;

use crate::graph::DocumentGraph;
use crate::handlers::common;

/// Handles a workspace symbol request.
///
/// Matches every function whose name starts with the query string.
pub(crate) fn workspace_symbol(
    graph: &DocumentGraph,
    query: &str,
) -> Result<Vec<SymbolInformation>> {
    let mut symbols = Vec::new();
    for index in graph.documents() {
        let document = graph.get(index);
        for (id, definitions) in document.defined() {
            if id.kind != SymbolKind::Function || !id.name.starts_with(query) {
                continue;
            }

            for definition in definitions {
                symbols.push(common::function_symbol(document.uri(), definition));
            }
        }
    }

    Ok(symbols)
}
