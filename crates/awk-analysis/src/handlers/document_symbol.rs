//! Handlers for document symbols.
//!
//! This module implements the LSP `textDocument/documentSymbol` functionality
//! for AWK files, reporting the functions a document defines.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_documentSymbol)

use anyhow::Result;
use awk_grammar::SymbolKind;
use lsp_types::SymbolInformation;
use url::Url;

use crate::graph::DocumentGraph;
use crate::handlers::common;

/// Handles a document symbol request.
pub(crate) fn document_symbol(graph: &DocumentGraph, uri: &Url) -> Result<Vec<SymbolInformation>> {
    let Some((_, document)) = common::document(graph, uri) else {
        return Ok(Vec::new());
    };

    let mut symbols = Vec::new();
    for (id, definitions) in document.defined() {
        if id.kind != SymbolKind::Function {
            continue;
        }

        for definition in definitions {
            symbols.push(common::function_symbol(document.uri(), definition));
        }
    }

    Ok(symbols)
}
