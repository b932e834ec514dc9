//! Handlers for `goto definition` requests.
//!
//! This module implements the LSP `textDocument/definition` functionality for
//! AWK files.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_definition)

use anyhow::Result;
use lsp_types::Location;
use url::Url;

use crate::SourcePosition;
use crate::graph::DocumentGraph;
use crate::handlers::common;

/// Finds the definition locations for the symbol at the given position.
///
/// Aggregates matching definitions across all documents, excluding implicit
/// ones: jumping to the first use of an undeclared global is unhelpful.
pub(crate) fn goto_definition(
    graph: &DocumentGraph,
    uri: &Url,
    position: SourcePosition,
) -> Result<Vec<Location>> {
    let Some((_, document)) = common::document(graph, uri) else {
        return Ok(Vec::new());
    };
    let Some(usage) = document.find_usage_at(position) else {
        return Ok(Vec::new());
    };
    let enclosing = document.enclosing_function(position).cloned();

    let mut locations = Vec::new();
    for index in graph.documents() {
        let doc = graph.get(index);
        for definition in doc.definitions_of(usage.kind, &usage.name) {
            if definition.implicit || !definition.in_scope(enclosing.as_deref()) {
                continue;
            }

            locations.push(common::location(doc.uri(), definition.range()));
        }
    }

    Ok(locations)
}
