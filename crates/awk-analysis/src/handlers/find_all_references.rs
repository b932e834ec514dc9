//! Handlers for `find all references` requests.
//!
//! This module implements the LSP `textDocument/references` functionality for
//! AWK files.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_references)

use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexSet;
use lsp_types::Location;
use url::Url;

use crate::SourcePosition;
use crate::SourceRange;
use crate::graph::DocumentGraph;
use crate::handlers::common;

/// Finds every reference to the symbol at the given position.
///
/// Always includes every usage with a matching kind and name across all
/// documents; explicit definition sites are included when the caller
/// requested declarations.
pub(crate) fn find_all_references(
    graph: &DocumentGraph,
    uri: &Url,
    position: SourcePosition,
    include_declaration: bool,
) -> Result<Vec<Location>> {
    let Some((_, document)) = common::document(graph, uri) else {
        return Ok(Vec::new());
    };
    let Some(usage) = document.find_usage_at(position).cloned() else {
        return Ok(Vec::new());
    };

    let mut seen: IndexSet<(Arc<Url>, SourceRange)> = IndexSet::new();
    let mut locations = Vec::new();
    for index in graph.documents() {
        let doc = graph.get(index);

        if include_declaration {
            for definition in doc.definitions_of(usage.kind, &usage.name) {
                if definition.implicit {
                    continue;
                }

                if seen.insert((doc.uri().clone(), definition.range())) {
                    locations.push(common::location(doc.uri(), definition.range()));
                }
            }
        }

        for reference in doc.usages() {
            if reference.kind == usage.kind
                && reference.name == usage.name
                && seen.insert((doc.uri().clone(), reference.range()))
            {
                locations.push(common::location(doc.uri(), reference.range()));
            }
        }
    }

    Ok(locations)
}
