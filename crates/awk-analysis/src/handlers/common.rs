//! Utilities shared by the query handlers.

use std::sync::Arc;

use lsp_types::Location;
use lsp_types::SymbolInformation;
use petgraph::graph::NodeIndex;
use url::Url;

use crate::SourceRange;
use crate::document::Document;
use crate::graph::DocumentGraph;
use crate::symbols::SymbolDefinition;

/// Looks up a document by URI.
///
/// Returns `None` for URIs not present in the graph; handlers translate that
/// into an empty result.
pub(crate) fn document<'a>(
    graph: &'a DocumentGraph,
    uri: &Url,
) -> Option<(NodeIndex, &'a Document)> {
    let index = graph.get_index(uri)?;
    Some((index, graph.get(index)))
}

/// Converts a source range in a document to an LSP location.
pub(crate) fn location(uri: &Arc<Url>, range: SourceRange) -> Location {
    Location::new((**uri).clone(), range.into())
}

/// Builds the symbol information entry for a function definition.
pub(crate) fn function_symbol(uri: &Arc<Url>, definition: &SymbolDefinition) -> SymbolInformation {
    #[allow(deprecated)]
    SymbolInformation {
        name: definition.name.to_string(),
        kind: lsp_types::SymbolKind::FUNCTION,
        tags: None,
        deprecated: None,
        location: location(uri, definition.range()),
        container_name: None,
    }
}
