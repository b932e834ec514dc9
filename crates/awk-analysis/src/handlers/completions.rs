//! Handlers for completion requests.
//!
//! This module implements the LSP `textDocument/completion` functionality for
//! AWK files, offering the union of every built-in function and every user
//! symbol reachable from the cursor's scope.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_completion)

use anyhow::Result;
use awk_grammar::SymbolKind;
use indexmap::IndexSet;
use lsp_types::CompletionItem;
use lsp_types::CompletionItemKind;
use lsp_types::Documentation;
use lsp_types::MarkupContent;
use lsp_types::MarkupKind;
use url::Url;

use crate::SourcePosition;
use crate::builtins;
use crate::graph::DocumentGraph;
use crate::handlers::common;
use crate::symbols::align_documentation;

/// Handles a completion request.
///
/// User symbols produce one item per distinct non-empty doc-comment variant,
/// or a single undocumented item when none exists.
pub(crate) fn completions(
    graph: &DocumentGraph,
    uri: &Url,
    position: SourcePosition,
) -> Result<Vec<CompletionItem>> {
    let Some((index, document)) = common::document(graph, uri) else {
        return Ok(Vec::new());
    };
    let enclosing = document.enclosing_function(position).cloned();

    let mut items = Vec::new();
    for builtin in builtins::functions() {
        items.push(CompletionItem {
            label: builtin.name.to_string(),
            kind: Some(CompletionItemKind::FUNCTION),
            detail: Some(builtin.signature()),
            ..Default::default()
        });
    }

    let mut seen: IndexSet<(String, Option<String>)> = IndexSet::new();
    for doc_index in graph.documents() {
        let doc = graph.get(doc_index);
        for (id, definitions) in doc.defined() {
            let reachable = match id.kind {
                // File-scope symbols are reachable from anywhere.
                SymbolKind::Global | SymbolKind::Function => true,
                // Function-scoped symbols are reachable only within their
                // function in the current document.
                SymbolKind::Parameter | SymbolKind::Local => {
                    doc_index == index
                        && definitions
                            .iter()
                            .any(|d| d.scope.is_some() && d.in_scope(enclosing.as_deref()))
                }
            };
            if !reachable {
                continue;
            }

            let kind = match id.kind {
                SymbolKind::Function => CompletionItemKind::FUNCTION,
                _ => CompletionItemKind::VARIABLE,
            };

            let documented: IndexSet<String> = definitions
                .iter()
                .filter_map(|d| d.documentation.as_deref())
                .map(align_documentation)
                .filter(|d| !d.is_empty())
                .collect();

            if documented.is_empty() {
                if seen.insert((id.name.to_string(), None)) {
                    items.push(CompletionItem {
                        label: id.name.to_string(),
                        kind: Some(kind),
                        ..Default::default()
                    });
                }
            } else {
                for documentation in documented {
                    if seen.insert((id.name.to_string(), Some(documentation.clone()))) {
                        items.push(CompletionItem {
                            label: id.name.to_string(),
                            kind: Some(kind),
                            documentation: Some(Documentation::MarkupContent(MarkupContent {
                                kind: MarkupKind::Markdown,
                                value: documentation,
                            })),
                            ..Default::default()
                        });
                    }
                }
            }
        }
    }

    Ok(items)
}

/// Resolves additional detail for a completion item.
///
/// Built-in descriptions are filled lazily here rather than on every
/// completion response.
pub(crate) fn resolve_completion(mut item: CompletionItem) -> CompletionItem {
    if item.documentation.is_none()
        && let Some(builtin) = builtins::lookup(&item.label)
    {
        item.documentation = Some(Documentation::String(builtin.description.to_string()));
    }

    item
}
