//! Handlers for hover requests.
//!
//! This module implements the LSP `textDocument/hover` functionality for AWK
//! files.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_hover)

use anyhow::Result;
use awk_grammar::SymbolKind;
use indexmap::IndexSet;
use lsp_types::Hover;
use lsp_types::HoverContents;
use lsp_types::MarkupContent;
use lsp_types::MarkupKind;
use url::Url;

use crate::Config;
use crate::SourcePosition;
use crate::SourceRange;
use crate::builtins;
use crate::graph::DocumentGraph;
use crate::handlers::common;
use crate::symbols::align_documentation;

/// Handles a hover request.
///
/// A usage naming a visible built-in reports the built-in's signature and
/// description. Otherwise the hover aggregates, across all documents, every
/// definition with a matching kind and name visible from the cursor's scope.
pub(crate) fn hover(
    graph: &DocumentGraph,
    config: &Config,
    uri: &Url,
    position: SourcePosition,
) -> Result<Option<Hover>> {
    let Some((_, document)) = common::document(graph, uri) else {
        return Ok(None);
    };
    let Some(usage) = document.find_usage_at(position) else {
        return Ok(None);
    };
    let range = usage.range();

    if let Some(builtin) = builtins::lookup(&usage.name) {
        let visible = builtin.available(document.mode(config))
            || config.stylistic_warnings().compatibility;
        if visible {
            let value = format!(
                "```awk\n{signature}\n```\n\n{description}",
                signature = builtin.signature(),
                description = builtin.description
            );
            return Ok(Some(markup(value, range)));
        }
    }

    let enclosing = document.enclosing_function(position).cloned();
    let mut sections: IndexSet<String> = IndexSet::new();
    for index in graph.documents() {
        let doc = graph.get(index);
        for definition in doc.definitions_of(usage.kind, &usage.name) {
            if !definition.in_scope(enclosing.as_deref()) {
                continue;
            }

            let label = match definition.kind {
                SymbolKind::Function => {
                    let parameters = doc
                        .signature_of(&definition.name)
                        .map(|s| s.parameters.join(", "))
                        .unwrap_or_default();
                    format!("function {name}({parameters})", name = definition.name)
                }
                kind => kind.to_string(),
            };

            sections.insert(match &definition.documentation {
                Some(documentation) => {
                    format!("{label}\n\n{}", align_documentation(documentation))
                }
                None => label,
            });
        }
    }

    if sections.is_empty() {
        // Kind-specific placeholders for symbols with no visible definition.
        return Ok(match usage.kind {
            SymbolKind::Function => Some(markup("function".to_string(), range)),
            SymbolKind::Global => Some(markup("global variable".to_string(), range)),
            _ => None,
        });
    }

    let value = sections.into_iter().collect::<Vec<_>>().join("\n\n---\n\n");
    Ok(Some(markup(value, range)))
}

/// Builds a markdown hover over the given range.
fn markup(value: String, range: SourceRange) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range.into()),
    }
}
