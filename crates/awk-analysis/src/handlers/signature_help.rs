//! Handlers for signature help requests.
//!
//! This module implements the LSP `textDocument/signatureHelp` functionality
//! for AWK files, resolving the argument-position marker at the cursor to a
//! user-defined function or a built-in.
//!
//! See: [LSP Specification](https://microsoft.github.io/language-server-protocol/specifications/lsp/3.17/specification/#textDocument_signatureHelp)

use anyhow::Result;
use lsp_types::Documentation;
use lsp_types::ParameterInformation;
use lsp_types::ParameterLabel;
use lsp_types::SignatureHelp;
use lsp_types::SignatureInformation;
use url::Url;

use crate::Config;
use crate::SourcePosition;
use crate::builtins;
use crate::builtins::BuiltinKind;
use crate::graph::DocumentGraph;
use crate::handlers::common;

/// Handles a signature help request.
///
/// The argument-position marker at or immediately before the cursor names
/// the active call and argument; the sentinel marker at a call's closing
/// parenthesis rejects cursors past the call.
pub(crate) fn signature_help(
    graph: &DocumentGraph,
    config: &Config,
    uri: &Url,
    position: SourcePosition,
) -> Result<Option<SignatureHelp>> {
    let Some((index, document)) = common::document(graph, uri) else {
        return Ok(None);
    };
    let Some(marker) = document.parameter_marker_at(position) else {
        return Ok(None);
    };

    // A sentinel strictly before the cursor means the cursor is past the
    // call's closing parenthesis.
    if marker.index < 0 && marker.position < position {
        return Ok(None);
    }

    let name = marker.function.clone();
    let active = marker.index.max(0) as u32;

    // Prefer a user definition, in the current document first.
    let user = document.signature_of(&name).or_else(|| {
        graph
            .documents()
            .filter(|other| *other != index)
            .find_map(|other| graph.get(other).signature_of(&name))
    });

    let signature = if let Some(signature) = user {
        SignatureInformation {
            label: builtins::format_signature(
                &name,
                signature.parameters.iter().map(String::as_str),
                signature.first_optional,
            ),
            documentation: None,
            parameters: Some(
                signature
                    .parameters
                    .iter()
                    .map(|parameter| ParameterInformation {
                        label: ParameterLabel::Simple(parameter.clone()),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: Some(active),
        }
    } else if let Some(builtin) = builtins::lookup(&name).filter(|b| {
        b.kind == BuiltinKind::Function
            && (b.available(document.mode(config)) || config.stylistic_warnings().compatibility)
    }) {
        SignatureInformation {
            label: builtin.signature(),
            documentation: Some(Documentation::String(builtin.description.to_string())),
            parameters: Some(
                builtin
                    .parameters
                    .iter()
                    .map(|parameter| ParameterInformation {
                        label: ParameterLabel::Simple(parameter.to_string()),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: Some(active),
        }
    } else {
        SignatureInformation {
            label: format!("{name}(…)"),
            documentation: Some(Documentation::String("Undeclared function".to_string())),
            parameters: None,
            active_parameter: Some(active),
        }
    };

    Ok(Some(SignatureHelp {
        signatures: vec![signature],
        active_signature: Some(0),
        active_parameter: Some(active),
    }))
}
