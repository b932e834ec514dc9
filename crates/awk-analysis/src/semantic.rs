//! Cross-document semantic analysis.
//!
//! The only analysis performed after the per-document parse is function-call
//! arity checking: every recorded call is resolved to a user definition in
//! any reachable document (the calling document preferred) or to a built-in,
//! and its argument count is checked against the callee's recorded arity and
//! optional-parameter threshold.

use indexmap::IndexSet;
use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::Config;
use crate::Diagnostic;
use crate::builtins;
use crate::builtins::BuiltinKind;
use crate::graph::DocumentGraph;

/// Runs semantic analysis over the given documents.
///
/// Each target's analysis diagnostics are replaced wholesale; a target with
/// no findings ends up with none.
pub(crate) fn analyze(graph: &mut DocumentGraph, targets: &IndexSet<NodeIndex>, config: &Config) {
    for index in targets {
        let diagnostics = if config.stylistic_warnings().check_function_calls {
            check_calls(graph, *index, config)
        } else {
            Vec::new()
        };

        debug!(
            "analysis of `{uri}` produced {count} diagnostic(s)",
            uri = graph.get(*index).uri(),
            count = diagnostics.len()
        );
        graph.get_mut(*index).set_analysis_diagnostics(diagnostics);
    }
}

/// Checks the arity of every call recorded by a document.
fn check_calls(graph: &DocumentGraph, index: NodeIndex, config: &Config) -> Vec<Diagnostic> {
    let document = graph.get(index);
    let mode = document.mode(config);

    let mut diagnostics = Vec::new();
    for call in document.function_calls() {
        // Prefer a definition in the calling document, then any reachable
        // document, then a built-in.
        let signature = document.signature_of(&call.name).or_else(|| {
            graph
                .documents()
                .filter(|other| *other != index)
                .find_map(|other| graph.get(other).signature_of(&call.name))
        });

        let (least, most) = match signature {
            Some(signature) => {
                let count = signature.parameters.len();
                (signature.first_optional.unwrap_or(count), Some(count))
            }
            None => {
                let Some(builtin) = builtins::lookup(&call.name) else {
                    continue;
                };
                if builtin.kind != BuiltinKind::Function || !builtin.available(mode) {
                    continue;
                }

                let count = builtin.parameters.len();
                (
                    builtin.first_optional.unwrap_or(count),
                    (!builtin.variadic).then_some(count),
                )
            }
        };

        if call.arguments < least {
            diagnostics.push(Diagnostic::warning(
                format!(
                    "too few arguments to `{name}`: expected at least {least}, found {found}",
                    name = call.name,
                    found = call.arguments
                ),
                call.range,
            ));
        } else if let Some(most) = most
            && call.arguments > most
        {
            diagnostics.push(Diagnostic::warning(
                format!(
                    "too many arguments to `{name}`: expected at most {most}, found {found}",
                    name = call.name,
                    found = call.arguments
                ),
                call.range,
            ));
        }
    }

    diagnostics
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;
    use crate::adapter;
    use crate::config::StylisticWarnings;

    /// Adds a parsed document to a graph.
    fn add(graph: &mut DocumentGraph, name: &str, source: &str, config: &Config) -> NodeIndex {
        let uri = Arc::new(Url::parse(&format!("file:///{name}")).expect("URI should parse"));
        let index = graph.add_document(uri);
        adapter::validate_document(graph.get_mut(index), source.into(), config);
        index
    }

    /// Collects the analysis diagnostic messages for a node.
    fn messages(graph: &DocumentGraph, index: NodeIndex) -> Vec<String> {
        graph
            .get(index)
            .diagnostics_capped(100)
            .iter()
            .map(|d| d.message().to_string())
            .collect()
    }

    #[test]
    fn it_checks_user_function_arity_across_documents() {
        let config = Config::default();
        let mut graph = DocumentGraph::default();
        let lib = add(
            &mut graph,
            "lib.awk",
            "function f(x, y) { return x + y }\n",
            &config,
        );
        let main = add(&mut graph, "main.awk", "BEGIN { print f(1) }\n", &config);
        graph.add_include(main, lib, crate::SourceRange::default());

        analyze(&mut graph, &IndexSet::from([main, lib]), &config);
        assert_eq!(
            messages(&graph, main),
            vec!["too few arguments to `f`: expected at least 2, found 1"]
        );
        assert!(messages(&graph, lib).is_empty());
    }

    #[test]
    fn it_allows_omitting_optional_parameters() {
        let config = Config::default();
        let mut graph = DocumentGraph::default();
        let index = add(
            &mut graph,
            "lib.awk",
            "function walk(node,    seen) { return node }\nBEGIN { walk(1) }\n",
            &config,
        );

        analyze(&mut graph, &IndexSet::from([index]), &config);
        assert!(messages(&graph, index).is_empty());
    }

    #[test]
    fn it_checks_builtin_arity() {
        let config = Config::default();
        let mut graph = DocumentGraph::default();
        let index = add(
            &mut graph,
            "main.awk",
            "BEGIN { print substr(\"abc\") }\n",
            &config,
        );

        analyze(&mut graph, &IndexSet::from([index]), &config);
        assert_eq!(
            messages(&graph, index),
            vec!["too few arguments to `substr`: expected at least 2, found 1"]
        );
    }

    #[test]
    fn it_skips_variadic_builtins() {
        let config = Config::default();
        let mut graph = DocumentGraph::default();
        let index = add(
            &mut graph,
            "main.awk",
            "BEGIN { print sprintf(\"%d-%d-%d\", 1, 2, 3) }\n",
            &config,
        );

        analyze(&mut graph, &IndexSet::from([index]), &config);
        assert!(messages(&graph, index).is_empty());
    }

    #[test]
    fn it_does_nothing_when_disabled() {
        let config = Config::default().with_stylistic_warnings(StylisticWarnings {
            check_function_calls: false,
            ..Default::default()
        });
        let mut graph = DocumentGraph::default();
        let index = add(&mut graph, "main.awk", "BEGIN { print f(1) }\n", &config);

        analyze(&mut graph, &IndexSet::from([index]), &config);
        assert!(messages(&graph, index).is_empty());
    }

    #[test]
    fn it_ignores_gawk_builtins_in_strict_mode() {
        let config = Config::default().with_mode(awk_grammar::Mode::Awk);
        let mut graph = DocumentGraph::default();
        let index = add(&mut graph, "main.awk", "BEGIN { x = systime(1, 2) }\n", &config);

        analyze(&mut graph, &IndexSet::from([index]), &config);
        assert!(messages(&graph, index).is_empty());
    }
}
