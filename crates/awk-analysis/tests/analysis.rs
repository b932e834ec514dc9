//! End-to-end tests of the analyzer.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use awk_analysis::Analyzer;
use awk_analysis::Config;
use awk_analysis::Diagnostic;
use awk_analysis::DocumentDiagnostics;
use awk_analysis::Mode;
use awk_analysis::SourcePosition;
use awk_analysis::StylisticWarnings;
use lsp_types::HoverContents;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;

/// The diagnostics most recently published for each document.
type Published = Arc<Mutex<HashMap<Url, Vec<Diagnostic>>>>;

/// Creates an analyzer that records published diagnostics.
fn analyzer_with(config: Config) -> (Analyzer, Published) {
    let published: Published = Default::default();
    let sink = published.clone();
    let analyzer = Analyzer::new(config, move |batch: Vec<DocumentDiagnostics>| {
        let sink = sink.clone();
        async move {
            let mut sink = sink.lock();
            for entry in batch {
                sink.insert((*entry.uri).clone(), entry.diagnostics);
            }
        }
    });
    (analyzer, published)
}

/// Gets the markdown content of a hover.
fn hover_text(hover: lsp_types::Hover) -> String {
    match hover.contents {
        HoverContents::Markup(markup) => markup.value,
        other => panic!("unexpected hover contents: {other:?}"),
    }
}

/// Creates a file URI under a directory.
fn file_uri(dir: &TempDir, name: &str) -> Url {
    Url::from_file_path(dir.path().join(name)).expect("path should convert to URI")
}

/// A configuration with the include path pinned to the includer's directory.
fn local_includes() -> Config {
    Config::default().with_path(Some(vec![PathBuf::from(".")]))
}

#[tokio::test(flavor = "multi_thread")]
async fn it_reports_implicit_globals_without_definitions() {
    let (analyzer, _) = analyzer_with(Config::default());
    let uri = Url::parse("file:///foo.awk").expect("URI should parse");
    analyzer
        .document_opened(uri.clone(), "BEGIN { x = 1; print y }\n")
        .await
        .expect("open should succeed");

    let over_y = SourcePosition::new(0, 21);

    // Go-to-definition filters the implicit definition out.
    assert!(
        analyzer
            .goto_definition(&uri, over_y)
            .expect("query should succeed")
            .is_empty()
    );

    // Hover still reports the symbol as a global variable.
    let hover = analyzer
        .hover(&uri, over_y)
        .expect("query should succeed")
        .expect("should produce hover content");
    assert_eq!(hover_text(hover), "global variable");

    // References include the single use, even with declarations requested.
    let references = analyzer
        .references(&uri, over_y, true)
        .expect("query should succeed");
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].range.start, lsp_types::Position::new(0, 21));

    // The explicit definition of `x` resolves normally.
    let over_x = SourcePosition::new(0, 8);
    let definitions = analyzer
        .goto_definition(&uri, over_x)
        .expect("query should succeed");
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].range.start, lsp_types::Position::new(0, 8));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_resolves_include_cycles_without_reparsing() {
    let dir = TempDir::new().expect("should create temporary directory");
    fs::write(
        dir.path().join("a.awk"),
        "@include \"b.awk\"\nBEGIN { x = 1 }\n",
    )
    .expect("should write a.awk");
    fs::write(
        dir.path().join("b.awk"),
        "@include \"a.awk\"\nfunction helper(value) { return value }\n",
    )
    .expect("should write b.awk");

    let (analyzer, published) = analyzer_with(local_includes());
    let a = file_uri(&dir, "a.awk");
    let b = file_uri(&dir, "b.awk");

    analyzer
        .document_opened(
            a.clone(),
            fs::read_to_string(dir.path().join("a.awk")).expect("should read a.awk"),
        )
        .await
        .expect("open should succeed");

    // Both documents are live and the include edges form a cycle.
    assert_eq!(analyzer.document_count(), 2);
    assert_eq!(
        analyzer.includes(&a).iter().map(|u| (**u).clone()).collect::<Vec<_>>(),
        vec![b.clone()]
    );
    assert_eq!(
        analyzer.includes(&b).iter().map(|u| (**u).clone()).collect::<Vec<_>>(),
        vec![a.clone()]
    );

    // The included document's symbols are visible workspace-wide.
    let symbols = analyzer
        .workspace_symbol("hel")
        .expect("query should succeed");
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "helper");

    // Diagnostics were published for both documents, with no findings.
    let published = published.lock();
    assert_eq!(published.get(&a), Some(&Vec::new()));
    assert_eq!(published.get(&b), Some(&Vec::new()));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_checks_arity_across_includes_and_reanalyzes_on_change() {
    let dir = TempDir::new().expect("should create temporary directory");
    fs::write(
        dir.path().join("lib.awk"),
        "function f(x, y) {\n    return x + y\n}\n",
    )
    .expect("should write lib.awk");
    fs::write(
        dir.path().join("main.awk"),
        "@include \"lib.awk\"\nBEGIN { print f(1) }\n",
    )
    .expect("should write main.awk");

    let (analyzer, published) = analyzer_with(local_includes());
    let main = file_uri(&dir, "main.awk");
    let lib = file_uri(&dir, "lib.awk");

    analyzer
        .document_opened(
            main.clone(),
            fs::read_to_string(dir.path().join("main.awk")).expect("should read main.awk"),
        )
        .await
        .expect("open should succeed");

    {
        let published = published.lock();
        let diagnostics = published.get(&main).expect("main should have diagnostics");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message(),
            "too few arguments to `f`: expected at least 2, found 1"
        );
        assert_eq!(diagnostics[0].range().start, SourcePosition::new(1, 14));
        assert_eq!(published.get(&lib), Some(&Vec::new()));
    }

    // Editing the library's signature triggers re-analysis of the includer
    // in the next wrap-up.
    analyzer
        .document_opened(
            lib.clone(),
            "function f(x, y, z) {\n    return x + y + z\n}\n",
        )
        .await
        .expect("open should succeed");

    let published = published.lock();
    let diagnostics = published.get(&main).expect("main should have diagnostics");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message(),
        "too few arguments to `f`: expected at least 3, found 1"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn it_rejects_signature_help_past_the_last_argument() {
    let (analyzer, _) = analyzer_with(Config::default());
    let uri = Url::parse("file:///sig.awk").expect("URI should parse");
    analyzer
        .document_opened(uri.clone(), "BEGIN { print substr(\"abc\", 1, 2) }\n")
        .await
        .expect("open should succeed");

    // Past the closing parenthesis, the sentinel marker rejects the request.
    assert!(
        analyzer
            .signature_help(&uri, SourcePosition::new(0, 33))
            .expect("query should succeed")
            .is_none()
    );

    // Inside the call, the innermost marker selects the active argument.
    let help = analyzer
        .signature_help(&uri, SourcePosition::new(0, 31))
        .expect("query should succeed")
        .expect("should produce signature help");
    assert_eq!(help.signatures.len(), 1);
    assert_eq!(help.signatures[0].label, "substr(string, start [, length])");
    assert_eq!(help.active_parameter, Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_scopes_completion_to_the_enclosing_function() {
    let (analyzer, _) = analyzer_with(Config::default());
    let uri = Url::parse("file:///scope.awk").expect("URI should parse");
    analyzer
        .document_opened(
            uri.clone(),
            "count = 0\nfunction f(a) { a }\nfunction g(b) { return b }\n",
        )
        .await
        .expect("open should succeed");

    let items = analyzer
        .completion(&uri, SourcePosition::new(1, 17))
        .expect("query should succeed");
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();

    // The enclosing function's parameter, file-scope symbols, and built-ins
    // are all offered; other functions' parameters are not.
    assert!(labels.contains(&"a"));
    assert!(labels.contains(&"count"));
    assert!(labels.contains(&"f"));
    assert!(labels.contains(&"g"));
    assert!(labels.contains(&"substr"));
    assert!(!labels.contains(&"b"));

    // At file scope, neither parameter is offered.
    let items = analyzer
        .completion(&uri, SourcePosition::new(0, 0))
        .expect("query should succeed");
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    assert!(!labels.contains(&"a"));
    assert!(!labels.contains(&"b"));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_honors_the_shebang_mode_override() {
    let config = Config::default()
        .with_mode(Mode::Awk)
        .with_stylistic_warnings(StylisticWarnings {
            compatibility: false,
            ..Default::default()
        });
    let (analyzer, _) = analyzer_with(config);

    // With a gawk shebang, a gawk-only built-in resolves despite the strict
    // global mode.
    let with_shebang = Url::parse("file:///shebang.awk").expect("URI should parse");
    analyzer
        .document_opened(
            with_shebang.clone(),
            "#!/usr/bin/gawk -f\nBEGIN { x = systime() }\n",
        )
        .await
        .expect("open should succeed");

    let hover = analyzer
        .hover(&with_shebang, SourcePosition::new(1, 12))
        .expect("query should succeed")
        .expect("should produce hover content");
    assert!(hover_text(hover).contains("Returns the current time"));

    // Without the shebang, the built-in is invisible in strict mode.
    let without = Url::parse("file:///strict.awk").expect("URI should parse");
    analyzer
        .document_opened(without.clone(), "BEGIN { x = systime() }\n")
        .await
        .expect("open should succeed");

    let hover = analyzer
        .hover(&without, SourcePosition::new(0, 12))
        .expect("query should succeed")
        .expect("should produce hover content");
    assert_eq!(hover_text(hover), "function");
}

#[tokio::test(flavor = "multi_thread")]
async fn it_produces_identical_results_across_reopens() {
    let (analyzer, _) = analyzer_with(Config::default());
    let uri = Url::parse("file:///reopen.awk").expect("URI should parse");
    let text = "function add(a, b) { return a + b }\nBEGIN { total = add(1, 2) }\n";

    analyzer
        .document_opened(uri.clone(), text)
        .await
        .expect("open should succeed");
    let over_add = SourcePosition::new(1, 16);
    let before = analyzer
        .references(&uri, over_add, true)
        .expect("query should succeed");
    assert!(!before.is_empty());

    analyzer
        .document_closed(uri.clone())
        .await
        .expect("close should succeed");
    assert_eq!(analyzer.document_count(), 0);
    assert!(
        analyzer
            .references(&uri, over_add, true)
            .expect("query should succeed")
            .is_empty()
    );

    analyzer
        .document_opened(uri.clone(), text)
        .await
        .expect("open should succeed");
    let after = analyzer
        .references(&uri, over_add, true)
        .expect("query should succeed");
    assert_eq!(before, after);
}

#[tokio::test(flavor = "multi_thread")]
async fn it_reproduces_diagnostics_after_toggling_call_checking() {
    let (analyzer, published) = analyzer_with(Config::default());
    let uri = Url::parse("file:///toggle.awk").expect("URI should parse");
    analyzer
        .document_opened(uri.clone(), "BEGIN { print substr(\"abc\") }\n")
        .await
        .expect("open should succeed");

    let initial = published.lock().get(&uri).cloned().expect("should publish");
    assert_eq!(initial.len(), 1);

    let off = Config::default().with_stylistic_warnings(StylisticWarnings {
        check_function_calls: false,
        ..Default::default()
    });
    analyzer.configure(off).await.expect("configure should succeed");
    assert_eq!(published.lock().get(&uri), Some(&Vec::new()));

    analyzer
        .configure(Config::default())
        .await
        .expect("configure should succeed");
    assert_eq!(published.lock().get(&uri), Some(&initial));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_reports_missing_includes_at_the_directive() {
    let dir = TempDir::new().expect("should create temporary directory");
    let (analyzer, published) = analyzer_with(local_includes());
    let uri = file_uri(&dir, "main.awk");

    analyzer
        .document_opened(uri.clone(), "@include \"nope.awk\"\nBEGIN { x = 1 }\n")
        .await
        .expect("open should succeed");

    let published = published.lock();
    let diagnostics = published.get(&uri).expect("should publish");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message(), "cannot find included file `nope.awk`");
    assert_eq!(diagnostics[0].range().start, SourcePosition::new(0, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn it_collects_unreferenced_includes_when_the_editor_closes() {
    let dir = TempDir::new().expect("should create temporary directory");
    fs::write(dir.path().join("util.awk"), "function util() {}\n")
        .expect("should write util.awk");

    let (analyzer, _) = analyzer_with(local_includes());
    let main = file_uri(&dir, "main.awk");

    analyzer
        .document_opened(main.clone(), "@include \"util.awk\"\n")
        .await
        .expect("open should succeed");
    assert_eq!(analyzer.document_count(), 2);

    analyzer
        .document_closed(main.clone())
        .await
        .expect("close should succeed");
    assert_eq!(analyzer.document_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn it_lists_document_symbols() {
    let (analyzer, _) = analyzer_with(Config::default());
    let uri = Url::parse("file:///symbols.awk").expect("URI should parse");
    analyzer
        .document_opened(
            uri.clone(),
            "function first() {}\nfunction second(x) { return x }\n",
        )
        .await
        .expect("open should succeed");

    let symbols = analyzer.document_symbol(&uri).expect("query should succeed");
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert_eq!(symbols[0].location.range.start, lsp_types::Position::new(0, 9));

    // Workspace symbols match by prefix only.
    assert_eq!(analyzer.workspace_symbol("sec").expect("query should succeed").len(), 1);
    assert_eq!(analyzer.workspace_symbol("ond").expect("query should succeed").len(), 0);
}
