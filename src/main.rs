//! The awkls command line binary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use awk_analysis::Analyzer;
use awk_analysis::Config;
use awk_analysis::Diagnostic;
use awk_analysis::DocumentDiagnostics;
use awk_analysis::Severity;
use awk_lsp::ServerOptions;
use clap::Parser;
use clap::Subcommand;
use clap_verbosity_flag::InfoLevel;
use clap_verbosity_flag::Verbosity;
use url::Url;

/// A command line tool and language server for AWK scripts.
#[derive(Parser)]
#[command(name = "awkls", version, about)]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// The verbosity flags.
    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

/// The supported subcommands.
#[derive(Subcommand)]
enum Command {
    /// Runs the language server over stdio.
    Serve,
    /// Analyzes documents and prints their diagnostics.
    Check {
        /// The AWK files to check.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => awk_lsp::Server::run(ServerOptions::default()).await,
        Command::Check { paths } => check(paths).await,
    }
}

/// Analyzes the given files and prints their diagnostics to stderr.
///
/// Exits with a non-zero status when any error-severity diagnostic is
/// produced.
async fn check(paths: Vec<PathBuf>) -> Result<()> {
    let published: Arc<Mutex<HashMap<Url, Vec<Diagnostic>>>> = Default::default();
    let sink = published.clone();
    let analyzer = Analyzer::new(Config::default(), move |batch: Vec<DocumentDiagnostics>| {
        let sink = sink.clone();
        async move {
            let mut sink = sink.lock().expect("diagnostics sink should not be poisoned");
            for entry in batch {
                sink.insert((*entry.uri).clone(), entry.diagnostics);
            }
        }
    });

    for path in &paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{path}`", path = path.display()))?;
        let absolute = std::path::absolute(path).with_context(|| {
            format!(
                "failed to determine the absolute path of `{path}`",
                path = path.display()
            )
        })?;
        let uri = Url::from_file_path(&absolute)
            .map_err(|_| anyhow!("`{path}` cannot be a file URI", path = absolute.display()))?;
        analyzer.document_opened(uri, text).await?;
    }

    let mut errors = false;
    let published = published.lock().expect("diagnostics sink should not be poisoned");
    let mut entries: Vec<_> = published.iter().collect();
    entries.sort_by_key(|(uri, _)| uri.as_str());
    for (uri, diagnostics) in entries {
        let name = uri
            .to_file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| uri.to_string());
        for diagnostic in diagnostics {
            let severity = match diagnostic.severity() {
                Severity::Error => {
                    errors = true;
                    "error"
                }
                Severity::Warning => "warning",
                Severity::Information => "note",
            };
            eprintln!(
                "{name}:{line}:{column}: {severity}: {message}",
                line = diagnostic.range().start.line + 1,
                column = diagnostic.range().start.character + 1,
                message = diagnostic.message()
            );
        }
    }
    drop(published);

    if errors {
        std::process::exit(1);
    }

    Ok(())
}
