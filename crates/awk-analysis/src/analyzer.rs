//! Implementation of the analyzer.

use std::future::Future;
use std::mem::ManuallyDrop;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Result;
use anyhow::anyhow;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use url::Url;

use crate::Config;
use crate::Diagnostic;
use crate::graph::DocumentGraph;
use crate::handlers;
use crate::queue::AnalysisQueue;
use crate::queue::CloseRequest;
use crate::queue::ConfigureRequest;
use crate::queue::OpenRequest;
use crate::queue::Request;

/// Represents a position in a document's source.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default, Hash)]
pub struct SourcePosition {
    /// Line position in a document (zero-based).
    // NOTE: this field must come before `character` to maintain a correct
    // sort order.
    pub line: u32,
    /// Character offset on a line in a document (zero-based).
    pub character: u32,
}

impl SourcePosition {
    /// Constructs a new source position from a line and character offset.
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl From<SourcePosition> for lsp_types::Position {
    fn from(pos: SourcePosition) -> Self {
        Self::new(pos.line, pos.character)
    }
}

impl From<lsp_types::Position> for SourcePosition {
    fn from(pos: lsp_types::Position) -> Self {
        Self::new(pos.line, pos.character)
    }
}

/// Represents a range in a document's source.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default, Hash)]
pub struct SourceRange {
    /// The start of the range (inclusive).
    pub start: SourcePosition,
    /// The end of the range (inclusive).
    pub end: SourcePosition,
}

impl SourceRange {
    /// Constructs a new source range.
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Constructs a range covering `len` characters from a position.
    pub fn at(start: SourcePosition, len: u32) -> Self {
        Self {
            start,
            end: SourcePosition::new(start.line, start.character + len),
        }
    }

    /// Whether the range contains a position.
    pub fn contains(&self, position: SourcePosition) -> bool {
        self.start <= position && position <= self.end
    }
}

impl From<SourceRange> for lsp_types::Range {
    fn from(range: SourceRange) -> Self {
        Self::new(range.start.into(), range.end.into())
    }
}

/// Diagnostics published for one document at the end of a batch.
#[derive(Debug, Clone)]
pub struct DocumentDiagnostics {
    /// The URI of the document.
    pub uri: Arc<Url>,
    /// The document's diagnostics, parse diagnostics first.
    pub diagnostics: Vec<Diagnostic>,
}

/// Represents an AWK document analyzer.
///
/// The analyzer maintains a graph of documents linked by `@include`
/// directives. Editor events are processed in arrival order on a dedicated
/// queue thread; diagnostics for every live document are delivered to the
/// publication callback once per drained batch. Query methods read the same
/// structures between batches and never mutate them.
///
/// Note that dropping the analyzer is a blocking operation as it will wait
/// for the queue thread to join.
#[derive(Debug)]
pub struct Analyzer {
    /// The document graph, shared with the queue thread.
    graph: Arc<RwLock<DocumentGraph>>,
    /// The active configuration, shared with the queue thread.
    config: Arc<RwLock<Config>>,
    /// The sender for sending requests to the queue.
    sender: ManuallyDrop<mpsc::UnboundedSender<Request>>,
    /// The join handle for the queue thread.
    handle: Option<JoinHandle<()>>,
}

impl Analyzer {
    /// Constructs a new analyzer with the given configuration.
    ///
    /// The publication callback is invoked with the diagnostics of every
    /// live document at the end of each processed batch.
    ///
    /// The analyzer must be constructed from the context of a Tokio runtime.
    pub fn new<P, R>(config: Config, publish: P) -> Self
    where
        P: Fn(Vec<DocumentDiagnostics>) -> R + Send + Sync + 'static,
        R: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let tokio = Handle::current();
        let graph: Arc<RwLock<DocumentGraph>> = Default::default();
        let shared_config = Arc::new(RwLock::new(config));

        let queue_graph = graph.clone();
        let queue_config = shared_config.clone();
        let queue_sender = tx.clone();
        let handle = std::thread::spawn(move || {
            let queue = AnalysisQueue::new(queue_graph, queue_config, tokio, publish, queue_sender);
            queue.run(rx);
        });

        Self {
            graph,
            config: shared_config,
            sender: ManuallyDrop::new(tx),
            handle: Some(handle),
        }
    }

    /// Notifies the analyzer that a document was opened in the editor.
    ///
    /// Returns once the batch containing this event has fully processed and
    /// its diagnostics have been published.
    pub async fn document_opened(&self, uri: Url, text: impl Into<String>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Request::Open(OpenRequest {
            uri,
            text: text.into(),
            completed: tx,
        }))?;
        Self::wait(rx).await
    }

    /// Notifies the analyzer that a document's text fully changed.
    ///
    /// Documents use full synchronization, so a change is processed exactly
    /// like an open.
    pub async fn document_changed(&self, uri: Url, text: impl Into<String>) -> Result<()> {
        self.document_opened(uri, text).await
    }

    /// Notifies the analyzer that a document was closed in the editor.
    ///
    /// The document persists while any other document still includes it.
    pub async fn document_closed(&self, uri: Url) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Request::Close(CloseRequest {
            uri,
            completed: tx,
        }))?;
        Self::wait(rx).await
    }

    /// Replaces the analyzer's configuration.
    ///
    /// A change to any recognized option triggers revalidation of the live
    /// documents.
    pub async fn configure(&self, config: Config) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Request::Configure(ConfigureRequest {
            config,
            completed: tx,
        }))?;
        Self::wait(rx).await
    }

    /// Gets hover content for a position.
    pub fn hover(&self, uri: &Url, position: SourcePosition) -> Result<Option<lsp_types::Hover>> {
        handlers::hover(&self.graph.read(), &self.config.read(), uri, position)
    }

    /// Gets the definition locations for the symbol at a position.
    pub fn goto_definition(
        &self,
        uri: &Url,
        position: SourcePosition,
    ) -> Result<Vec<lsp_types::Location>> {
        handlers::goto_definition(&self.graph.read(), uri, position)
    }

    /// Gets every reference to the symbol at a position.
    pub fn references(
        &self,
        uri: &Url,
        position: SourcePosition,
        include_declaration: bool,
    ) -> Result<Vec<lsp_types::Location>> {
        handlers::find_all_references(&self.graph.read(), uri, position, include_declaration)
    }

    /// Gets the completion items for a position.
    pub fn completion(
        &self,
        uri: &Url,
        position: SourcePosition,
    ) -> Result<Vec<lsp_types::CompletionItem>> {
        handlers::completions(&self.graph.read(), uri, position)
    }

    /// Resolves additional detail for a completion item.
    pub fn resolve_completion(&self, item: lsp_types::CompletionItem) -> lsp_types::CompletionItem {
        handlers::resolve_completion(item)
    }

    /// Gets the symbols defined by a document.
    pub fn document_symbol(&self, uri: &Url) -> Result<Vec<lsp_types::SymbolInformation>> {
        handlers::document_symbol(&self.graph.read(), uri)
    }

    /// Gets the workspace symbols matching a query prefix.
    pub fn workspace_symbol(&self, query: &str) -> Result<Vec<lsp_types::SymbolInformation>> {
        handlers::workspace_symbol(&self.graph.read(), query)
    }

    /// Gets signature help for a position.
    pub fn signature_help(
        &self,
        uri: &Url,
        position: SourcePosition,
    ) -> Result<Option<lsp_types::SignatureHelp>> {
        handlers::signature_help(&self.graph.read(), &self.config.read(), uri, position)
    }

    /// Gets the number of live documents.
    pub fn document_count(&self) -> usize {
        self.graph.read().documents().count()
    }

    /// Gets the URIs of the documents a document includes.
    ///
    /// Returns an empty list for unknown URIs.
    pub fn includes(&self, uri: &Url) -> Vec<Arc<Url>> {
        let graph = self.graph.read();
        let Some(index) = graph.get_index(uri) else {
            return Vec::new();
        };

        graph
            .includes(index)
            .into_iter()
            .map(|(target, _)| graph.get(target).uri().clone())
            .collect()
    }

    /// Sends a request to the queue.
    fn send(&self, request: Request) -> Result<()> {
        self.sender.send(request).map_err(|_| {
            anyhow!("failed to send request to analysis queue because the channel has closed")
        })
    }

    /// Waits for a request to complete.
    async fn wait(rx: oneshot::Receiver<()>) -> Result<()> {
        rx.await.map_err(|_| {
            anyhow!("failed to receive response from analysis queue because the channel has closed")
        })
    }
}

impl Drop for Analyzer {
    fn drop(&mut self) {
        // Dropping the sender closes the channel, which stops the queue.
        unsafe { ManuallyDrop::drop(&mut self.sender) };
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

/// Constant that asserts `Analyzer` is `Send + Sync`; if not, it fails to
/// compile.
const _: () = {
    /// Helper that will fail to compile if T is not `Send + Sync`.
    const fn _assert<T: Send + Sync>() {}
    _assert::<Analyzer>();
};
