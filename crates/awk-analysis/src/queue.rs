//! Implements the analysis queue.
//!
//! The queue runs on a dedicated thread that owns all mutable analysis state.
//! Editor events and include-read completions arrive over a channel; parsing
//! is gated on there being no outstanding filesystem reads, so a parse never
//! observes partial I/O state. When the queue drains, the wrap-up step runs
//! exactly once for the batch: orphaned documents are closed, semantic
//! analysis runs over the altered set, and diagnostics are published for
//! every live document.

use std::collections::VecDeque;
use std::future::Future;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use path_clean::clean;
use petgraph::graph::NodeIndex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::Config;
use crate::Diagnostic;
use crate::DocumentDiagnostics;
use crate::adapter;
use crate::adapter::DiscoveredInclude;
use crate::graph::DocumentGraph;
use crate::semantic;

/// Represents a request to the analysis queue.
pub(crate) enum Request {
    /// An editor buffer was opened or fully changed.
    Open(OpenRequest),
    /// An editor buffer was closed.
    Close(CloseRequest),
    /// The configuration changed.
    Configure(ConfigureRequest),
    /// An include file read completed.
    ReadCompleted(ReadCompletedRequest),
}

/// A request to analyze an opened or changed editor buffer.
pub(crate) struct OpenRequest {
    /// The URI of the buffer.
    pub uri: Url,
    /// The full text of the buffer.
    pub text: String,
    /// The sender for completing the request.
    pub completed: oneshot::Sender<()>,
}

/// A request to close an editor buffer.
pub(crate) struct CloseRequest {
    /// The URI of the buffer.
    pub uri: Url,
    /// The sender for completing the request.
    pub completed: oneshot::Sender<()>,
}

/// A request to change the configuration.
pub(crate) struct ConfigureRequest {
    /// The new configuration.
    pub config: Config,
    /// The sender for completing the request.
    pub completed: oneshot::Sender<()>,
}

/// The completion of an include file read.
pub(crate) struct ReadCompletedRequest {
    /// The URI of the read document.
    pub uri: Arc<Url>,
    /// The result of the read.
    pub result: std::io::Result<String>,
}

/// A parse waiting for the processor.
struct PendingParse {
    /// The URI of the document to parse.
    uri: Arc<Url>,
    /// The text to parse.
    text: Arc<str>,
}

/// Represents the analysis queue.
pub(crate) struct AnalysisQueue<P, R> {
    /// The document graph maintained by the queue.
    graph: Arc<RwLock<DocumentGraph>>,
    /// The active configuration, shared with the query layer.
    config: Arc<RwLock<Config>>,
    /// The handle to the tokio runtime for blocking on async tasks.
    tokio: Handle,
    /// The diagnostics publication callback.
    publish: Arc<P>,
    /// A sender for re-entering the queue from read completions.
    sender: UnboundedSender<Request>,
    /// The parses waiting for the processor.
    pending: VecDeque<PendingParse>,
    /// The number of outstanding filesystem reads.
    open_reads: usize,
    /// Whether the current batch needs a wrap-up.
    dirty: bool,
    /// Requests to complete at the end of the current batch.
    waiters: Vec<oneshot::Sender<()>>,
    /// Documents whose latest parse differed from their previous state.
    altered: IndexSet<NodeIndex>,
    /// Documents whose latest parse changed their function signatures.
    altered_definitions: IndexSet<NodeIndex>,
    /// A marker for the `R` type.
    marker: PhantomData<R>,
}

impl<P, R> AnalysisQueue<P, R>
where
    P: Fn(Vec<DocumentDiagnostics>) -> R + Send + Sync + 'static,
    R: Future<Output = ()>,
{
    /// Constructs a new analysis queue.
    pub fn new(
        graph: Arc<RwLock<DocumentGraph>>,
        config: Arc<RwLock<Config>>,
        tokio: Handle,
        publish: P,
        sender: UnboundedSender<Request>,
    ) -> Self {
        Self {
            graph,
            config,
            tokio,
            publish: Arc::new(publish),
            sender,
            pending: VecDeque::new(),
            open_reads: 0,
            dirty: false,
            waiters: Vec::new(),
            altered: IndexSet::new(),
            altered_definitions: IndexSet::new(),
            marker: PhantomData,
        }
    }

    /// Runs the analysis queue until the request channel closes.
    pub fn run(mut self, mut receiver: UnboundedReceiver<Request>) {
        info!("analysis queue has started");

        while let Some(request) = self.tokio.block_on(receiver.recv()) {
            match request {
                Request::Open(request) => self.open(request),
                Request::Close(request) => self.close(request),
                Request::Configure(request) => self.configure(request),
                Request::ReadCompleted(request) => self.read_completed(request),
            }

            self.process();
        }

        info!("analysis queue has shut down");
    }

    /// Handles an opened or changed editor buffer.
    fn open(&mut self, request: OpenRequest) {
        let uri = Arc::new(request.uri);
        debug!("document `{uri}` was opened or changed in the editor");

        {
            let mut graph = self.graph.write();
            let index = graph.add_document(uri.clone());
            graph.open_in_editor(index);
        }

        self.pending.push_back(PendingParse {
            uri,
            text: request.text.into(),
        });
        self.dirty = true;
        self.waiters.push(request.completed);
    }

    /// Handles a closed editor buffer.
    ///
    /// The document itself is removed at wrap-up, and only if nothing still
    /// includes it.
    fn close(&mut self, request: CloseRequest) {
        debug!("document `{uri}` was closed in the editor", uri = request.uri);

        let mut graph = self.graph.write();
        if let Some(index) = graph.get_index(&request.uri) {
            graph.close_in_editor(index);
        }
        drop(graph);

        self.dirty = true;
        self.waiters.push(request.completed);
    }

    /// Handles a configuration change.
    ///
    /// A change to any recognized option revalidates every live document
    /// from its cached source.
    fn configure(&mut self, request: ConfigureRequest) {
        let changed = *self.config.read() != request.config;
        if changed {
            debug!("configuration changed; revalidating all documents");
            *self.config.write() = request.config;

            let graph = self.graph.read();
            let live: Vec<NodeIndex> = graph.documents().collect();
            for index in live {
                let document = graph.get(index);
                self.pending.push_back(PendingParse {
                    uri: document.uri().clone(),
                    text: document.source().clone(),
                });
            }
        }

        self.dirty = true;
        self.waiters.push(request.completed);
    }

    /// Handles an include read completion.
    ///
    /// A failed read advances the queue without enqueuing a parse; the
    /// missing-include diagnostic already covers the user-visible case.
    fn read_completed(&mut self, request: ReadCompletedRequest) {
        self.open_reads -= 1;

        match request.result {
            Ok(text) => {
                let open_in_editor = {
                    let graph = self.graph.read();
                    graph
                        .get_index(&request.uri)
                        .is_some_and(|index| graph.is_open(index))
                };

                if open_in_editor {
                    // The editor buffer was opened while the read was in
                    // flight; its text wins over the disk contents.
                    debug!(
                        "discarding read of `{uri}`: now open in the editor",
                        uri = request.uri
                    );
                } else {
                    self.pending.push_back(PendingParse {
                        uri: request.uri,
                        text: text.into(),
                    });
                }
            }
            Err(e) => {
                debug!("failed to read `{uri}`: {e}", uri = request.uri);
            }
        }
    }

    /// Advances the processor.
    ///
    /// Parses run only while no filesystem reads are outstanding; the
    /// wrap-up runs once the batch has fully drained.
    fn process(&mut self) {
        while self.open_reads == 0 {
            let Some(item) = self.pending.pop_front() else {
                break;
            };
            self.validate(item);
        }

        if self.pending.is_empty()
            && self.open_reads == 0
            && (self.dirty || !self.waiters.is_empty())
        {
            self.wrap_up();
        }
    }

    /// Parses one pending document and resolves its includes.
    fn validate(&mut self, item: PendingParse) {
        let config = self.config.read().clone();

        let (index, includes) = {
            let mut graph = self.graph.write();
            let Some(index) = graph.get_index(&item.uri) else {
                return;
            };

            debug!("validating `{uri}`", uri = item.uri);
            let outcome = adapter::validate_document(graph.get_mut(index), item.text, &config);

            self.altered.insert(index);
            if outcome.signatures_changed {
                self.altered_definitions.insert(index);
            }

            // The document's includes may have changed; rebuild its edges.
            graph.remove_include_edges(index);
            (index, outcome.includes)
        };

        for include in includes {
            self.resolve_include(index, include, &config);
        }
    }

    /// Resolves one `@include` directive.
    ///
    /// A new document is registered before its read starts; a second include
    /// of the same URI sees the existing entry, which is what breaks include
    /// cycles.
    fn resolve_include(&mut self, includer: NodeIndex, include: DiscoveredInclude, config: &Config) {
        let mut graph = self.graph.write();
        let includer_dir = graph
            .get(includer)
            .uri()
            .to_file_path()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        let path = PathBuf::from(&include.path);
        let mut candidates = Vec::new();
        if path.is_absolute() {
            candidates.push(path.clone());
        } else if include.relative {
            if let Some(dir) = &includer_dir {
                candidates.push(dir.join(&path));
            }
        } else {
            for entry in config.include_path() {
                if entry.is_absolute() {
                    candidates.push(entry.join(&path));
                } else if let Some(dir) = &includer_dir {
                    candidates.push(dir.join(entry).join(&path));
                }
            }
        }

        let found = candidates.into_iter().find(|c| c.is_file());
        let uri = found.as_ref().and_then(|found| {
            let absolute = std::path::absolute(found).ok()?;
            Url::from_file_path(clean(absolute)).ok()
        });
        let Some(uri) = uri.map(Arc::new) else {
            debug!(
                "cannot resolve include `{path}` from `{uri}`",
                path = include.path,
                uri = graph.get(includer).uri()
            );
            graph.get_mut(includer).push_parse_diagnostic(Diagnostic::error(
                format!("cannot find included file `{path}`", path = include.path),
                include.site,
            ));
            return;
        };

        if let Some(existing) = graph.get_index(&uri) {
            // Already known: record the edge and schedule no parse.
            graph.add_include(includer, existing, include.site);
            return;
        }

        let target = graph.add_document(uri.clone());
        graph.add_include(includer, target, include.site);

        self.open_reads += 1;
        let sender = self.sender.clone();
        let read_path = found.expect("a resolved include should have a path");
        debug!("reading included file `{uri}`");
        self.tokio.spawn(async move {
            let result = tokio::fs::read_to_string(read_path).await;
            let _ = sender.send(Request::ReadCompleted(ReadCompletedRequest { uri, result }));
        });
    }

    /// Runs the wrap-up for a drained batch.
    ///
    /// Closes orphaned documents, runs semantic analysis over the altered
    /// set and its dependents, publishes diagnostics for every live
    /// document, and completes the batch's requests.
    fn wrap_up(&mut self) {
        let config = self.config.read().clone();

        let batch = {
            let mut graph = self.graph.write();

            for uri in graph.gc() {
                debug!("closed orphaned document `{uri}`");
            }

            self.altered.retain(|i| graph.contains(*i));
            self.altered_definitions.retain(|i| graph.contains(*i));

            // A signature change in a document requires re-checking its
            // transitive includers; a plain change re-checks the document
            // itself.
            let mut targets = graph.dependents_closure(self.altered_definitions.iter().copied());
            targets.extend(self.altered.iter().copied());
            semantic::analyze(&mut graph, &targets, &config);

            self.altered.clear();
            self.altered_definitions.clear();

            let max = config.max_number_of_problems();
            graph
                .documents()
                .map(|index| {
                    let document = graph.get(index);
                    DocumentDiagnostics {
                        uri: document.uri().clone(),
                        diagnostics: document.diagnostics_capped(max),
                    }
                })
                .collect::<Vec<_>>()
        };

        debug!(
            "wrap-up complete; publishing diagnostics for {count} document(s)",
            count = batch.len()
        );
        self.dirty = false;
        self.tokio.block_on((self.publish)(batch));

        for waiter in self.waiters.drain(..) {
            waiter.send(()).ok();
        }
    }
}
