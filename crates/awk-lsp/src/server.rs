//! Implementation of the LSP server.

use anyhow::Result;
use awk_analysis::Analyzer;
use awk_analysis::Config;
use awk_analysis::DocumentDiagnostics;
use awk_analysis::SourcePosition;
use tower_lsp::Client;
use tower_lsp::LanguageServer;
use tower_lsp::LspService;
use tower_lsp::jsonrpc::Result as RpcResult;
use tower_lsp::lsp_types::*;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Represents options for running the LSP server.
#[derive(Debug, Default)]
pub struct ServerOptions {
    /// The name of the server.
    ///
    /// Defaults to the `awk-lsp` crate name.
    pub name: Option<String>,

    /// The version of the server.
    ///
    /// Defaults to the version of the `awk-lsp` crate.
    pub version: Option<String>,
}

/// Represents an LSP server for analyzing AWK documents.
#[derive(Debug)]
pub struct Server {
    /// The LSP client connected to the server.
    client: Client,
    /// The options for the server.
    options: ServerOptions,
    /// The analyzer used to analyze documents.
    analyzer: Analyzer,
}

impl Server {
    /// Runs the server over stdio until a request is received to shut down.
    pub async fn run(options: ServerOptions) -> Result<()> {
        debug!("running LSP server: {options:#?}");

        let (service, socket) = LspService::new(|client| {
            let publisher = client.clone();
            Self {
                client,
                options,
                analyzer: Analyzer::new(Config::default(), move |batch| {
                    Self::publish_diagnostics(publisher.clone(), batch)
                }),
            }
        });

        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        tower_lsp::Server::new(stdin, stdout, socket)
            .serve(service)
            .await;

        Ok(())
    }

    /// Gets the name of the server.
    fn name(&self) -> &str {
        self.options
            .name
            .as_deref()
            .unwrap_or(env!("CARGO_CRATE_NAME"))
    }

    /// Gets the version of the server.
    fn version(&self) -> &str {
        self.options
            .version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION"))
    }

    /// Publishes a batch of diagnostics to the client.
    ///
    /// This is used as a callback to the analyzer.
    async fn publish_diagnostics(client: Client, batch: Vec<DocumentDiagnostics>) {
        for entry in batch {
            let diagnostics = entry.diagnostics.iter().map(|d| d.to_lsp()).collect();
            client
                .publish_diagnostics((*entry.uri).clone(), diagnostics, None)
                .await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Server {
    async fn initialize(&self, params: InitializeParams) -> RpcResult<InitializeResult> {
        debug!("received `initialize` request: {params:#?}");

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: self.name().to_string(),
                version: Some(self.version().to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!(
            "{name} (v{version}) server initialized",
            name = self.name(),
            version = self.version()
        );
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!(
            "received `textDocument/didOpen` request for `{uri}`",
            uri = params.text_document.uri
        );

        if let Err(e) = self
            .analyzer
            .document_opened(params.text_document.uri, params.text_document.text)
            .await
        {
            error!("failed to process document open: {e:#}");
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!(
            "received `textDocument/didChange` request for `{uri}`",
            uri = params.text_document.uri
        );

        // Documents use full synchronization; the last change carries the
        // full text.
        let Some(change) = params.content_changes.into_iter().next_back() else {
            return;
        };

        if let Err(e) = self
            .analyzer
            .document_changed(params.text_document.uri, change.text)
            .await
        {
            error!("failed to process document change: {e:#}");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("received `textDocument/didClose` request for `{uri}`");

        if let Err(e) = self.analyzer.document_closed(uri.clone()).await {
            error!("failed to process document close: {e:#}");
        }

        // The document may have been collected; clear its diagnostics.
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        debug!("received `workspace/didChangeConfiguration` request");

        let Some(settings) = params.settings.get("awk").cloned() else {
            return;
        };

        match serde_json::from_value::<Config>(settings) {
            Ok(config) => {
                if let Err(e) = self.analyzer.configure(config).await {
                    error!("failed to process configuration change: {e:#}");
                }
            }
            Err(e) => warn!("ignoring malformed configuration: {e}"),
        }
    }

    async fn hover(&self, params: HoverParams) -> RpcResult<Option<Hover>> {
        let position = params.text_document_position_params;
        match self.analyzer.hover(
            &position.text_document.uri,
            SourcePosition::from(position.position),
        ) {
            Ok(hover) => Ok(hover),
            Err(e) => {
                debug!("hover request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> RpcResult<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        match self.analyzer.goto_definition(
            &position.text_document.uri,
            SourcePosition::from(position.position),
        ) {
            Ok(locations) if locations.is_empty() => Ok(None),
            Ok(locations) => Ok(Some(GotoDefinitionResponse::Array(locations))),
            Err(e) => {
                debug!("definition request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn references(&self, params: ReferenceParams) -> RpcResult<Option<Vec<Location>>> {
        let position = params.text_document_position;
        match self.analyzer.references(
            &position.text_document.uri,
            SourcePosition::from(position.position),
            params.context.include_declaration,
        ) {
            Ok(locations) => Ok(Some(locations)),
            Err(e) => {
                debug!("references request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn completion(&self, params: CompletionParams) -> RpcResult<Option<CompletionResponse>> {
        let position = params.text_document_position;
        match self.analyzer.completion(
            &position.text_document.uri,
            SourcePosition::from(position.position),
        ) {
            Ok(items) => Ok(Some(CompletionResponse::Array(items))),
            Err(e) => {
                debug!("completion request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn completion_resolve(&self, item: CompletionItem) -> RpcResult<CompletionItem> {
        Ok(self.analyzer.resolve_completion(item))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> RpcResult<Option<DocumentSymbolResponse>> {
        match self.analyzer.document_symbol(&params.text_document.uri) {
            Ok(symbols) => Ok(Some(DocumentSymbolResponse::Flat(symbols))),
            Err(e) => {
                debug!("document symbol request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> RpcResult<Option<Vec<SymbolInformation>>> {
        match self.analyzer.workspace_symbol(&params.query) {
            Ok(symbols) => Ok(Some(symbols)),
            Err(e) => {
                debug!("workspace symbol request failed: {e:#}");
                Ok(None)
            }
        }
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> RpcResult<Option<SignatureHelp>> {
        let position = params.text_document_position_params;
        match self.analyzer.signature_help(
            &position.text_document.uri,
            SourcePosition::from(position.position),
        ) {
            Ok(help) => Ok(help),
            Err(e) => {
                debug!("signature help request failed: {e:#}");
                Ok(None)
            }
        }
    }
}
