//! # LSP Backend
//!
//! The `tower-lsp` server surface. Every request follows the same shape:
//! flush the resolver so the record for the URI reflects the latest AST,
//! read the record under the workspace lock, and answer from its global
//! scope — references for navigation, complement hints for completion,
//! signature help, inlay hints and folding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use angelscript_semantic::{
    ComplementHint, GlobalScope, ReferencedKind, ScopePath, SymbolHolder, SymbolLocation, TypeKind,
    TypeSymbol,
};
use dashmap::DashMap;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::lsp_ext::{ServerStatus, ServerStatusNotification, ServerStatusParams};
use crate::resolver::{AnalysisRequest, AnalysisResolver, InspectRecord, Workspace};
use crate::utils::{offset_to_position, position_to_offset, span_contains, span_to_range};

/// Semantic token legend, in index order.
const TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::NAMESPACE,
    SemanticTokenType::CLASS,
    SemanticTokenType::INTERFACE,
    SemanticTokenType::ENUM,
    SemanticTokenType::TYPE,
    SemanticTokenType::TYPE_PARAMETER,
    SemanticTokenType::VARIABLE,
    SemanticTokenType::FUNCTION,
];

const fn token_type_index(kind: ReferencedKind) -> u32 {
    match kind {
        ReferencedKind::Namespace => 0,
        ReferencedKind::Class => 1,
        ReferencedKind::Interface => 2,
        ReferencedKind::Enum => 3,
        ReferencedKind::Typedef | ReferencedKind::Primitive => 4,
        ReferencedKind::TemplateParameter => 5,
        ReferencedKind::Variable => 6,
        ReferencedKind::Function => 7,
    }
}

/// LSP backend for AngelScript.
///
/// The workspace (record map) sits behind one mutex: the resolver task is
/// the only writer, request handlers are readers that flush first.
pub struct Backend {
    client: Client,
    workspace: Arc<Mutex<Workspace>>,
    resolver: Option<AnalysisResolver>,
    /// Open document versions, for cheap is-open checks without the lock.
    open_documents: DashMap<Url, i32>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        let workspace = Arc::new(Mutex::new(Workspace::new()));

        let (response_tx, mut response_rx) = tokio::sync::mpsc::unbounded_channel();
        let resolver = AnalysisResolver::new(Arc::clone(&workspace), response_tx);

        // Dedicated task publishing diagnostics as analyses complete.
        let publisher = client.clone();
        tokio::spawn(async move {
            while let Some(response) = response_rx.recv().await {
                publisher
                    .publish_diagnostics(response.uri, response.diagnostics, response.version)
                    .await;
                publisher
                    .send_notification::<ServerStatusNotification>(ServerStatusParams {
                        status: ServerStatus::AnalysisFinished,
                    })
                    .await;
            }
            tracing::error!("diagnostics receiver channel closed unexpectedly");
        });

        Self {
            client,
            workspace,
            resolver: Some(resolver),
            open_documents: DashMap::new(),
        }
    }

    fn send_request(&self, request: AnalysisRequest) {
        if let Some(resolver) = &self.resolver {
            if let Err(error) = resolver.request(request) {
                tracing::debug!("failed to send resolver request: {error}");
            }
        }
    }

    /// Flush the resolver for `uri` and clone its record.
    async fn fresh_record(&self, uri: &Url) -> Option<InspectRecord> {
        if let Some(resolver) = &self.resolver {
            resolver.flush(Some(uri.clone())).await;
        }
        let workspace = self.workspace.lock().unwrap();
        workspace.record(uri).cloned()
    }

    /// The reference under the cursor, narrowest span first.
    fn reference_at(record: &InspectRecord, offset: usize) -> Option<SymbolLocation> {
        let scope = record.analyzer_scope.as_ref()?;
        scope
            .references
            .iter()
            .filter(|reference| span_contains(reference.from_span, offset))
            .min_by_key(|reference| reference.from_span.end - reference.from_span.start)
            .map(|reference| reference.target.clone())
    }

    /// Location of a symbol's declaring token.
    fn location_of(workspace: &Workspace, target: &SymbolLocation) -> Option<Location> {
        let uri = Url::parse(&target.uri).ok()?;
        let record = workspace.record(&uri)?;
        Some(Location {
            uri,
            range: span_to_range(&record.content, target.name_span),
        })
    }

    /// Every use site of `target` across the workspace.
    fn collect_references(workspace: &Workspace, target: &SymbolLocation) -> Vec<Location> {
        let mut locations = Vec::new();
        for record in workspace.records() {
            let Some(scope) = &record.analyzer_scope else {
                continue;
            };
            for reference in &scope.references {
                if reference.target.same_symbol(target) {
                    locations.push(Location {
                        uri: record.uri.clone(),
                        range: span_to_range(&record.content, reference.from_span),
                    });
                }
            }
        }
        locations
    }

    /// The global scope owning a URI string, if analyzed.
    fn global_for<'a>(workspace: &'a Workspace, uri: &str) -> Option<&'a Arc<GlobalScope>> {
        let parsed = Url::parse(uri).ok()?;
        workspace.record(&parsed)?.analyzer_scope.as_ref()
    }

    /// Collect the completable instance members of a type: public
    /// instance variables and methods, through the base chain.
    fn collect_instance_members(
        workspace: &Workspace,
        symbol: &TypeSymbol,
        items: &mut Vec<CompletionItem>,
        seen: &mut std::collections::HashSet<String>,
        depth: u32,
    ) {
        if depth > 16 {
            return;
        }
        let Some(global) = Self::global_for(workspace, &symbol.defined_in) else {
            return;
        };
        // live symbol: the snapshot may predate base resolution
        let live = global
            .resolve_scope(&symbol.declared_scope)
            .and_then(|s| s.lookup_symbol(symbol.name.value()))
            .and_then(SymbolHolder::as_type)
            .cloned()
            .unwrap_or_else(|| symbol.clone());

        if let Some(members) = &live.members_scope {
            if let Some(scope) = global.resolve_scope(members) {
                for (name, holder) in &scope.symbols {
                    if !seen.insert(name.clone()) {
                        continue;
                    }
                    match holder {
                        SymbolHolder::Variable(variable) => {
                            if variable.is_instance_member
                                && variable.access
                                    == angelscript_parser::ast::AccessRestriction::Public
                            {
                                items.push(CompletionItem {
                                    label: name.clone(),
                                    kind: Some(CompletionItemKind::FIELD),
                                    detail: Some(variable.ty.display()),
                                    ..Default::default()
                                });
                            }
                        }
                        SymbolHolder::Functions(functions) => {
                            let first = functions.first();
                            if first.is_instance_member
                                && first.access
                                    == angelscript_parser::ast::AccessRestriction::Public
                            {
                                items.push(CompletionItem {
                                    label: name.clone(),
                                    kind: Some(CompletionItemKind::METHOD),
                                    detail: Some(first.signature()),
                                    ..Default::default()
                                });
                            }
                        }
                        SymbolHolder::Type(_) => {}
                    }
                }
            }
        }
        for base in &live.bases {
            if let Some(base_symbol) = base.type_symbol() {
                Self::collect_instance_members(workspace, base_symbol, items, seen, depth + 1);
            }
        }
    }

    /// Completion items for the symbols of one scope (namespace access).
    fn collect_scope_symbols(
        scope: &angelscript_semantic::SymbolScope,
        items: &mut Vec<CompletionItem>,
        seen: &mut std::collections::HashSet<String>,
    ) {
        for (name, holder) in &scope.symbols {
            if name == "this" || !seen.insert(name.clone()) {
                continue;
            }
            let (kind, detail) = match holder {
                SymbolHolder::Type(symbol) => (
                    match symbol.kind {
                        TypeKind::Enum => CompletionItemKind::ENUM,
                        TypeKind::Interface => CompletionItemKind::INTERFACE,
                        TypeKind::Class => CompletionItemKind::CLASS,
                        _ => CompletionItemKind::STRUCT,
                    },
                    None,
                ),
                SymbolHolder::Variable(variable) => {
                    (CompletionItemKind::VARIABLE, Some(variable.ty.display()))
                }
                SymbolHolder::Functions(functions) => {
                    (CompletionItemKind::FUNCTION, Some(functions.first().signature()))
                }
            };
            items.push(CompletionItem {
                label: name.clone(),
                kind: Some(kind),
                detail,
                ..Default::default()
            });
        }
        for (name, child) in &scope.children {
            if child.is_pure_namespace() && !name.starts_with('~') && seen.insert(name.clone()) {
                items.push(CompletionItem {
                    label: name.clone(),
                    kind: Some(CompletionItemKind::MODULE),
                    ..Default::default()
                });
            }
        }
    }

    /// The innermost scope whose region contains the offset.
    fn scope_at_offset(scope: &GlobalScope, offset: usize) -> ScopePath {
        scope
            .scope_regions()
            .filter(|(_, range)| span_contains(*range, offset))
            .min_by_key(|(_, range)| range.end - range.start)
            .map(|(path, _)| path.clone())
            .unwrap_or_else(ScopePath::global)
    }

    fn describe_symbol(workspace: &Workspace, target: &SymbolLocation) -> Option<String> {
        let global = Self::global_for(workspace, &target.uri)?;
        let holder = global
            .resolve_scope(&target.scope)?
            .lookup_symbol(&target.name)?;
        let text = match holder {
            SymbolHolder::Type(symbol) => {
                let keyword = match symbol.kind {
                    TypeKind::Class => "class",
                    TypeKind::Interface => "interface",
                    TypeKind::Enum => "enum",
                    TypeKind::Typedef(_) => "typedef",
                    TypeKind::TemplateParameter => "typename",
                    TypeKind::Primitive(_) => "",
                };
                if symbol.template_params.is_empty() {
                    format!("{keyword} {}", symbol.name.value()).trim_start().to_string()
                } else {
                    format!(
                        "{keyword} {}<{}>",
                        symbol.name.value(),
                        symbol.template_params.join(", ")
                    )
                }
            }
            SymbolHolder::Variable(variable) => {
                format!("{} {}", variable.ty.display(), variable.name.value())
            }
            SymbolHolder::Functions(functions) => functions
                .overloads
                .iter()
                .map(angelscript_semantic::FunctionSymbol::signature)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        Some(text)
    }

    /// Build document symbols for a scope's own declarations.
    #[allow(deprecated)]
    fn document_symbols_in(
        record: &InspectRecord,
        global: &GlobalScope,
        scope_path: &ScopePath,
    ) -> Vec<DocumentSymbol> {
        let Some(scope) = global.resolve_scope(scope_path) else {
            return Vec::new();
        };
        let mut symbols = Vec::new();

        for (name, holder) in &scope.symbols {
            if name == "this" || name == "super" {
                continue;
            }
            let location = holder.location();
            // skip builtins and members copied from other scopes or files
            if &*location.uri != record.uri.as_str()
                || location.scope != *scope_path
                || location.name_span.start == location.name_span.end
            {
                continue;
            }
            let selection = span_to_range(&record.content, location.name_span);
            match holder {
                SymbolHolder::Type(symbol) => {
                    let kind = match symbol.kind {
                        TypeKind::Enum => SymbolKind::ENUM,
                        TypeKind::Interface => SymbolKind::INTERFACE,
                        TypeKind::Class => SymbolKind::CLASS,
                        _ => SymbolKind::TYPE_PARAMETER,
                    };
                    let (range, children) = match &symbol.members_scope {
                        Some(members) => {
                            let range = scope
                                .children
                                .get(name)
                                .and_then(|child| child.linked_node.as_ref())
                                .map_or(selection, |node| {
                                    span_to_range(&record.content, node.span())
                                });
                            (range, Self::document_symbols_in(record, global, members))
                        }
                        None => (selection, Vec::new()),
                    };
                    symbols.push(DocumentSymbol {
                        name: name.clone(),
                        detail: None,
                        kind,
                        tags: None,
                        deprecated: None,
                        range,
                        selection_range: selection,
                        children: Some(children),
                    });
                }
                SymbolHolder::Variable(variable) => {
                    symbols.push(DocumentSymbol {
                        name: name.clone(),
                        detail: Some(variable.ty.display()),
                        kind: if variable.is_instance_member {
                            SymbolKind::FIELD
                        } else {
                            SymbolKind::VARIABLE
                        },
                        tags: None,
                        deprecated: None,
                        range: selection,
                        selection_range: selection,
                        children: None,
                    });
                }
                SymbolHolder::Functions(functions) => {
                    for overload in &functions.overloads {
                        if &*overload.defined_in != record.uri.as_str() {
                            continue;
                        }
                        let range = overload
                            .node
                            .as_ref()
                            .map_or(selection, |node| span_to_range(&record.content, node.span()));
                        symbols.push(DocumentSymbol {
                            name: name.clone(),
                            detail: Some(overload.signature()),
                            kind: if overload.is_instance_member {
                                SymbolKind::METHOD
                            } else {
                                SymbolKind::FUNCTION
                            },
                            tags: None,
                            deprecated: None,
                            range,
                            selection_range: span_to_range(
                                &record.content,
                                overload.name.span(),
                            ),
                            children: None,
                        });
                    }
                }
            }
        }

        // nested namespaces
        for (name, child) in &scope.children {
            if child.is_pure_namespace() && !name.starts_with('~') && !child.symbols.is_empty() {
                let children = Self::document_symbols_in(record, global, &child.path);
                if children.is_empty() {
                    continue;
                }
                let range = child
                    .linked_node
                    .as_ref()
                    .map_or_else(Range::default, |node| {
                        span_to_range(&record.content, node.span())
                    });
                symbols.push(DocumentSymbol {
                    name: name.clone(),
                    detail: None,
                    kind: SymbolKind::NAMESPACE,
                    tags: None,
                    deprecated: None,
                    range,
                    selection_range: range,
                    children: Some(children),
                });
            }
        }

        symbols
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            match serde_json::from_value(options) {
                Ok(settings) => self.send_request(AnalysisRequest::SettingsChanged(settings)),
                Err(error) => tracing::warn!("invalid initialization options: {error}"),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), ":".to_string()]),
                    ..Default::default()
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                inlay_hint_provider: Some(OneOf::Left(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: SemanticTokensLegend {
                                token_types: TOKEN_TYPES.to_vec(),
                                token_modifiers: Vec::new(),
                            },
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            work_done_progress_options: Default::default(),
                        },
                    ),
                ),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "AngelScript language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match serde_json::from_value(params.settings) {
            Ok(settings) => self.send_request(AnalysisRequest::SettingsChanged(settings)),
            Err(error) => tracing::warn!("invalid configuration: {error}"),
        }
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("did_open {uri}");
        self.open_documents
            .insert(uri.clone(), params.text_document.version);
        self.client
            .send_notification::<ServerStatusNotification>(ServerStatusParams {
                status: ServerStatus::AnalysisStarted,
            })
            .await;
        self.send_request(AnalysisRequest::DocumentOpened {
            uri,
            content: params.text_document.text,
            version: Some(params.text_document.version),
        });
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Some(change) = params.content_changes.into_iter().next() {
            self.open_documents.insert(uri.clone(), version);
            self.client
                .send_notification::<ServerStatusNotification>(ServerStatusParams {
                    status: ServerStatus::AnalysisStarted,
                })
                .await;
            self.send_request(AnalysisRequest::DocumentChanged {
                uri,
                content: change.text,
                version: Some(version),
            });
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.open_documents.remove(&uri);
        self.send_request(AnalysisRequest::DocumentClosed { uri });
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);
        let Some(target) = Self::reference_at(&record, offset) else {
            return Ok(None);
        };
        let workspace = self.workspace.lock().unwrap();
        Ok(Self::location_of(&workspace, &target).map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);
        let Some(target) = Self::reference_at(&record, offset) else {
            return Ok(None);
        };
        let workspace = self.workspace.lock().unwrap();
        Ok(Some(Self::collect_references(&workspace, &target)))
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);
        let Some(target) = Self::reference_at(&record, offset) else {
            return Ok(None);
        };
        let Some(scope) = &record.analyzer_scope else {
            return Ok(None);
        };
        let highlights = scope
            .references
            .iter()
            .filter(|reference| reference.target.same_symbol(&target))
            .map(|reference| DocumentHighlight {
                range: span_to_range(&record.content, reference.from_span),
                kind: Some(DocumentHighlightKind::TEXT),
            })
            .collect();
        Ok(Some(highlights))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);
        let Some(target) = Self::reference_at(&record, offset) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().unwrap();
        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        for location in Self::collect_references(&workspace, &target) {
            changes.entry(location.uri).or_default().push(TextEdit {
                range: location.range,
                new_text: params.new_name.clone(),
            });
        }
        if changes.is_empty() {
            return Ok(None);
        }
        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);
        let Some(target) = Self::reference_at(&record, offset) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().unwrap();
        let Some(text) = Self::describe_symbol(&workspace, &target) else {
            return Ok(None);
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```angelscript\n{text}\n```"),
            }),
            range: None,
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = record.analyzer_scope.clone() else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);

        let workspace = self.workspace.lock().unwrap();
        let mut items = Vec::new();
        let mut seen = std::collections::HashSet::new();

        // completion after a member-access dot
        let member_hint = global.hints.iter().find_map(|hint| match hint {
            ComplementHint::AutocompleteInstanceMember {
                caret_range,
                target_type,
            } if span_contains(*caret_range, offset) => Some(target_type.clone()),
            _ => None,
        });
        if let Some(target_type) = member_hint {
            if let Some(symbol) = target_type.type_symbol() {
                Self::collect_instance_members(&workspace, symbol, &mut items, &mut seen, 0);
            }
            return Ok(Some(CompletionResponse::Array(items)));
        }

        // completion after `::`
        let namespace_hint = global.hints.iter().find_map(|hint| match hint {
            ComplementHint::AutocompleteNamespaceAccess {
                caret_range,
                access_scope,
            } if span_contains(*caret_range, offset) => Some(access_scope.clone()),
            _ => None,
        });
        if let Some(access_scope) = namespace_hint {
            // the accessed path may exist in this file and in includes
            if let Some(scope) = global.resolve_scope(&access_scope) {
                Self::collect_scope_symbols(scope, &mut items, &mut seen);
            }
            for include in &record.include_uris {
                if let Some(include_scope) = workspace
                    .record(include)
                    .and_then(|r| r.analyzer_scope.as_ref())
                    .and_then(|g| g.resolve_scope(&access_scope))
                {
                    Self::collect_scope_symbols(include_scope, &mut items, &mut seen);
                }
            }
            return Ok(Some(CompletionResponse::Array(items)));
        }

        // plain identifier completion: the enclosing scope chain, then
        // include roots, then keywords
        let mut cursor = Some(Self::scope_at_offset(&global, offset));
        while let Some(path) = cursor {
            if let Some(scope) = global.resolve_scope(&path) {
                Self::collect_scope_symbols(scope, &mut items, &mut seen);
            }
            cursor = path.parent();
        }
        for include in &record.include_uris {
            if let Some(include_scope) = workspace
                .record(include)
                .and_then(|r| r.analyzer_scope.as_ref())
            {
                Self::collect_scope_symbols(&include_scope.root, &mut items, &mut seen);
            }
        }
        for keyword in [
            "class", "interface", "enum", "namespace", "typedef", "funcdef", "mixin", "private",
            "protected", "const", "if", "else", "while", "do", "for", "switch", "case", "default",
            "break", "continue", "return", "true", "false", "null", "this", "cast", "void", "int",
            "uint", "float", "double", "bool", "auto",
        ] {
            items.push(CompletionItem {
                label: keyword.to_string(),
                kind: Some(CompletionItemKind::KEYWORD),
                ..Default::default()
            });
        }

        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = &record.analyzer_scope else {
            return Ok(None);
        };
        let offset = position_to_offset(&record.content, position);

        let hint = global.hints.iter().find_map(|hint| match hint {
            ComplementHint::FunctionCall {
                arg_spans,
                args_range,
                callee,
                ..
            } if span_contains(*args_range, offset) => Some((arg_spans.clone(), callee.clone())),
            _ => None,
        });
        let Some((arg_spans, callee)) = hint else {
            return Ok(None);
        };

        let active_argument = arg_spans
            .iter()
            .filter(|span| span.end < offset)
            .count() as u32;

        let signatures: Vec<SignatureInformation> = callee
            .overloads
            .iter()
            .map(|overload| {
                let parameters = overload
                    .parameter_label_offsets()
                    .into_iter()
                    .map(|(start, end)| ParameterInformation {
                        label: ParameterLabel::LabelOffsets([start, end]),
                        documentation: None,
                    })
                    .collect();
                let parameter_count = overload.params.len() as u32;
                SignatureInformation {
                    label: overload.signature(),
                    documentation: None,
                    parameters: Some(parameters),
                    // saturate at the last parameter
                    active_parameter: Some(active_argument.min(parameter_count.saturating_sub(1))),
                }
            })
            .collect();

        if signatures.is_empty() {
            return Ok(None);
        }
        Ok(Some(SignatureHelp {
            signatures,
            active_signature: Some(0),
            active_parameter: Some(active_argument),
        }))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = record.analyzer_scope.clone() else {
            return Ok(None);
        };
        let symbols = Self::document_symbols_in(&record, &global, &ScopePath::global());
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    #[allow(deprecated)]
    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        if let Some(resolver) = &self.resolver {
            resolver.flush(None).await;
        }
        let query = params.query.to_lowercase();
        let workspace = self.workspace.lock().unwrap();

        let mut results = Vec::new();
        for record in workspace.records() {
            let Some(global) = &record.analyzer_scope else {
                continue;
            };
            let mut seen = std::collections::HashSet::new();
            for reference in &global.references {
                let target = &reference.target;
                if &*target.uri != record.uri.as_str() {
                    continue;
                }
                if target.name_span != reference.from_span {
                    continue; // declarations reference themselves
                }
                if !query.is_empty() && !target.name.to_lowercase().contains(&query) {
                    continue;
                }
                if !seen.insert((target.scope.clone(), target.name.clone())) {
                    continue;
                }
                let kind = match target.kind {
                    ReferencedKind::Class => SymbolKind::CLASS,
                    ReferencedKind::Interface => SymbolKind::INTERFACE,
                    ReferencedKind::Enum => SymbolKind::ENUM,
                    ReferencedKind::Typedef | ReferencedKind::Primitive => {
                        SymbolKind::TYPE_PARAMETER
                    }
                    ReferencedKind::TemplateParameter => SymbolKind::TYPE_PARAMETER,
                    ReferencedKind::Namespace => SymbolKind::NAMESPACE,
                    ReferencedKind::Variable => SymbolKind::VARIABLE,
                    ReferencedKind::Function => SymbolKind::FUNCTION,
                };
                results.push(SymbolInformation {
                    name: target.name.clone(),
                    kind,
                    tags: None,
                    deprecated: None,
                    location: Location {
                        uri: record.uri.clone(),
                        range: span_to_range(&record.content, target.name_span),
                    },
                    container_name: Some(target.scope.to_string()),
                });
            }
        }
        Ok(Some(results))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = &record.analyzer_scope else {
            return Ok(None);
        };

        let mut spans: Vec<(u32, u32, u32, u32)> = global
            .references
            .iter()
            .filter(|reference| reference.from_span.start < reference.from_span.end)
            .map(|reference| {
                let position = offset_to_position(&record.content, reference.from_span.start);
                (
                    position.line,
                    position.character,
                    (reference.from_span.end - reference.from_span.start) as u32,
                    token_type_index(reference.target.kind),
                )
            })
            .collect();
        spans.sort_unstable();
        spans.dedup_by_key(|(line, character, ..)| (*line, *character));

        let mut data = Vec::with_capacity(spans.len());
        let mut previous_line = 0;
        let mut previous_start = 0;
        for (line, start, length, token_type) in spans {
            let delta_line = line - previous_line;
            let delta_start = if delta_line == 0 {
                start - previous_start
            } else {
                start
            };
            data.push(SemanticToken {
                delta_line,
                delta_start,
                length,
                token_type,
                token_modifiers_bitset: 0,
            });
            previous_line = line;
            previous_start = start;
        }

        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let uri = params.text_document.uri;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = &record.analyzer_scope else {
            return Ok(None);
        };

        let ranges = global
            .scope_regions()
            .map(|(_, span)| {
                let range = span_to_range(&record.content, span);
                FoldingRange {
                    start_line: range.start.line,
                    start_character: Some(range.start.character),
                    end_line: range.end.line,
                    end_character: Some(range.end.character),
                    kind: Some(FoldingRangeKind::Region),
                    collapsed_text: None,
                }
            })
            .filter(|range| range.end_line > range.start_line)
            .collect();
        Ok(Some(ranges))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let uri = params.text_document.uri;
        let Some(record) = self.fresh_record(&uri).await else {
            return Ok(None);
        };
        let Some(global) = &record.analyzer_scope else {
            return Ok(None);
        };
        let start = position_to_offset(&record.content, params.range.start);
        let end = position_to_offset(&record.content, params.range.end);

        let hints = global
            .hints
            .iter()
            .filter_map(|hint| match hint {
                ComplementHint::AutoTypeResolution {
                    auto_span,
                    resolved,
                } if start <= auto_span.start && auto_span.end <= end => Some(InlayHint {
                    position: offset_to_position(&record.content, auto_span.end),
                    label: InlayHintLabel::String(format!(": {}", resolved.display())),
                    kind: Some(InlayHintKind::TYPE),
                    text_edits: None,
                    tooltip: None,
                    padding_left: Some(false),
                    padding_right: Some(true),
                    data: None,
                }),
                _ => None,
            })
            .collect();
        Ok(Some(hints))
    }
}
