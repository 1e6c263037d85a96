//! # Analysis Resolver
//!
//! The workspace scheduler: a single background task owning three
//! priority tiers of pending re-analysis — *direct* (the file just
//! edited), *indirect* (open dependents) and *lazy-indirect* (closed
//! dependents) — woken by one delayed timer whose delay always matches
//! the highest non-empty tier. `flush` drains the direct tier and
//! promotes the requested file so LSP requests observe fresh state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use angelscript_diagnostics::{Diagnostic as CoreDiagnostic, DiagnosticSeverity as CoreSeverity};
use angelscript_semantic::AnalyzerSettings;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc::{error::SendError, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Url};
use tracing::{debug, info};

use super::record::{AnalyzedFile, Workspace};
use crate::utils::span_to_range;

/// Wait before analyzing the file just edited.
pub const DIRECT_DELAY: Duration = Duration::from_millis(10);
/// Wait before re-analyzing open dependents.
pub const INDIRECT_DELAY: Duration = Duration::from_millis(100);
/// Wait before re-analyzing closed dependents.
pub const LAZY_INDIRECT_DELAY: Duration = Duration::from_millis(500);

/// Requests handled by the resolver task.
#[derive(Debug)]
pub enum AnalysisRequest {
    DocumentOpened {
        uri: Url,
        content: String,
        version: Option<i32>,
    },
    DocumentChanged {
        uri: Url,
        content: String,
        version: Option<i32>,
    },
    DocumentClosed {
        uri: Url,
    },
    SettingsChanged(AnalyzerSettings),
    /// Drain the direct tier (and the given URI, wherever it is queued),
    /// then acknowledge.
    Flush {
        uri: Option<Url>,
        ack: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Diagnostics for one file, converted to LSP form, published atomically.
#[derive(Debug)]
pub struct AnalysisResponse {
    pub uri: Url,
    pub version: Option<i32>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Handle to the background resolver task.
pub struct AnalysisResolver {
    pub sender: UnboundedSender<AnalysisRequest>,
    handle: Option<JoinHandle<()>>,
}

struct ResolverState {
    workspace: Arc<Mutex<Workspace>>,
    response_sender: UnboundedSender<AnalysisResponse>,
    direct: VecDeque<(Url, u64)>,
    indirect: VecDeque<(Url, u64)>,
    lazy_indirect: VecDeque<(Url, u64)>,
    /// Edit generation; dependency propagation stops at files already
    /// analyzed in the current generation, which keeps include cycles
    /// from ping-ponging forever.
    generation: u64,
    analyzed_in: FxHashMap<Url, u64>,
}

impl AnalysisResolver {
    pub fn new(
        workspace: Arc<Mutex<Workspace>>,
        response_sender: UnboundedSender<AnalysisResponse>,
    ) -> Self {
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            info!("analysis resolver task started");
            let mut state = ResolverState {
                workspace,
                response_sender,
                direct: VecDeque::new(),
                indirect: VecDeque::new(),
                lazy_indirect: VecDeque::new(),
                generation: 0,
                analyzed_in: FxHashMap::default(),
            };

            loop {
                let delay = if !state.direct.is_empty() {
                    Some(DIRECT_DELAY)
                } else if !state.indirect.is_empty() {
                    Some(INDIRECT_DELAY)
                } else if !state.lazy_indirect.is_empty() {
                    Some(LAZY_INDIRECT_DELAY)
                } else {
                    None
                };

                tokio::select! {
                    request = receiver.recv() => {
                        match request {
                            None | Some(AnalysisRequest::Shutdown) => break,
                            Some(request) => state.handle_request(request),
                        }
                    }
                    () = async { sleep(delay.unwrap_or_default()).await }, if delay.is_some() => {
                        state.pop_and_analyze();
                    }
                }
            }
            info!("analysis resolver task stopped");
        });

        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Send a request to the resolver task.
    pub fn request(&self, request: AnalysisRequest) -> Result<(), SendError<AnalysisRequest>> {
        self.sender.send(request)
    }

    /// Wait until the resolver has drained the direct tier (and the given
    /// URI, if it was pending anywhere).
    pub async fn flush(&self, uri: Option<Url>) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(AnalysisRequest::Flush { uri, ack }).is_ok() {
            let _ = done.await;
        }
    }
}

impl Drop for AnalysisResolver {
    fn drop(&mut self) {
        let _ = self.sender.send(AnalysisRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl ResolverState {
    fn handle_request(&mut self, request: AnalysisRequest) {
        match request {
            AnalysisRequest::DocumentOpened {
                uri,
                content,
                version,
            } => {
                self.generation += 1;
                let discovered = {
                    let mut workspace = self.workspace.lock().unwrap();
                    workspace.open_document(uri.clone(), content, version)
                };
                self.enqueue_direct(uri);
                for script in discovered {
                    self.enqueue_lazy(script);
                }
            }
            AnalysisRequest::DocumentChanged {
                uri,
                content,
                version,
            } => {
                self.generation += 1;
                {
                    let mut workspace = self.workspace.lock().unwrap();
                    workspace.change_document(uri.clone(), content, version);
                }
                self.enqueue_direct(uri);
            }
            AnalysisRequest::DocumentClosed { uri } => {
                let mut workspace = self.workspace.lock().unwrap();
                workspace.close_document(&uri);
            }
            AnalysisRequest::SettingsChanged(settings) => {
                self.generation += 1;
                let open_files: Vec<Url> = {
                    let mut workspace = self.workspace.lock().unwrap();
                    workspace.set_settings(settings);
                    workspace
                        .records()
                        .filter(|record| record.is_open)
                        .map(|record| record.uri.clone())
                        .collect()
                };
                for uri in open_files {
                    self.enqueue_direct(uri);
                }
            }
            AnalysisRequest::Flush { uri, ack } => {
                while let Some((pending, generation)) = self.direct.pop_front() {
                    self.analyze_one(pending, generation);
                }
                if let Some(uri) = uri {
                    let promoted = Self::remove_queued(&mut self.indirect, &uri)
                        .or_else(|| Self::remove_queued(&mut self.lazy_indirect, &uri));
                    let generation = promoted.unwrap_or(self.generation);
                    self.analyze_one(uri, generation);
                }
                let _ = ack.send(());
            }
            AnalysisRequest::Shutdown => {}
        }
    }

    fn remove_queued(queue: &mut VecDeque<(Url, u64)>, uri: &Url) -> Option<u64> {
        let position = queue.iter().position(|(queued, _)| queued == uri)?;
        queue.remove(position).map(|(_, generation)| generation)
    }

    fn enqueue(queue: &mut VecDeque<(Url, u64)>, uri: Url, generation: u64) {
        if let Some(existing) = queue.iter_mut().find(|(queued, _)| *queued == uri) {
            existing.1 = existing.1.max(generation);
        } else {
            queue.push_back((uri, generation));
        }
    }

    fn enqueue_direct(&mut self, uri: Url) {
        Self::remove_queued(&mut self.indirect, &uri);
        Self::remove_queued(&mut self.lazy_indirect, &uri);
        Self::enqueue(&mut self.direct, uri, self.generation);
    }

    fn enqueue_indirect(&mut self, uri: Url, generation: u64) {
        if self.direct.iter().any(|(queued, _)| *queued == uri) {
            return;
        }
        Self::remove_queued(&mut self.lazy_indirect, &uri);
        Self::enqueue(&mut self.indirect, uri, generation);
    }

    fn enqueue_lazy(&mut self, uri: Url) {
        let generation = self.generation;
        if self
            .direct
            .iter()
            .chain(self.indirect.iter())
            .any(|(queued, _)| *queued == uri)
        {
            return;
        }
        Self::enqueue(&mut self.lazy_indirect, uri, generation);
    }

    /// Process exactly one queued item, highest tier first.
    fn pop_and_analyze(&mut self) {
        let next = self
            .direct
            .pop_front()
            .or_else(|| self.indirect.pop_front())
            .or_else(|| self.lazy_indirect.pop_front());
        if let Some((uri, generation)) = next {
            self.analyze_one(uri, generation);
        }
    }

    fn analyze_one(&mut self, uri: Url, generation: u64) {
        debug!("analyzing {uri} (generation {generation})");
        let (analyzed, dependents, suppress) = {
            let mut workspace = self.workspace.lock().unwrap();
            let analyzed = workspace.analyze(&uri);
            let dependents = workspace.dependents_of(&uri);
            let suppress = workspace.settings().suppress_analyzer_errors;
            (analyzed, dependents, suppress)
        };
        let Some(analyzed) = analyzed else {
            // the record was evicted while this entry was queued
            return;
        };
        self.analyzed_in.insert(uri, generation);

        let response = convert_analyzed_file(&analyzed, suppress);
        let _ = self.response_sender.send(response);

        for (dependent, is_open) in dependents {
            if self
                .analyzed_in
                .get(&dependent)
                .is_some_and(|last| *last >= generation)
            {
                continue;
            }
            if is_open {
                self.enqueue_indirect(dependent, generation);
            } else {
                Self::enqueue(&mut self.lazy_indirect, dependent, generation);
            }
        }
    }
}

/// Build the atomic publish payload: parser diagnostics as-is, analyzer
/// diagnostics demoted to warnings when `suppressAnalyzerErrors` is on.
pub fn convert_analyzed_file(analyzed: &AnalyzedFile, suppress_errors: bool) -> AnalysisResponse {
    let mut diagnostics = Vec::new();
    for diagnostic in analyzed.parser_diagnostics.iter() {
        diagnostics.push(convert_diagnostic(&analyzed.content, diagnostic, false));
    }
    for diagnostic in analyzed.analyzer_diagnostics.iter() {
        diagnostics.push(convert_diagnostic(&analyzed.content, diagnostic, suppress_errors));
    }
    AnalysisResponse {
        uri: analyzed.uri.clone(),
        version: analyzed.version,
        diagnostics,
    }
}

/// Convert a core diagnostic to LSP form.
pub fn convert_diagnostic(
    source: &str,
    diagnostic: &CoreDiagnostic,
    suppress_errors: bool,
) -> Diagnostic {
    let severity = match diagnostic.severity {
        CoreSeverity::Error if suppress_errors => DiagnosticSeverity::WARNING,
        CoreSeverity::Error => DiagnosticSeverity::ERROR,
        CoreSeverity::Warning => DiagnosticSeverity::WARNING,
        CoreSeverity::Info => DiagnosticSeverity::INFORMATION,
        CoreSeverity::Hint => DiagnosticSeverity::HINT,
    };

    Diagnostic {
        range: span_to_range(source, diagnostic.span),
        severity: Some(severity),
        code: Some(NumberOrString::Number(u32::from(diagnostic.code) as i32)),
        code_description: None,
        source: Some("angelscript".to_string()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}
