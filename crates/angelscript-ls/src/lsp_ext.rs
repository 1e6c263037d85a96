//! Protocol extensions beyond the LSP standard.

use lsp_types::notification::Notification;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ServerStatus {
    AnalysisStarted,
    AnalysisFinished,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusParams {
    pub status: ServerStatus,
}

pub enum ServerStatusNotification {}

impl Notification for ServerStatusNotification {
    type Params = ServerStatusParams;
    const METHOD: &'static str = "angelScript/serverStatus";
}
