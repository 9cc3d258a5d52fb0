use serde::{Deserialize, Serialize};

use super::LedgerRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PopupKind {
    /// Asks whether a freshly staged record was a hit or a miss.
    Question,
    /// Confirms an outcome that was just recorded.
    Result,
}

/// Transient popup. `record` is a copy taken at enqueue time and may be stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopupNotification {
    pub id: u64,
    pub record: LedgerRecord,
    pub kind: PopupKind,
}
