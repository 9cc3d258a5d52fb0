use serde::Serialize;

use crate::ledger::relative_time;
use crate::models::{
    BorderColor, Counters, LedgerRecord, LedgerSettings, Mark, PopupNotification,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    #[serde(flatten)]
    pub record: LedgerRecord,
    pub relative_time: String,
}

impl RecordView {
    pub fn new(record: &LedgerRecord, now_ms: i64) -> Self {
        Self {
            record: record.clone(),
            relative_time: relative_time(Some(record.created_at_ms), now_ms),
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub uploaded_image: Option<String>,
    pub marks: Vec<Mark>,
    pub mark_size: f64,
    pub mark_color: BorderColor,
    pub ledger_enabled: bool,
    pub pending: Vec<RecordView>,
    /// Most recent confirmed records, cut to `recordDisplaySize`.
    pub confirmed: Vec<RecordView>,
    pub confirmed_total: usize,
    pub suggested_names: Vec<String>,
    pub current_popup: Option<PopupNotification>,
    pub flashing: bool,
    pub counters: Counters,
    pub settings: LedgerSettings,
    pub controls_visible: bool,
    pub show_add_record: bool,
    pub show_ledger: bool,
    pub can_undo_mark: bool,
}
