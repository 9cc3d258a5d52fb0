use serde::{Deserialize, Serialize};

use crate::marks::ImageRect;
use crate::models::{BorderColor, CounterKind, Outcome, Position, RecordPatch, SettingsChange};

/// Inbound events from the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    ImageSelected {
        bytes: Vec<u8>,
    },
    ImageRemoved,
    ImageClicked {
        pointer_x: f64,
        pointer_y: f64,
        image_rect: Option<ImageRect>,
    },
    MarkUndone,
    MarkSizeChanged {
        size: f64,
    },
    MarkColorChanged {
        color: BorderColor,
    },
    InputActivity,
    LedgerToggled,
    AddRecordToggled,
    RecordSubmitted {
        name: String,
        number: String,
        position: Position,
    },
    PopupResolved {
        popup_id: u64,
        outcome: Option<Outcome>,
    },
    RecordResolved {
        record_id: i64,
        outcome: Outcome,
    },
    RecordEdited {
        record_id: i64,
        patch: RecordPatch,
    },
    RecordDeleted {
        record_id: i64,
    },
    OldestRecordRemoved,
    SettingsChanged {
        change: SettingsChange,
    },
    CounterAdjusted {
        which: CounterKind,
        delta: i64,
    },
    ResetRequested,
}

/// What a dispatched event did, from the persistence point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Nothing happened (validation or missing target).
    None,
    /// Only transient view state moved.
    View,
    /// A persisted field changed; the snapshot must be rewritten.
    Durable,
    /// Everything was reset; the saved snapshot must be removed.
    Reset,
}

impl Change {
    pub fn durable_if(changed: bool) -> Self {
        if changed {
            Change::Durable
        } else {
            Change::None
        }
    }

    pub fn view_if(changed: bool) -> Self {
        if changed {
            Change::View
        } else {
            Change::None
        }
    }
}
