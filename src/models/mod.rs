pub mod mark;
pub mod popup;
pub mod record;
pub mod settings;

pub use mark::{BorderColor, Mark};
pub use popup::{PopupKind, PopupNotification};
pub use record::{LedgerRecord, Outcome, Position, RecordPatch, RecordStatus};
pub use settings::{CounterKind, Counters, LedgerSettings, SettingsChange};
