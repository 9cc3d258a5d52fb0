use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::EngineConfig;
use crate::ledger::LedgerEngine;
use crate::marks::{ImageRect, MarkStore};
use crate::models::{
    BorderColor, CounterKind, Counters, LedgerRecord, LedgerSettings, Mark, Outcome, PopupKind,
    Position, RecordPatch, SettingsChange,
};
use crate::notifications::NotificationQueue;
use crate::persistence::PersistedSnapshot;
use crate::timer::{FlashScheduler, FlashTiming, InactivityTracker};

use super::event::{Change, SessionEvent};
use super::view::{RecordView, ViewState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// The whole view-state tree. Every mutation goes through a named operation so
/// the ledger and timer invariants are enforced in one place.
///
/// Operations take the current time explicitly; nothing here reads a clock.
#[derive(Debug, Clone)]
pub struct Session {
    config: EngineConfig,
    image: Option<String>,
    marks: MarkStore,
    ledger: LedgerEngine,
    notifications: NotificationQueue,
    flash: FlashScheduler,
    inactivity: InactivityTracker,
    settings: LedgerSettings,
    counters: Counters,
    ledger_enabled: bool,
    show_add_record: bool,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            image: None,
            marks: MarkStore::new(config.mark_pixels_per_unit),
            ledger: LedgerEngine::new(config.confirmed_cap, config.suggestion_limit),
            notifications: NotificationQueue::new(config.popup_timeout_ms()),
            flash: FlashScheduler::new(),
            inactivity: InactivityTracker::new(config.inactivity_timeout_ms()),
            settings: LedgerSettings::default(),
            counters: Counters::default(),
            ledger_enabled: false,
            show_add_record: false,
            config,
        }
    }

    /// Rebuilds a session from a stored snapshot, repairing out-of-range values.
    pub fn from_snapshot(config: EngineConfig, snapshot: PersistedSnapshot, now_ms: i64) -> Self {
        let mut session = Self::new(config);
        session.image = snapshot.uploaded_image.filter(|image| !image.is_empty());
        let marks = if session.image.is_some() {
            snapshot.marks
        } else {
            Vec::new()
        };
        session.marks.restore(marks, snapshot.mark_size);
        session
            .ledger
            .restore(snapshot.pending_records, snapshot.ledger_records);
        session.settings = snapshot.ledger_settings.clamped();
        session.counters = Counters {
            primary: snapshot.chases_count,
            secondary: snapshot.bags_count,
        };
        session.ledger_enabled = snapshot.ledger_enabled;
        if session.image.is_some() {
            session.inactivity.arm(now_ms);
        }
        session.sync(now_ms);

        log_info!(
            "Restored session: {} marks, {} pending, {} confirmed",
            session.marks.len(),
            session.ledger.pending().len(),
            session.ledger.confirmed().len()
        );
        session
    }

    pub fn dispatch(&mut self, event: SessionEvent, now_ms: i64) -> Change {
        match event {
            SessionEvent::ImageSelected { bytes } => {
                Change::durable_if(self.select_image(&bytes, now_ms))
            }
            SessionEvent::ImageRemoved => Change::durable_if(self.remove_image()),
            SessionEvent::ImageClicked {
                pointer_x,
                pointer_y,
                image_rect,
            } => {
                let shown = self.record_input(now_ms);
                if self
                    .place_mark(pointer_x, pointer_y, image_rect, now_ms)
                    .is_some()
                {
                    Change::Durable
                } else {
                    Change::view_if(shown)
                }
            }
            SessionEvent::MarkUndone => Change::durable_if(self.undo_mark().is_some()),
            SessionEvent::MarkSizeChanged { size } => Change::durable_if(self.resize_marks(size)),
            SessionEvent::MarkColorChanged { color } => {
                Change::view_if(self.set_mark_color(color))
            }
            SessionEvent::InputActivity => Change::view_if(self.record_input(now_ms)),
            SessionEvent::LedgerToggled => {
                self.toggle_ledger(now_ms);
                Change::Durable
            }
            SessionEvent::AddRecordToggled => Change::view_if(self.toggle_add_record()),
            SessionEvent::RecordSubmitted {
                name,
                number,
                position,
            } => Change::durable_if(
                self.stage_record(&name, &number, position, now_ms)
                    .is_some(),
            ),
            SessionEvent::PopupResolved { popup_id, outcome } => {
                match self.resolve_popup(popup_id, outcome, now_ms) {
                    None => Change::None,
                    Some(None) => Change::View,
                    Some(Some(_)) => Change::Durable,
                }
            }
            SessionEvent::RecordResolved { record_id, outcome } => {
                Change::durable_if(self.resolve_record(record_id, outcome, now_ms).is_some())
            }
            SessionEvent::RecordEdited { record_id, patch } => {
                Change::durable_if(self.edit_record(record_id, &patch))
            }
            SessionEvent::RecordDeleted { record_id } => {
                Change::durable_if(self.delete_record(record_id, now_ms).is_some())
            }
            SessionEvent::OldestRecordRemoved => {
                Change::durable_if(self.remove_oldest_record(now_ms).is_some())
            }
            SessionEvent::SettingsChanged { change } => {
                Change::durable_if(self.change_setting(change, now_ms))
            }
            SessionEvent::CounterAdjusted { which, delta } => {
                Change::durable_if(self.adjust_counter(which, delta))
            }
            SessionEvent::ResetRequested => {
                self.reset();
                Change::Reset
            }
        }
    }

    // Image and marks

    /// Stores the encoded image and starts a fresh set of marks.
    pub fn select_image(&mut self, bytes: &[u8], now_ms: i64) -> bool {
        let Some(encoded) = encode_image(bytes) else {
            log_debug!("Ignoring empty image selection");
            return false;
        };
        self.image = Some(encoded);
        self.marks.clear();
        self.inactivity.arm(now_ms);
        true
    }

    pub fn remove_image(&mut self) -> bool {
        if self.image.take().is_none() {
            return false;
        }
        self.marks.clear();
        self.inactivity.teardown();
        true
    }

    pub fn place_mark(
        &mut self,
        pointer_x: f64,
        pointer_y: f64,
        image_rect: Option<ImageRect>,
        now_ms: i64,
    ) -> Option<Mark> {
        if self.image.is_none() {
            return None;
        }
        let mark = self.marks.place_mark(pointer_x, pointer_y, image_rect, now_ms);
        if mark.is_none() {
            log_debug!("Click ignored: no usable image bounds");
        }
        mark
    }

    pub fn undo_mark(&mut self) -> Option<Mark> {
        self.marks.undo_last()
    }

    pub fn resize_marks(&mut self, size: f64) -> bool {
        let before = self.marks.mark_size();
        self.marks.resize(size);
        before != self.marks.mark_size()
    }

    pub fn set_mark_color(&mut self, color: BorderColor) -> bool {
        let changed = self.marks.border_color() != color;
        self.marks.set_border_color(color);
        changed
    }

    /// Pointer activity over the image. Returns true when hidden controls
    /// reappear.
    pub fn record_input(&mut self, now_ms: i64) -> bool {
        self.inactivity.record_input(now_ms)
    }

    // Ledger

    pub fn toggle_ledger(&mut self, now_ms: i64) {
        self.ledger_enabled = !self.ledger_enabled;
        if !self.ledger_enabled {
            self.show_add_record = false;
        }
        self.sync(now_ms);
    }

    pub fn toggle_add_record(&mut self) -> bool {
        if !self.ledger_enabled {
            return false;
        }
        self.show_add_record = !self.show_add_record;
        true
    }

    /// Stages a pending record and asks about it with a question popup.
    pub fn stage_record(
        &mut self,
        name: &str,
        number: &str,
        position: Position,
        now_ms: i64,
    ) -> Option<LedgerRecord> {
        let record = self.ledger.stage_record(name, number, position, now_ms)?;
        self.notifications
            .enqueue(record.clone(), PopupKind::Question);
        self.show_add_record = false;
        self.sync(now_ms);
        Some(record)
    }

    /// Closes the current popup. Returns `None` if `popup_id` was not current,
    /// otherwise the record confirmed by the answer (if any).
    pub fn resolve_popup(
        &mut self,
        popup_id: u64,
        outcome: Option<Outcome>,
        now_ms: i64,
    ) -> Option<Option<LedgerRecord>> {
        let dismissal = self.notifications.dismiss(popup_id, outcome)?;
        let resolved = dismissal
            .resolution
            .and_then(|outcome| self.resolve_record(dismissal.popup.record.id, outcome, now_ms));
        self.sync(now_ms);
        Some(resolved)
    }

    /// Confirms a pending record and queues a result popup for it.
    pub fn resolve_record(
        &mut self,
        record_id: i64,
        outcome: Outcome,
        now_ms: i64,
    ) -> Option<LedgerRecord> {
        let record = self.ledger.resolve(record_id, outcome)?;
        self.notifications
            .enqueue(record.clone(), PopupKind::Result);
        self.sync(now_ms);
        Some(record)
    }

    pub fn edit_record(&mut self, record_id: i64, patch: &RecordPatch) -> bool {
        self.ledger.edit_confirmed(record_id, patch)
    }

    pub fn delete_record(&mut self, record_id: i64, now_ms: i64) -> Option<LedgerRecord> {
        let removed = self.ledger.delete_confirmed(record_id)?;
        self.sync(now_ms);
        Some(removed)
    }

    pub fn remove_oldest_record(&mut self, now_ms: i64) -> Option<LedgerRecord> {
        let removed = self.ledger.remove_oldest_confirmed()?;
        self.sync(now_ms);
        Some(removed)
    }

    // Settings and counters

    pub fn change_setting(&mut self, change: SettingsChange, now_ms: i64) -> bool {
        let before = self.settings;
        self.settings.apply(change);
        self.sync(now_ms);
        before != self.settings
    }

    pub fn adjust_counter(&mut self, which: CounterKind, delta: i64) -> bool {
        let before = self.counters;
        self.counters.adjust(which, delta);
        before != self.counters
    }

    /// Returns every field to its default and tears down all timers.
    pub fn reset(&mut self) {
        self.flash.teardown();
        self.inactivity.teardown();
        self.notifications.clear();
        // The cleared queue keeps its id counter so a popup shown before the
        // reset can never match one raised after it.
        let notifications = self.notifications.clone();
        *self = Self::new(self.config.clone());
        self.notifications = notifications;
        log_info!("Session reset");
    }

    // Timers

    /// Fires every deadline that has passed. Returns true if the view changed.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        let mut changed = false;
        if let Some(expired) = self.notifications.tick(now_ms) {
            log_debug!("Popup {} auto-dismissed", expired.popup.id);
            changed = true;
        }
        changed |= self.notifications.promote(now_ms);
        changed |= self.flash.tick(now_ms);
        changed |= self.inactivity.tick(now_ms);
        changed
    }

    pub fn next_deadline(&self) -> Option<i64> {
        [
            self.notifications.next_deadline(),
            self.flash.next_deadline(),
            self.inactivity.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Re-derives the flash timing and promotes the next popup.
    fn sync(&mut self, now_ms: i64) {
        let timing = FlashTiming::for_ledger(
            &self.settings,
            self.ledger_enabled,
            self.ledger.confirmed().len(),
        );
        self.flash.reconfigure(timing, now_ms);
        self.notifications.promote(now_ms);
    }

    // Outbound

    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            uploaded_image: self.image.clone(),
            marks: self.marks.marks().to_vec(),
            mark_size: self.marks.mark_size(),
            ledger_enabled: self.ledger_enabled,
            ledger_records: self.ledger.confirmed().to_vec(),
            pending_records: self.ledger.pending().to_vec(),
            ledger_settings: self.settings,
            chases_count: self.counters.primary,
            bags_count: self.counters.secondary,
        }
    }

    pub fn view(&self, now_ms: i64) -> ViewState {
        let to_view = |record: &LedgerRecord| RecordView::new(record, now_ms);
        let display = self.settings.record_display_size as usize;

        ViewState {
            uploaded_image: self.image.clone(),
            marks: self.marks.marks().to_vec(),
            mark_size: self.marks.mark_size(),
            mark_color: self.marks.border_color(),
            ledger_enabled: self.ledger_enabled,
            pending: self.ledger.pending().iter().map(to_view).collect(),
            confirmed: self
                .ledger
                .confirmed()
                .iter()
                .take(display)
                .map(to_view)
                .collect(),
            confirmed_total: self.ledger.confirmed().len(),
            suggested_names: self.ledger.suggested_names(),
            current_popup: self.notifications.current().cloned(),
            flashing: self.flash.is_flashing(),
            counters: self.counters,
            settings: self.settings,
            controls_visible: self.image.is_some() && self.inactivity.is_visible(),
            show_add_record: self.ledger_enabled && self.show_add_record,
            show_ledger: self.ledger_enabled
                && !(self.ledger.pending().is_empty() && self.ledger.confirmed().is_empty()),
            can_undo_mark: !self.marks.is_empty(),
        }
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn marks(&self) -> &MarkStore {
        &self.marks
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn flash(&self) -> &FlashScheduler {
        &self.flash
    }

    pub fn inactivity(&self) -> &InactivityTracker {
        &self.inactivity
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

/// `data:` URL for the raw bytes, or `None` for an empty selection.
fn encode_image(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let mime = image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    Some(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordStatus;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn rect() -> Option<ImageRect> {
        Some(ImageRect {
            left: 0.0,
            top: 0.0,
            width: 640.0,
            height: 480.0,
        })
    }

    fn session_with_image() -> Session {
        let mut session = Session::new(EngineConfig::default());
        assert!(session.select_image(PNG_MAGIC, 0));
        session
    }

    #[test]
    fn image_is_stored_as_data_url() {
        let session = session_with_image();
        assert!(session.image().unwrap().starts_with("data:image/png;base64,"));
        assert!(session.view(0).controls_visible);
    }

    #[test]
    fn empty_image_selection_is_noop() {
        let mut session = Session::new(EngineConfig::default());
        assert_eq!(
            session.dispatch(SessionEvent::ImageSelected { bytes: Vec::new() }, 0),
            Change::None
        );
        assert!(session.image().is_none());
    }

    #[test]
    fn new_image_clears_marks() {
        let mut session = session_with_image();
        session.place_mark(100.0, 100.0, rect(), 1).unwrap();
        assert_eq!(session.marks().len(), 1);
        session.select_image(PNG_MAGIC, 2);
        assert!(session.marks().is_empty());
    }

    #[test]
    fn click_without_image_places_nothing() {
        let mut session = Session::new(EngineConfig::default());
        let change = session.dispatch(
            SessionEvent::ImageClicked {
                pointer_x: 10.0,
                pointer_y: 10.0,
                image_rect: rect(),
            },
            0,
        );
        assert_eq!(change, Change::None);
        assert!(session.marks().is_empty());
    }

    #[test]
    fn removing_image_tears_down_inactivity() {
        let mut session = session_with_image();
        assert!(session.remove_image());
        assert!(!session.inactivity().is_armed());
        assert_eq!(session.next_deadline(), None);
        assert!(!session.remove_image());
    }

    #[test]
    fn blank_submissions_enqueue_nothing() {
        let mut session = Session::new(EngineConfig::default());
        for (name, number) in [("", "5"), ("A", "")] {
            let change = session.dispatch(
                SessionEvent::RecordSubmitted {
                    name: name.into(),
                    number: number.into(),
                    position: Position::Middle,
                },
                0,
            );
            assert_eq!(change, Change::None);
        }
        assert!(session.ledger().pending().is_empty());
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn staged_record_raises_question_popup() {
        let mut session = Session::new(EngineConfig::default());
        let record = session
            .stage_record("Ann", "12", Position::Left, 1_000)
            .unwrap();
        let popup = session.view(1_000).current_popup.unwrap();
        assert_eq!(popup.kind, PopupKind::Question);
        assert_eq!(popup.record.id, record.id);
        assert_eq!(session.next_deadline(), Some(4_000));
    }

    #[test]
    fn answering_question_resolves_and_confirms() {
        let mut session = Session::new(EngineConfig::default());
        let first = session.stage_record("Ann", "12", Position::Left, 0).unwrap();
        let second = session.stage_record("Bo", "7", Position::Right, 10).unwrap();

        let popup_id = session.view(10).current_popup.unwrap().id;
        let resolved = session
            .resolve_popup(popup_id, Some(Outcome::Miss), 500)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, first.id);
        assert_eq!(resolved.status, RecordStatus::Miss);
        assert!(!session.ledger().is_pending(first.id));

        let current = session.view(500).current_popup.unwrap();
        assert_eq!(current.record.id, second.id);
        assert_eq!(current.kind, PopupKind::Question);
        assert_eq!(session.notifications().next_deadline(), Some(3_500));
    }

    #[test]
    fn expired_question_leaves_record_pending() {
        let mut session = Session::new(EngineConfig::default());
        let record = session.stage_record("Ann", "12", Position::Left, 0).unwrap();
        assert!(session.tick(3_000));
        assert!(session.view(3_000).current_popup.is_none());
        assert!(session.ledger().is_pending(record.id));
        assert!(session.ledger().confirmed().is_empty());
    }

    #[test]
    fn resolving_from_ledger_queues_result_popup() {
        let mut session = Session::new(EngineConfig::default());
        let record = session.stage_record("Ann", "12", Position::Left, 0).unwrap();
        session.resolve_record(record.id, Outcome::Hit, 100).unwrap();

        // The stale question is still current; answering it changes nothing.
        let question = session.view(100).current_popup.unwrap();
        assert_eq!(question.kind, PopupKind::Question);
        let answered = session
            .resolve_popup(question.id, Some(Outcome::Miss), 200)
            .unwrap();
        assert!(answered.is_none());
        assert_eq!(
            session.ledger().confirmed()[0].status,
            RecordStatus::Hit
        );

        let result = session.view(200).current_popup.unwrap();
        assert_eq!(result.kind, PopupKind::Result);
        assert_eq!(result.record.status, RecordStatus::Hit);
    }

    #[test]
    fn flashing_follows_ledger_state() {
        let mut session = Session::new(EngineConfig::default());
        session.toggle_ledger(0);
        let record = session.stage_record("Ann", "12", Position::Left, 0).unwrap();
        assert!(!session.flash().is_flashing());

        session.resolve_record(record.id, Outcome::Hit, 1_000).unwrap();
        assert!(session.flash().is_flashing());
        session.tick(6_000);
        assert!(!session.flash().is_flashing());

        session.change_setting(SettingsChange::FlashingEnabled(false), 7_000);
        assert!(!session.flash().is_flashing());
        assert_eq!(session.flash().next_deadline(), None);
        session.tick(11_000);
        assert!(!session.flash().is_flashing());

        session.change_setting(SettingsChange::FlashingEnabled(true), 12_000);
        assert!(session.flash().is_flashing());
        session.toggle_ledger(13_000);
        assert!(!session.flash().is_flashing());
    }

    #[test]
    fn view_truncates_confirmed_to_display_size() {
        let mut session = Session::new(EngineConfig::default());
        session.toggle_ledger(0);
        session.change_setting(SettingsChange::RecordDisplaySize(2), 0);
        for i in 0..4 {
            let record = session.stage_record("n", "1", Position::Middle, i).unwrap();
            session.resolve_record(record.id, Outcome::Hit, i).unwrap();
        }
        let view = session.view(10);
        assert_eq!(view.confirmed.len(), 2);
        assert_eq!(view.confirmed_total, 4);
        assert!(view.show_ledger);
    }

    #[test]
    fn snapshot_round_trips_into_session() {
        let mut session = session_with_image();
        session.place_mark(100.0, 100.0, rect(), 1).unwrap();
        session.toggle_ledger(0);
        let record = session.stage_record("Ann", "12", Position::Left, 2).unwrap();
        session.stage_record("Bo", "3", Position::Right, 3).unwrap();
        session.resolve_record(record.id, Outcome::Hit, 4).unwrap();
        session.adjust_counter(CounterKind::Primary, 2);

        let snapshot = session.snapshot();
        let restored = Session::from_snapshot(EngineConfig::default(), snapshot.clone(), 10);
        assert_eq!(restored.snapshot(), snapshot);
        assert!(restored.notifications().is_empty());
        assert!(restored.flash().is_flashing());
    }

    #[test]
    fn marks_without_image_are_dropped_on_restore() {
        let snapshot = PersistedSnapshot {
            marks: vec![Mark {
                id: 1,
                x_percent: 1.0,
                y_percent: 1.0,
                size_units: 4.0,
                border_color: BorderColor::Orange,
            }],
            mark_size: 99.0,
            ..PersistedSnapshot::default()
        };
        let restored = Session::from_snapshot(EngineConfig::default(), snapshot, 0);
        assert!(restored.marks().is_empty());
        assert_eq!(restored.marks().mark_size(), 17.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = session_with_image();
        session.toggle_ledger(0);
        session.stage_record("Ann", "12", Position::Left, 0).unwrap();
        session.adjust_counter(CounterKind::Secondary, 5);

        assert_eq!(session.dispatch(SessionEvent::ResetRequested, 1), Change::Reset);
        assert_eq!(session.snapshot(), PersistedSnapshot::default());
        assert_eq!(session.next_deadline(), None);
        assert!(session.view(1).current_popup.is_none());
    }

    #[test]
    fn popup_ids_stay_unique_across_reset() {
        let mut session = Session::new(EngineConfig::default());
        session.stage_record("Old", "1", Position::Left, 0).unwrap();
        let old_popup = session.view(0).current_popup.unwrap().id;

        session.reset();
        let fresh = session.stage_record("New", "2", Position::Right, 10).unwrap();
        let new_popup = session.view(10).current_popup.unwrap().id;
        assert_ne!(old_popup, new_popup);

        let change = session.dispatch(
            SessionEvent::PopupResolved {
                popup_id: old_popup,
                outcome: Some(Outcome::Hit),
            },
            20,
        );
        assert_eq!(change, Change::None);
        assert!(session.ledger().is_pending(fresh.id));
        assert!(session.ledger().confirmed().is_empty());
        assert_eq!(session.view(20).current_popup.unwrap().id, new_popup);
    }
}
