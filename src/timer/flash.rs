use serde::{Deserialize, Serialize};

use crate::models::LedgerSettings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlashStatus {
    Idle,
    Flashing,
}

impl Default for FlashStatus {
    fn default() -> Self {
        FlashStatus::Idle
    }
}

/// Cycle timing for an active scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashTiming {
    pub frequency_ms: i64,
    pub duration_ms: i64,
}

impl FlashTiming {
    /// Timing to run with, or `None` when flashing should be off.
    pub fn for_ledger(
        settings: &LedgerSettings,
        ledger_enabled: bool,
        record_count: usize,
    ) -> Option<Self> {
        if !(ledger_enabled && record_count > 0 && settings.flashing_enabled) {
            return None;
        }
        Some(Self {
            frequency_ms: i64::from(settings.flash_frequency_sec) * 1000,
            duration_ms: i64::from(settings.flash_duration_sec) * 1000,
        })
    }
}

/// Periodic on/off pulse.
///
/// A cycle starts flashing immediately, goes idle after `duration_ms`, and the
/// next cycle begins `frequency_ms` after the previous cycle start. Every new
/// cycle replaces the pending end-of-flash deadline, so there is never more
/// than one of each deadline outstanding.
#[derive(Debug, Clone, Default)]
pub struct FlashScheduler {
    status: FlashStatus,
    timing: Option<FlashTiming>,
    flash_ends_at: Option<i64>,
    next_cycle_at: Option<i64>,
}

impl FlashScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> FlashStatus {
        self.status
    }

    pub fn is_flashing(&self) -> bool {
        self.status == FlashStatus::Flashing
    }

    /// Applies new timing. Identical timing keeps the running cycle; anything
    /// else tears it down and, if still active, restarts from `now_ms`.
    /// Returns true when the visible status changed.
    pub fn reconfigure(&mut self, timing: Option<FlashTiming>, now_ms: i64) -> bool {
        if self.timing == timing {
            return false;
        }

        let before = self.status;
        self.teardown();
        self.timing = timing;
        if let Some(timing) = timing {
            self.begin_cycle(now_ms, timing);
        }
        self.status != before
    }

    /// Fires every deadline at or before `now_ms` in order. When both fall on
    /// the same instant the flash ends before the next one begins.
    pub fn tick(&mut self, now_ms: i64) -> bool {
        let Some(timing) = self.timing else {
            return false;
        };

        let before = self.status;
        loop {
            let ends = self.flash_ends_at.filter(|at| *at <= now_ms);
            let cycle = self.next_cycle_at.filter(|at| *at <= now_ms);
            match (ends, cycle) {
                (Some(end), Some(start)) if end <= start => self.end_flash(),
                (Some(_), None) => self.end_flash(),
                (_, Some(start)) => self.begin_cycle(start, timing),
                (None, None) => break,
            }
        }
        self.status != before
    }

    /// Cancels every deadline and forces `Idle`. Safe to call repeatedly.
    pub fn teardown(&mut self) -> bool {
        let before = self.status;
        self.status = FlashStatus::Idle;
        self.timing = None;
        self.flash_ends_at = None;
        self.next_cycle_at = None;
        before != FlashStatus::Idle
    }

    pub fn next_deadline(&self) -> Option<i64> {
        match (self.flash_ends_at, self.next_cycle_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn begin_cycle(&mut self, start_ms: i64, timing: FlashTiming) {
        self.status = FlashStatus::Flashing;
        self.flash_ends_at = Some(start_ms.saturating_add(timing.duration_ms));
        self.next_cycle_at = Some(start_ms.saturating_add(timing.frequency_ms.max(1)));
    }

    fn end_flash(&mut self) {
        self.status = FlashStatus::Idle;
        self.flash_ends_at = None;
    }
}
