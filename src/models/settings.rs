use serde::{Deserialize, Serialize};

pub const FLASH_SECS_MIN: u32 = 5;
pub const FLASH_SECS_MAX: u32 = 30;
pub const DISPLAY_SIZE_MIN: u32 = 1;
pub const DISPLAY_SIZE_MAX: u32 = 9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    pub flash_frequency_sec: u32,
    pub flash_duration_sec: u32,
    pub flashing_enabled: bool,
    pub record_display_size: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            flash_frequency_sec: 10,
            flash_duration_sec: 5,
            flashing_enabled: true,
            record_display_size: 5,
        }
    }
}

impl LedgerSettings {
    /// Pulls every field back into its allowed range.
    pub fn clamped(self) -> Self {
        Self {
            flash_frequency_sec: self
                .flash_frequency_sec
                .clamp(FLASH_SECS_MIN, FLASH_SECS_MAX),
            flash_duration_sec: self
                .flash_duration_sec
                .clamp(FLASH_SECS_MIN, FLASH_SECS_MAX),
            flashing_enabled: self.flashing_enabled,
            record_display_size: self
                .record_display_size
                .clamp(DISPLAY_SIZE_MIN, DISPLAY_SIZE_MAX),
        }
    }

    pub fn apply(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::FlashFrequencySec(value) => {
                self.flash_frequency_sec = clamp_i64(value, FLASH_SECS_MIN, FLASH_SECS_MAX);
            }
            SettingsChange::FlashDurationSec(value) => {
                self.flash_duration_sec = clamp_i64(value, FLASH_SECS_MIN, FLASH_SECS_MAX);
            }
            SettingsChange::FlashingEnabled(enabled) => {
                self.flashing_enabled = enabled;
            }
            SettingsChange::RecordDisplaySize(value) => {
                self.record_display_size = clamp_i64(value, DISPLAY_SIZE_MIN, DISPLAY_SIZE_MAX);
            }
        }
    }
}

fn clamp_i64(value: i64, min: u32, max: u32) -> u32 {
    value.clamp(min as i64, max as i64) as u32
}

/// A single settings edit coming from the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum SettingsChange {
    FlashFrequencySec(i64),
    FlashDurationSec(i64),
    FlashingEnabled(bool),
    RecordDisplaySize(i64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    Primary,
    Secondary,
}

/// Two manual tallies, floored at zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub primary: u64,
    pub secondary: u64,
}

impl Counters {
    pub fn adjust(&mut self, which: CounterKind, delta: i64) {
        let slot = match which {
            CounterKind::Primary => &mut self.primary,
            CounterKind::Secondary => &mut self.secondary,
        };
        *slot = if delta >= 0 {
            slot.saturating_add(delta as u64)
        } else {
            slot.saturating_sub(delta.unsigned_abs())
        };
    }
}
