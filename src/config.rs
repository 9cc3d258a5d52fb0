use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "image-marker-ledger-state";

pub const MARK_SIZE_MIN: f64 = 4.0;
pub const MARK_SIZE_MAX: f64 = 17.0;
pub const DEFAULT_MARK_SIZE: f64 = 4.0;

/// Engine tunables. Everything user-editable lives in `LedgerSettings` instead.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a popup stays current before it is dropped without resolution
    pub popup_timeout: Duration,

    /// Idle time after the last input event before transient controls hide
    pub inactivity_timeout: Duration,

    /// Confirmed records kept; older ones are evicted
    pub confirmed_cap: usize,

    /// Distinct names offered as quick picks
    pub suggestion_limit: usize,

    /// Key under which the snapshot document is stored
    pub storage_key: String,

    /// Pixels per mark size unit (1rem)
    pub mark_pixels_per_unit: f64,

    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            popup_timeout: Duration::from_secs(3),
            inactivity_timeout: Duration::from_secs(3),
            confirmed_cap: 10,
            suggestion_limit: 5,
            storage_key: DEFAULT_STORAGE_KEY.into(),
            mark_pixels_per_unit: 16.0,
            debug: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let debug = std::env::var("MARKLEDGER_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            debug,
            ..Self::default()
        }
    }

    pub fn popup_timeout_ms(&self) -> i64 {
        self.popup_timeout.as_millis() as i64
    }

    pub fn inactivity_timeout_ms(&self) -> i64 {
        self.inactivity_timeout.as_millis() as i64
    }
}
