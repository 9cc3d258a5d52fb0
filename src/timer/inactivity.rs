/// Debounced visibility for transient controls while an image is loaded.
#[derive(Debug, Clone)]
pub struct InactivityTracker {
    armed: bool,
    visible: bool,
    hide_at: Option<i64>,
    timeout_ms: i64,
}

impl InactivityTracker {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            armed: false,
            visible: false,
            hide_at: None,
            timeout_ms,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_visible(&self) -> bool {
        self.armed && self.visible
    }

    /// Starts (or restarts) tracking with controls shown.
    pub fn arm(&mut self, now_ms: i64) -> bool {
        let before = self.is_visible();
        self.armed = true;
        self.show_until_idle(now_ms);
        before != self.is_visible()
    }

    /// Pointer move or click. Ignored while disarmed.
    pub fn record_input(&mut self, now_ms: i64) -> bool {
        if !self.armed {
            return false;
        }
        let before = self.visible;
        self.show_until_idle(now_ms);
        before != self.visible
    }

    pub fn tick(&mut self, now_ms: i64) -> bool {
        match self.hide_at {
            Some(deadline) if deadline <= now_ms => {
                self.hide_at = None;
                let changed = self.visible;
                self.visible = false;
                changed
            }
            _ => false,
        }
    }

    /// Stops tracking and clears the countdown. Safe to call repeatedly.
    pub fn teardown(&mut self) -> bool {
        let before = self.is_visible();
        self.armed = false;
        self.visible = false;
        self.hide_at = None;
        before
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.hide_at
    }

    fn show_until_idle(&mut self, now_ms: i64) {
        self.visible = true;
        self.hide_at = Some(now_ms.saturating_add(self.timeout_ms));
    }
}
