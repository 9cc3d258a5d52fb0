use std::collections::VecDeque;

use log::debug;

use crate::models::{LedgerRecord, Outcome, PopupKind, PopupNotification};

/// A popup that left the queue, with the answer given to it (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Dismissal {
    pub popup: PopupNotification,
    /// Present only for a manually answered `Question` popup.
    pub resolution: Option<Outcome>,
}

/// FIFO of popups with a single current slot at the head.
///
/// The head becomes current on [`NotificationQueue::promote`], which also
/// starts its auto-dismiss deadline. Queued items do not age before promotion.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    items: VecDeque<PopupNotification>,
    current: Option<u64>,
    expires_at: Option<i64>,
    timeout_ms: i64,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            items: VecDeque::new(),
            current: None,
            expires_at: None,
            timeout_ms,
            next_id: 1,
        }
    }

    pub fn enqueue(&mut self, record: LedgerRecord, kind: PopupKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push_back(PopupNotification { id, record, kind });
        id
    }

    /// Makes the head current when nothing is displayed. Returns true when a
    /// popup was promoted.
    pub fn promote(&mut self, now_ms: i64) -> bool {
        if self.current.is_some() {
            return false;
        }
        let Some(head) = self.items.front() else {
            return false;
        };
        self.current = Some(head.id);
        self.expires_at = Some(now_ms.saturating_add(self.timeout_ms));
        true
    }

    pub fn current(&self) -> Option<&PopupNotification> {
        let id = self.current?;
        self.items.front().filter(|popup| popup.id == id)
    }

    /// Manually closes the current popup. A resolution is only kept for
    /// `Question` popups; the caller applies it to the ledger.
    pub fn dismiss(&mut self, popup_id: u64, resolution: Option<Outcome>) -> Option<Dismissal> {
        if self.current != Some(popup_id) {
            debug!("dismiss ignored: popup {popup_id} is not current");
            return None;
        }

        let popup = self.pop_current()?;
        let resolution = match popup.kind {
            PopupKind::Question => resolution,
            PopupKind::Result => None,
        };
        Some(Dismissal { popup, resolution })
    }

    /// Drops the current popup once its deadline has passed. Expiry never
    /// resolves anything.
    pub fn tick(&mut self, now_ms: i64) -> Option<Dismissal> {
        match self.expires_at {
            Some(deadline) if deadline <= now_ms => {}
            _ => return None,
        }

        let popup = self.pop_current()?;
        debug!("popup {} expired without an answer", popup.id);
        Some(Dismissal {
            popup,
            resolution: None,
        })
    }

    pub fn next_deadline(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empties the queue. Ids keep counting so stale handles never match.
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
        self.expires_at = None;
    }

    fn pop_current(&mut self) -> Option<PopupNotification> {
        self.current = None;
        self.expires_at = None;
        self.items.pop_front()
    }
}
