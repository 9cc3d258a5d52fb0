use std::collections::HashSet;

use log::debug;

use crate::models::{LedgerRecord, Outcome, Position, RecordPatch, RecordStatus};

/// Owns the pending set and the capped confirmed list.
///
/// Records only ever move pending -> confirmed through [`LedgerEngine::resolve`].
/// Both lists are most-recent-first.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    pending: Vec<LedgerRecord>,
    confirmed: Vec<LedgerRecord>,
    confirmed_cap: usize,
    suggestion_limit: usize,
    last_id: i64,
}

impl LedgerEngine {
    pub fn new(confirmed_cap: usize, suggestion_limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            confirmed: Vec::new(),
            confirmed_cap,
            suggestion_limit,
            last_id: 0,
        }
    }

    /// Loads previously persisted lists, repairing anything that would break
    /// the pending/confirmed invariants.
    pub fn restore(&mut self, pending: Vec<LedgerRecord>, confirmed: Vec<LedgerRecord>) {
        // An id lives in one list only. The confirmed copy wins because it
        // carries the outcome.
        let mut seen = HashSet::new();
        self.confirmed = confirmed
            .into_iter()
            .filter(|record| record.status != RecordStatus::Pending)
            .filter(|record| seen.insert(record.id))
            .take(self.confirmed_cap)
            .collect();
        seen.clear();
        seen.extend(self.confirmed.iter().map(|record| record.id));
        self.pending = pending
            .into_iter()
            .filter(|record| seen.insert(record.id))
            .map(|mut record| {
                record.status = RecordStatus::Pending;
                record
            })
            .collect();
        self.last_id = self
            .pending
            .iter()
            .chain(self.confirmed.iter())
            .map(|record| record.id)
            .max()
            .unwrap_or(0);
    }

    pub fn pending(&self) -> &[LedgerRecord] {
        &self.pending
    }

    pub fn confirmed(&self) -> &[LedgerRecord] {
        &self.confirmed
    }

    pub fn is_pending(&self, record_id: i64) -> bool {
        self.pending.iter().any(|record| record.id == record_id)
    }

    /// Creates a pending record. Blank name or number is rejected.
    pub fn stage_record(
        &mut self,
        name: &str,
        number: &str,
        position: Position,
        now_ms: i64,
    ) -> Option<LedgerRecord> {
        let name = name.trim();
        let number = number.trim();
        if name.is_empty() || number.is_empty() {
            return None;
        }

        let id = self.next_id(now_ms);
        let record = LedgerRecord {
            id,
            name: name.to_string(),
            number: number.to_string(),
            position,
            created_at_ms: now_ms,
            status: RecordStatus::Pending,
        };
        self.pending.insert(0, record.clone());
        Some(record)
    }

    /// Moves a pending record to the front of the confirmed list.
    pub fn resolve(&mut self, record_id: i64, outcome: Outcome) -> Option<LedgerRecord> {
        let Some(index) = self.pending.iter().position(|record| record.id == record_id) else {
            debug!("resolve ignored: record {record_id} is not pending");
            return None;
        };

        let mut record = self.pending.remove(index);
        record.status = outcome.into();
        self.confirmed.insert(0, record.clone());
        self.confirmed.truncate(self.confirmed_cap);
        Some(record)
    }

    /// Applies a patch to a confirmed record. Blank name/number values are
    /// rejected and leave the record untouched.
    pub fn edit_confirmed(&mut self, record_id: i64, patch: &RecordPatch) -> bool {
        let name = patch.name.as_deref().map(str::trim);
        let number = patch.number.as_deref().map(str::trim);
        if name.is_some_and(str::is_empty) || number.is_some_and(str::is_empty) {
            return false;
        }

        let Some(record) = self.confirmed.iter_mut().find(|record| record.id == record_id) else {
            debug!("edit ignored: record {record_id} is not confirmed");
            return false;
        };

        if let Some(name) = name {
            record.name = name.to_string();
        }
        if let Some(number) = number {
            record.number = number.to_string();
        }
        if let Some(position) = patch.position {
            record.position = position;
        }
        if let Some(outcome) = patch.status {
            record.status = outcome.into();
        }
        true
    }

    pub fn delete_confirmed(&mut self, record_id: i64) -> Option<LedgerRecord> {
        let Some(index) = self.confirmed.iter().position(|record| record.id == record_id) else {
            debug!("delete ignored: record {record_id} is not confirmed");
            return None;
        };
        Some(self.confirmed.remove(index))
    }

    /// Drops the least recently inserted confirmed record (the tail).
    pub fn remove_oldest_confirmed(&mut self) -> Option<LedgerRecord> {
        self.confirmed.pop()
    }

    /// Most recently used distinct names, pending first then confirmed.
    ///
    /// Duplicates keep their first position, and only the trailing
    /// `suggestion_limit` entries survive.
    pub fn suggested_names(&self) -> Vec<String> {
        let mut names: Vec<&str> = Vec::new();
        for record in self.pending.iter().chain(self.confirmed.iter()) {
            if !names.contains(&record.name.as_str()) {
                names.push(&record.name);
            }
        }

        let skip = names.len().saturating_sub(self.suggestion_limit);
        names.into_iter().skip(skip).map(str::to_string).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.confirmed.clear();
    }

    fn next_id(&mut self, now_ms: i64) -> i64 {
        let id = if now_ms > self.last_id {
            now_ms
        } else {
            self.last_id + 1
        };
        self.last_id = id;
        id
    }
}
