//! Session-scoped, in-memory store of pit stops.
//!
//! One owner holds the ledger. Sub-flows that need to edit it take a [`PitStopLedger::checkout`]
//! copy and hand it back through [`PitStopLedger::checkin`].

use model::{PitStopId, PitStopRecord, UNASSIGNED_ID};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("no pit stop with id {id}")]
    NotFound { id: PitStopId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitStopLedger {
    records: Vec<PitStopRecord>,
    next_id: PitStopId,
}

impl Default for PitStopLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PitStopLedger {
    pub fn new() -> Self {
        Self { records: Vec::new(), next_id: 1 }
    }

    pub fn records(&self) -> &[PitStopRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PitStopRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: PitStopId) -> Option<&PitStopRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn contains_id(&self, id: PitStopId) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// `next_id` stays parked at `PitStopId::MAX` once the counter runs out; from then on the
    /// lowest free id is handed out instead.
    fn allocate_id(&mut self) -> PitStopId {
        let id = self.next_id;
        if let Some(next) = id.checked_add(1) {
            self.next_id = next;
            return id;
        }
        if !self.contains_id(id) {
            return id;
        }
        let free = self.lowest_free_id();
        warn!(free, "pit stop id counter exhausted, reusing a free id");
        free
    }

    fn lowest_free_id(&self) -> PitStopId {
        let mut taken: Vec<PitStopId> = self.records.iter().map(|r| r.id).collect();
        taken.sort_unstable();
        taken.dedup();
        // at most len() ids are taken, so a gap shows up within 1..=len()+1
        let mut candidate = 1;
        for id in taken {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        candidate
    }

    fn bump_past(&mut self, id: PitStopId) {
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
    }

    /// Adds a validated record at the end and returns the id it was stored under.
    ///
    /// Unassigned ids get a fresh one; so does a positive id already taken by another record.
    pub fn append(&mut self, mut record: PitStopRecord) -> PitStopId {
        if record.id == UNASSIGNED_ID {
            record.id = self.allocate_id();
        } else if self.contains_id(record.id) {
            let fresh = self.allocate_id();
            warn!(taken = record.id, fresh, "pit stop id already in use, reassigning");
            record.id = fresh;
        } else {
            self.bump_past(record.id);
        }
        let id = record.id;
        debug!(id, pilot = %record.pilot, elapsed = record.elapsed_seconds, "pit stop appended");
        self.records.push(record);
        id
    }

    /// Removes the record with `id`, keeping the others in order.
    pub fn remove_by_id(&mut self, id: PitStopId) -> Result<PitStopRecord, LedgerError> {
        match self.records.iter().position(|r| r.id == id) {
            Some(idx) => {
                let removed = self.records.remove(idx);
                debug!(id, remaining = self.records.len(), "pit stop removed");
                Ok(removed)
            }
            None => {
                warn!(id, "pit stop to remove was not found");
                Err(LedgerError::NotFound { id })
            }
        }
    }

    /// Overwrites the contents with `records` as given.
    pub fn replace_all(&mut self, records: Vec<PitStopRecord>) {
        if let Some(max) = records.iter().map(|r| r.id).max() {
            self.bump_past(max);
        }
        debug!(before = self.records.len(), after = records.len(), "ledger replaced");
        self.records = records;
    }

    /// Lazy, restartable view of the records whose pilot contains `query`, ignoring case.
    pub fn filter_by_pilot_substring<'a>(
        &'a self,
        query: &str,
    ) -> impl Iterator<Item = &'a PitStopRecord> + Clone + 'a {
        analysis::filter_by_pilot_substring(&self.records, query)
    }

    /// Independent working copy for a sub-flow.
    pub fn checkout(&self) -> PitStopLedger {
        self.clone()
    }

    /// Takes back a working copy produced by [`checkout`](Self::checkout); a full overwrite.
    pub fn checkin(&mut self, copy: PitStopLedger) {
        let next_id = copy.next_id;
        self.replace_all(copy.records);
        self.next_id = self.next_id.max(next_id);
    }
}
