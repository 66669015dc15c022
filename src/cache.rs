//! Local read cache in front of a store or ledger.
//!
//! Snapshots are filled lazily by the first read and dropped on every write
//! attempt, whether it landed or lost a race.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::ledger::MovementLedger;
use crate::movement::{MovementDraft, MovementRecord};
use crate::part::PartRecord;
use crate::store::PartStore;
use crate::types::PartId;

// a poisoned snapshot is still just a cache; recover the guard
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Snapshot<T> {
    slot: RwLock<Option<T>>,
    // bumped by every invalidation so a load that raced a write is not kept
    generation: AtomicU64,
}

impl<T> Snapshot<T> {
    fn new() -> Self {
        Self {
            slot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    fn is_warm(&self) -> bool {
        read(&self.slot).is_some()
    }

    fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *write(&self.slot) = None;
    }

    fn view<R>(&self, load: impl FnOnce() -> Result<T>, f: impl FnOnce(&T) -> R) -> Result<R> {
        if let Some(value) = read(&self.slot).as_ref() {
            return Ok(f(value));
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let loaded = load()?;
        let result = f(&loaded);

        let mut slot = write(&self.slot);
        if self.generation.load(Ordering::SeqCst) == generation {
            *slot = Some(loaded);
        }

        Ok(result)
    }
}

pub struct CachedPartStore<S> {
    inner: S,
    snapshot: Snapshot<BTreeMap<PartId, PartRecord>>,
}

impl<S: PartStore> CachedPartStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            snapshot: Snapshot::new(),
        }
    }

    pub fn is_warm(&self) -> bool {
        self.snapshot.is_warm()
    }

    pub fn invalidate(&self) {
        self.snapshot.invalidate();
    }

    fn with_parts<R>(&self, f: impl FnOnce(&BTreeMap<PartId, PartRecord>) -> R) -> Result<R> {
        self.snapshot.view(
            || {
                Ok(self
                    .inner
                    .list()?
                    .into_iter()
                    .map(|record| (record.id.clone(), record))
                    .collect())
            },
            f,
        )
    }

    fn after_write<T>(&self, outcome: Result<T>) -> Result<T> {
        self.invalidate();
        outcome
    }
}

impl<S: PartStore> PartStore for CachedPartStore<S> {
    fn get(&self, id: &PartId) -> Result<PartRecord> {
        match self.with_parts(|parts| parts.get(id).cloned()) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(LedgerError::NotFound(id.clone())),
            // one unreadable row must not hide the healthy ones
            Err(e) => {
                debug!(part = %id, error = %e, "snapshot fill failed, reading through");
                self.inner.get(id)
            }
        }
    }

    fn list(&self) -> Result<Vec<PartRecord>> {
        self.with_parts(|parts| parts.values().cloned().collect())
    }

    fn upsert(&self, record: PartRecord) -> Result<PartRecord> {
        let outcome = self.inner.upsert(record);
        self.after_write(outcome)
    }

    fn compare_and_swap(&self, current: &PartRecord, next: PartRecord) -> Result<PartRecord> {
        let outcome = self.inner.compare_and_swap(current, next);
        self.after_write(outcome)
    }

    fn delete(&self, id: &PartId) -> Result<()> {
        let outcome = self.inner.delete(id);
        self.after_write(outcome)
    }
}

pub struct CachedLedger<L> {
    inner: L,
    snapshot: Snapshot<Vec<MovementRecord>>,
}

impl<L: MovementLedger> CachedLedger<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            snapshot: Snapshot::new(),
        }
    }

    pub fn is_warm(&self) -> bool {
        self.snapshot.is_warm()
    }
}

impl<L: MovementLedger> MovementLedger for CachedLedger<L> {
    fn append(&self, draft: MovementDraft) -> Result<MovementRecord> {
        let outcome = self.inner.append(draft);
        self.snapshot.invalidate();
        outcome
    }

    fn list(&self) -> Result<Vec<MovementRecord>> {
        self.snapshot.view(|| self.inner.list(), |records| records.clone())
    }
}
