//! Part record store
use sled::{CompareAndSwapError, Tree};
use std::sync::Arc;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::part::PartRecord;
use crate::types::PartId;

pub const PARTS_TREE: &str = "parts";

pub trait PartStore: Send + Sync {
    fn get(&self, id: &PartId) -> Result<PartRecord>;
    /// Every stored record, in no particular order
    fn list(&self) -> Result<Vec<PartRecord>>;
    /// Insert or replace. Status is re-derived before the write.
    fn upsert(&self, record: PartRecord) -> Result<PartRecord>;
    /// Write `next` only if the stored record is still exactly `current`.
    /// A lost race is reported as [`LedgerError::Conflict`].
    fn compare_and_swap(&self, current: &PartRecord, next: PartRecord) -> Result<PartRecord>;
    fn delete(&self, id: &PartId) -> Result<()>;
}

impl<T: PartStore + ?Sized> PartStore for Arc<T> {
    fn get(&self, id: &PartId) -> Result<PartRecord> {
        (**self).get(id)
    }
    fn list(&self) -> Result<Vec<PartRecord>> {
        (**self).list()
    }
    fn upsert(&self, record: PartRecord) -> Result<PartRecord> {
        (**self).upsert(record)
    }
    fn compare_and_swap(&self, current: &PartRecord, next: PartRecord) -> Result<PartRecord> {
        (**self).compare_and_swap(current, next)
    }
    fn delete(&self, id: &PartId) -> Result<()> {
        (**self).delete(id)
    }
}

pub struct SledPartStore {
    parts: Tree,
}

fn decode_part(bytes: &[u8]) -> Result<PartRecord> {
    let record: PartRecord = minicbor::decode(bytes)?;
    if !record.is_consistent() {
        return Err(LedgerError::Corrupt(format!(
            "part {} is stored as {} with quantity {}",
            record.id,
            record.status(),
            record.quantity()
        )));
    }
    Ok(record)
}

impl SledPartStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self> {
        let parts = instance.open_tree(PARTS_TREE)?;
        Ok(Self { parts })
    }
}

impl PartStore for SledPartStore {
    fn get(&self, id: &PartId) -> Result<PartRecord> {
        match self.parts.get(id.as_str().as_bytes())? {
            Some(bytes) => decode_part(&bytes),
            None => Err(LedgerError::NotFound(id.clone())),
        }
    }

    fn list(&self) -> Result<Vec<PartRecord>> {
        self.parts
            .iter()
            .values()
            .map(|bytes| decode_part(&bytes?))
            .collect()
    }

    fn upsert(&self, mut record: PartRecord) -> Result<PartRecord> {
        record.stamp_write()?;
        let cbor = minicbor::to_vec(&record)?;
        self.parts.insert(record.id.as_str().as_bytes(), cbor)?;

        Ok(record)
    }

    fn compare_and_swap(&self, current: &PartRecord, mut next: PartRecord) -> Result<PartRecord> {
        if next.id != current.id {
            return Err(LedgerError::Validation(format!(
                "cannot swap part {} for part {}",
                current.id, next.id
            )));
        }
        next.stamp_write()?;

        let expected = minicbor::to_vec(current)?;
        let proposed = minicbor::to_vec(&next)?;

        match self
            .parts
            .compare_and_swap(current.id.as_str().as_bytes(), Some(expected), Some(proposed))?
        {
            Ok(()) => Ok(next),
            Err(CompareAndSwapError { current: None, .. }) => {
                Err(LedgerError::NotFound(current.id.clone()))
            }
            Err(CompareAndSwapError { .. }) => {
                debug!(part = %current.id, revision = current.revision(), "conditional write lost");
                Err(LedgerError::Conflict {
                    id: current.id.clone(),
                    attempts: 1,
                })
            }
        }
    }

    fn delete(&self, id: &PartId) -> Result<()> {
        match self.parts.remove(id.as_str().as_bytes())? {
            Some(_) => Ok(()),
            None => Err(LedgerError::NotFound(id.clone())),
        }
    }
}
