//! Append-only movement ledger
use sled::Tree;
use std::sync::Arc;

use crate::error::{LedgerError, Result};
use crate::movement::{MovementDraft, MovementRecord};
use crate::types::{MovementId, TimeStamp};

pub const MOVEMENTS_TREE: &str = "movements";

/// There is no update or delete: entries are facts once appended.
pub trait MovementLedger: Send + Sync {
    /// Assigns id and timestamp, then persists
    fn append(&self, draft: MovementDraft) -> Result<MovementRecord>;
    /// Every entry, newest first
    fn list(&self) -> Result<Vec<MovementRecord>>;
}

impl<T: MovementLedger + ?Sized> MovementLedger for Arc<T> {
    fn append(&self, draft: MovementDraft) -> Result<MovementRecord> {
        (**self).append(draft)
    }
    fn list(&self) -> Result<Vec<MovementRecord>> {
        (**self).list()
    }
}

pub struct SledMovementLedger {
    instance: Arc<sled::Db>,
    movements: Tree,
}

impl SledMovementLedger {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self> {
        let movements = instance.open_tree(MOVEMENTS_TREE)?;
        Ok(Self {
            instance,
            movements,
        })
    }
}

impl MovementLedger for SledMovementLedger {
    fn append(&self, draft: MovementDraft) -> Result<MovementRecord> {
        draft.validate()?;
        let record = draft.into_record(MovementId::generate()?, TimeStamp::new());

        // sled ids are monotonic, so key order is insertion order
        let key = self.instance.generate_id()?.to_be_bytes();
        let cbor = minicbor::to_vec(&record)?;
        if self
            .movements
            .compare_and_swap(key, None as Option<&[u8]>, Some(cbor))?
            .is_err()
        {
            return Err(LedgerError::Corrupt(format!(
                "ledger slot {} is already taken",
                u64::from_be_bytes(key)
            )));
        }

        Ok(record)
    }

    fn list(&self) -> Result<Vec<MovementRecord>> {
        let mut records = self
            .movements
            .iter()
            .values()
            .rev()
            .map(|bytes| -> Result<MovementRecord> { Ok(minicbor::decode(&bytes?)?) })
            .collect::<Result<Vec<_>>>()?;
        // stable, so equal timestamps keep newest-inserted first
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(records)
    }
}

/// SHA-256 over the CBOR encoding of `records` in the given order. Two
/// exports of the same ledger reconcile when their digests match.
pub fn ledger_digest(records: &[MovementRecord]) -> Result<String> {
    let cbor = minicbor::to_vec(records)?;
    Ok(sha256::digest(&cbor))
}
