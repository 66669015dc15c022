//! Administrative record maintenance.
//!
//! Edits made here are corrections and setup, not physical consumption, and
//! are not written to the movement ledger. Readers of the audit trail should
//! know it only covers technician consumption.
use tracing::{debug, info, instrument};

use crate::auth::{Caller, Capability};
use crate::consume::DEFAULT_MAX_ATTEMPTS;
use crate::error::{LedgerError, Result};
use crate::part::{PartDraft, PartPatch, PartRecord};
use crate::store::PartStore;
use crate::types::PartId;

pub struct AdminService<S> {
    parts: S,
    max_attempts: u32,
}

impl<S: PartStore> AdminService<S> {
    pub fn new(parts: S) -> Self {
        Self {
            parts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[instrument(skip_all, fields(user = %caller.acting_user))]
    pub fn create(&self, caller: &Caller, draft: PartDraft) -> Result<PartRecord> {
        caller.require(Capability::Admin)?;

        let record = PartRecord::from_draft(PartId::generate()?, draft)?;
        let saved = self.parts.upsert(record)?;
        info!(part = %saved.id, quantity = saved.quantity(), status = %saved.status(), "part created");

        Ok(saved)
    }

    /// Overwrite the fields present in `patch`. Goes through the same
    /// conditional write as consumption so a concurrent decrement is never
    /// silently overwritten.
    #[instrument(skip_all, fields(user = %caller.acting_user, part = %id))]
    pub fn update(&self, caller: &Caller, id: &PartId, patch: &PartPatch) -> Result<PartRecord> {
        caller.require(Capability::Admin)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.parts.get(id)?;
            let next = current.patched(patch)?;

            match self.parts.compare_and_swap(&current, next) {
                Ok(saved) => {
                    info!(quantity = saved.quantity(), status = %saved.status(), "part updated");
                    return Ok(saved);
                }
                Err(LedgerError::Conflict { .. }) if attempt < self.max_attempts => {
                    debug!(attempt, "lost conditional write, re-reading");
                }
                Err(LedgerError::Conflict { id, .. }) => {
                    return Err(LedgerError::Conflict {
                        id,
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Movement history of the part is kept.
    #[instrument(skip_all, fields(user = %caller.acting_user, part = %id))]
    pub fn remove(&self, caller: &Caller, id: &PartId) -> Result<()> {
        caller.require(Capability::Admin)?;

        self.parts.delete(id)?;
        info!("part removed");

        Ok(())
    }
}
