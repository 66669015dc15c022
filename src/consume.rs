//! Guarded single-unit consumption
use tracing::{debug, info, instrument, warn};

use crate::auth::{Caller, Capability};
use crate::error::{LedgerError, Result};
use crate::ledger::MovementLedger;
use crate::movement::{MovementDraft, MovementRecord};
use crate::part::PartRecord;
use crate::store::PartStore;
use crate::types::PartId;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub struct ConsumptionService<S, L> {
    parts: S,
    ledger: L,
    max_attempts: u32,
}

impl<S: PartStore, L: MovementLedger> ConsumptionService<S, L> {
    pub fn new(parts: S, ledger: L) -> Self {
        Self {
            parts,
            ledger,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// How many conditional writes to try before reporting a conflict
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Take one unit of `part_id` out of stock on behalf of `technician`.
    ///
    /// The stock write and the ledger append are ordered so that a failed
    /// write never leaves a ledger entry behind. If the write lands but the
    /// append fails, the decrement stands and the caller gets
    /// [`LedgerError::AuditIncomplete`] carrying the updated record.
    #[instrument(skip_all, fields(user = %caller.acting_user, part = %part_id))]
    pub fn consume(
        &self,
        caller: &Caller,
        part_id: &PartId,
        technician: &str,
    ) -> Result<MovementRecord> {
        caller.require(Capability::EditStock)?;

        let technician = technician.trim();
        if technician.is_empty() {
            return Err(LedgerError::InvalidTechnician);
        }

        let (before, after) = self.take_one(part_id)?;

        let draft = MovementDraft::consumption(&caller.acting_user, technician, &before, &after);
        match self.ledger.append(draft) {
            Ok(movement) => {
                info!(
                    technician,
                    quantity_before = movement.quantity_before,
                    quantity_after = movement.quantity_after,
                    status = %after.status(),
                    "part consumed"
                );
                Ok(movement)
            }
            Err(source) => {
                warn!(error = %source, quantity = after.quantity(), "stock updated, but audit log failed");
                Err(LedgerError::AuditIncomplete {
                    part: Box::new(after),
                    source: Box::new(source),
                })
            }
        }
    }

    // read, check, conditional write; re-read on a lost race
    fn take_one(&self, part_id: &PartId) -> Result<(PartRecord, PartRecord)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.parts.get(part_id)?;
            let next = current.decremented()?;

            match self.parts.compare_and_swap(&current, next) {
                Ok(stored) => return Ok((current, stored)),
                Err(LedgerError::Conflict { .. }) if attempt < self.max_attempts => {
                    debug!(attempt, "lost conditional write, re-reading");
                }
                Err(LedgerError::Conflict { id, .. }) => {
                    warn!(attempts = attempt, "giving up after repeated conflicts");
                    return Err(LedgerError::Conflict {
                        id,
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
