//! Immutable stock movement facts
use chrono::Utc;

use crate::error::{LedgerError, Result};
use crate::part::PartRecord;
use crate::types::{MovementId, PartId, TimeStamp};

/// "Quantity of part X at location Y went from A to B, done by user U for
/// technician T at time S". Part code and location are copied at the time of
/// the event so history stays readable after the part is edited or removed.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct MovementRecord {
    #[n(0)]
    pub id: MovementId,
    #[n(1)]
    pub acting_user: String,
    #[n(2)]
    pub technician: String,
    #[n(3)]
    pub part_id: PartId,
    #[n(4)]
    pub part_code: String,
    #[n(5)]
    pub location: String,
    #[n(6)]
    pub quantity_before: u32,
    #[n(7)]
    pub quantity_after: u32,
    #[n(8)]
    pub timestamp: TimeStamp<Utc>, // issued on append
}

/// Everything but the id and timestamp, which the ledger assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDraft {
    pub acting_user: String,
    pub technician: String,
    pub part_id: PartId,
    pub part_code: String,
    pub location: String,
    pub quantity_before: u32,
    pub quantity_after: u32,
}

impl MovementDraft {
    pub fn consumption(
        acting_user: &str,
        technician: &str,
        before: &PartRecord,
        after: &PartRecord,
    ) -> Self {
        Self {
            acting_user: acting_user.to_owned(),
            technician: technician.to_owned(),
            part_id: after.id.clone(),
            part_code: after.part_code.clone(),
            location: after.location.clone(),
            quantity_before: before.quantity(),
            quantity_after: after.quantity(),
        }
    }

    // consumption is the only movement kind, so after must be before - 1
    pub fn validate(&self) -> Result<()> {
        if self.technician.trim().is_empty() {
            return Err(LedgerError::InvalidTechnician);
        }
        if self.quantity_before.checked_sub(1) != Some(self.quantity_after) {
            return Err(LedgerError::Validation(format!(
                "a consumption moves exactly one unit, got {} -> {}",
                self.quantity_before, self.quantity_after
            )));
        }
        Ok(())
    }

    pub fn into_record(self, id: MovementId, timestamp: TimeStamp<Utc>) -> MovementRecord {
        MovementRecord {
            id,
            acting_user: self.acting_user,
            technician: self.technician,
            part_id: self.part_id,
            part_code: self.part_code,
            location: self.location,
            quantity_before: self.quantity_before,
            quantity_after: self.quantity_after,
            timestamp,
        }
    }
}
