//! Spare-part records and the inputs used to create and edit them
use chrono::Utc;

use crate::error::{LedgerError, Result};
use crate::status::{Status, derive_status};
use crate::types::{PartId, TimeStamp};

/// One spare-part SKU at one storage location.
///
/// `quantity` and `status` are private: the only way to change a quantity is
/// through methods that re-derive the status in the same step.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    #[n(0)]
    pub id: PartId,
    #[n(1)]
    pub model: String,
    #[n(2)]
    pub category: String,
    #[n(3)]
    pub part_code: String,
    #[n(4)]
    pub location: String, // may be empty or "N/A"
    #[n(5)]
    quantity: u32,
    #[n(6)]
    status: Status,
    #[n(7)]
    pub image_ref: Option<String>,
    #[n(8)]
    revision: u64, // bumped on every write
    #[n(9)]
    updated_at: TimeStamp<Utc>,
}

/// Input for creating a part. Quantity is signed so that negative form input
/// can be rejected instead of wrapping. Text is stored as entered; blank-only
/// required fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartDraft {
    pub model: String,
    pub category: String,
    pub part_code: String,
    pub location: String,
    pub quantity: Option<i64>, // defaults to 0
    pub image_ref: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartPatch {
    pub model: Option<String>,
    pub category: Option<String>,
    pub part_code: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<i64>,
    pub image_ref: Option<Option<String>>,
}

pub(crate) fn checked_quantity(quantity: i64) -> Result<u32> {
    u32::try_from(quantity).map_err(|_| {
        LedgerError::Validation(format!(
            "quantity must be between 0 and {}, got {quantity}",
            u32::MAX
        ))
    })
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

impl PartRecord {
    pub fn from_draft(id: PartId, draft: PartDraft) -> Result<Self> {
        let quantity = checked_quantity(draft.quantity.unwrap_or(0))?;
        let record = Self {
            id,
            model: draft.model,
            category: draft.category,
            part_code: draft.part_code,
            location: draft.location,
            quantity,
            status: derive_status(i64::from(quantity)),
            image_ref: draft.image_ref,
            revision: 0,
            updated_at: TimeStamp::new(),
        };
        record.validate()?;

        Ok(record)
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn revision(&self) -> u64 {
        self.revision
    }
    pub fn updated_at(&self) -> &TimeStamp<Utc> {
        &self.updated_at
    }

    /// Required text fields must be present
    pub fn validate(&self) -> Result<()> {
        require_text("model", &self.model)?;
        require_text("category", &self.category)?;
        require_text("part code", &self.part_code)?;
        Ok(())
    }

    pub fn is_consistent(&self) -> bool {
        self.status == derive_status(i64::from(self.quantity))
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.status = derive_status(i64::from(quantity));
    }

    /// Prepare the record for persisting: status is re-derived no matter what
    /// the caller handed in.
    pub(crate) fn stamp_write(&mut self) -> Result<()> {
        self.validate()?;
        self.status = derive_status(i64::from(self.quantity));
        self.revision += 1;
        self.updated_at = TimeStamp::new();
        Ok(())
    }

    /// The record after one unit is taken out. Rejected, not clamped, at zero.
    pub fn decremented(&self) -> Result<Self> {
        let Some(quantity) = self.quantity.checked_sub(1) else {
            return Err(LedgerError::AlreadyEmpty(self.id.clone()));
        };
        let mut next = self.clone();
        next.set_quantity(quantity);
        Ok(next)
    }

    /// Overwrite the fields present in `patch`. Status follows the quantity.
    pub fn patched(&self, patch: &PartPatch) -> Result<Self> {
        let mut next = self.clone();
        if let Some(model) = &patch.model {
            next.model = model.clone();
        }
        if let Some(category) = &patch.category {
            next.category = category.clone();
        }
        if let Some(part_code) = &patch.part_code {
            next.part_code = part_code.clone();
        }
        if let Some(location) = &patch.location {
            next.location = location.clone();
        }
        if let Some(image_ref) = &patch.image_ref {
            next.image_ref = image_ref.clone();
        }
        if let Some(quantity) = patch.quantity {
            next.set_quantity(checked_quantity(quantity)?);
        }
        next.validate()?;

        Ok(next)
    }
}

#[cfg(test)]
impl PartRecord {
    pub(crate) fn with_forged_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

impl PartDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_model(mut self, model: &str) -> Self {
        self.model = model.to_owned();
        self
    }
    pub fn set_category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }
    pub fn set_part_code(mut self, part_code: &str) -> Self {
        self.part_code = part_code.to_owned();
        self
    }
    pub fn set_location(mut self, location: &str) -> Self {
        self.location = location.to_owned();
        self
    }
    pub fn set_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
    pub fn set_image_ref(mut self, image_ref: &str) -> Self {
        self.image_ref = Some(image_ref.to_owned());
        self
    }
}

impl PartPatch {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_owned());
        self
    }
    pub fn set_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }
    pub fn set_part_code(mut self, part_code: &str) -> Self {
        self.part_code = Some(part_code.to_owned());
        self
    }
    pub fn set_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_owned());
        self
    }
    pub fn set_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
    pub fn set_image_ref(mut self, image_ref: Option<&str>) -> Self {
        self.image_ref = Some(image_ref.map(str::to_owned));
        self
    }
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(quantity: i64) -> PartRecord {
        let draft = PartDraft::new()
            .set_model("X1 Carbon")
            .set_category("battery")
            .set_part_code("BAT-01")
            .set_location("A-3")
            .set_quantity(quantity);
        PartRecord::from_draft(PartId::from("part1test"), draft).unwrap()
    }

    #[test]
    fn draft_defaults_to_empty_stock() {
        let draft = PartDraft::new()
            .set_model("X1")
            .set_category("keyboard")
            .set_part_code("KB-7");
        let record = PartRecord::from_draft(PartId::from("part1kb"), draft).unwrap();

        assert_eq!(record.quantity(), 0);
        assert_eq!(record.status(), Status::OutOfStock);
        assert_eq!(record.location, "");
    }

    #[test]
    fn draft_rejects_negative_quantity_and_blank_fields() {
        let negative = PartDraft::new()
            .set_model("X1")
            .set_category("battery")
            .set_part_code("BAT-01")
            .set_quantity(-1);
        assert!(matches!(
            PartRecord::from_draft(PartId::from("p"), negative),
            Err(LedgerError::Validation(_))
        ));

        let blank = PartDraft::new().set_model("X1").set_category("  ").set_part_code("B");
        assert!(matches!(
            PartRecord::from_draft(PartId::from("p"), blank),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn free_text_is_kept_as_entered() {
        let draft = PartDraft::new()
            .set_model(" X1 Carbon")
            .set_category("battery")
            .set_part_code("BAT-01")
            .set_location("  Shelf 1, \"top\" ");
        let record = PartRecord::from_draft(PartId::from("part1ws"), draft).unwrap();
        assert_eq!(record.location, "  Shelf 1, \"top\" ");
        assert_eq!(record.model, " X1 Carbon");

        let moved = record.patched(&PartPatch::new().set_location(" B-2 ")).unwrap();
        assert_eq!(moved.location, " B-2 ");
        assert!(record.patched(&PartPatch::new().set_model("   ")).is_err());
    }

    #[test]
    fn decrement_rederives_status() {
        let record = battery(11);
        let next = record.decremented().unwrap();

        assert_eq!(record.status(), Status::InStock);
        assert_eq!(next.quantity(), 10);
        assert_eq!(next.status(), Status::LowStock);
    }

    #[test]
    fn decrement_at_zero_is_rejected() {
        let record = battery(0);
        assert!(matches!(record.decremented(), Err(LedgerError::AlreadyEmpty(_))));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let record = battery(4);
        let next = record
            .patched(&PartPatch::new().set_quantity(12).set_location("B-1"))
            .unwrap();

        assert_eq!(next.quantity(), 12);
        assert_eq!(next.status(), Status::InStock);
        assert_eq!(next.location, "B-1");
        assert_eq!(next.model, record.model);
        assert_eq!(next.part_code, record.part_code);
    }

    #[test]
    fn patch_can_clear_image() {
        let record = battery(1);
        let with_image = record
            .patched(&PartPatch::new().set_image_ref(Some("bat.png")))
            .unwrap();
        assert_eq!(with_image.image_ref.as_deref(), Some("bat.png"));

        let cleared = with_image
            .patched(&PartPatch::new().set_image_ref(None))
            .unwrap();
        assert_eq!(cleared.image_ref, None);
    }

    #[test]
    fn stamp_write_fixes_status_and_bumps_revision() {
        let mut record = battery(3).with_forged_status(Status::InStock);

        record.stamp_write().unwrap();

        assert_eq!(record.status(), Status::LowStock);
        assert_eq!(record.revision(), 1);
        assert!(record.is_consistent());
    }
}
