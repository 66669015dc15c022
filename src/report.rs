//! Read-only views for display and export
use chrono::Utc;
use std::cmp::Ordering;

use crate::error::Result;
use crate::export;
use crate::ledger::MovementLedger;
use crate::movement::MovementRecord;
use crate::part::PartRecord;
use crate::status::Status;
use crate::store::PartStore;
use crate::types::{PartId, TimeStamp};

fn contains_ignore_case(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// All given criteria must match; an empty or absent criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartFilter {
    pub model: Option<String>,
    pub part_code: Option<String>,
    pub location: Option<String>,
    pub status: Option<Status>,
}

impl PartFilter {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_owned());
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
    pub fn set_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &PartRecord) -> bool {
        contains_ignore_case(&record.model, &self.model)
            && contains_ignore_case(&record.part_code, &self.part_code)
            && contains_ignore_case(&record.location, &self.location)
            && self.status.is_none_or(|status| record.status() == status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Category,
    Model,
    PartCode,
    Location,
    Quantity,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Column sort as driven by clicking headers: the same key flips the
/// direction, a new key starts ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    key: Option<SortKey>,
    direction: SortDirection,
}

impl SortState {
    pub fn by(key: SortKey, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    pub fn key(&self) -> Option<SortKey> {
        self.key
    }
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn select(&mut self, key: SortKey) {
        if self.key == Some(key) {
            self.direction = match self.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.key = Some(key);
            self.direction = SortDirection::Ascending;
        }
    }

    /// Stable sort; without a key the order is left alone
    pub fn sort(&self, records: &mut [PartRecord]) {
        let Some(key) = self.key else {
            return;
        };
        records.sort_by(|a, b| {
            let ordering = compare_by(key, a, b);
            match self.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_by(key: SortKey, a: &PartRecord, b: &PartRecord) -> Ordering {
    match key {
        SortKey::Quantity => a.quantity().cmp(&b.quantity()),
        SortKey::Category => compare_text(&a.category, &b.category),
        SortKey::Model => compare_text(&a.model, &b.model),
        SortKey::PartCode => compare_text(&a.part_code, &b.part_code),
        SortKey::Location => compare_text(&a.location, &b.location),
        SortKey::Status => compare_text(a.status().label(), b.status().label()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl StatusCounts {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a PartRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut counts, record| {
            counts.total += 1;
            match record.status() {
                Status::InStock => counts.in_stock += 1,
                Status::LowStock => counts.low_stock += 1,
                Status::OutOfStock => counts.out_of_stock += 1,
            }
            counts
        })
    }

    pub fn of(&self, status: Status) -> usize {
        match status {
            Status::InStock => self.in_stock,
            Status::LowStock => self.low_stock,
            Status::OutOfStock => self.out_of_stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartsView {
    pub records: Vec<PartRecord>,
    pub counts: StatusCounts,
    pub last_updated: Option<TimeStamp<Utc>>,
}

impl PartsView {
    pub fn build(records: Vec<PartRecord>, filter: &PartFilter, sort: &SortState) -> Self {
        let mut records: Vec<PartRecord> = records.into_iter().filter(|r| filter.matches(r)).collect();
        sort.sort(&mut records);

        let counts = StatusCounts::tally(&records);
        let last_updated = records.iter().map(|r| r.updated_at()).max().cloned();

        Self {
            records,
            counts,
            last_updated,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub part_id: Option<PartId>,
    pub technician: Option<String>,
    pub acting_user: Option<String>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &MovementRecord) -> bool {
        self.part_id.as_ref().is_none_or(|id| movement.part_id == *id)
            && contains_ignore_case(&movement.technician, &self.technician)
            && contains_ignore_case(&movement.acting_user, &self.acting_user)
    }
}

/// Reads from both stores, never writes.
pub struct ReportFacade<S, L> {
    parts: S,
    ledger: L,
}

impl<S: PartStore, L: MovementLedger> ReportFacade<S, L> {
    pub fn new(parts: S, ledger: L) -> Self {
        Self { parts, ledger }
    }

    /// Recomputed from the store on every call
    pub fn parts_view(&self, filter: &PartFilter, sort: &SortState) -> Result<PartsView> {
        Ok(PartsView::build(self.parts.list()?, filter, sort))
    }

    pub fn movements(&self, filter: &MovementFilter) -> Result<Vec<MovementRecord>> {
        let mut movements = self.ledger.list()?;
        movements.retain(|m| filter.matches(m));
        Ok(movements)
    }

    /// Most recent movement of a part, if it ever moved
    pub fn last_movement(&self, part_id: &PartId) -> Result<Option<MovementRecord>> {
        Ok(self
            .ledger
            .list()?
            .into_iter()
            .find(|m| m.part_id == *part_id))
    }

    pub fn export_parts(&self, filter: &PartFilter, sort: &SortState) -> Result<String> {
        export::parts_csv(&self.parts_view(filter, sort)?.records)
    }

    pub fn export_movements(&self, filter: &MovementFilter) -> Result<String> {
        export::movements_csv(&self.movements(filter)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartDraft;

    fn part(model: &str, code: &str, location: &str, quantity: i64) -> PartRecord {
        let draft = PartDraft::new()
            .set_model(model)
            .set_category("battery")
            .set_part_code(code)
            .set_location(location)
            .set_quantity(quantity);
        PartRecord::from_draft(PartId::generate().unwrap(), draft).unwrap()
    }

    fn stock() -> Vec<PartRecord> {
        vec![
            part("ThinkPad X1", "BAT-01", "A-1", 12),
            part("ThinkPad T14", "BAT-02", "A-2", 3),
            part("IdeaPad 5", "bat-03", "B-1", 0),
            part("ThinkPad E14", "FAN-01", "A-1", 7),
        ]
    }

    fn codes(records: &[PartRecord]) -> Vec<&str> {
        records.iter().map(|r| r.part_code.as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_all() {
        let view = PartsView::build(stock(), &PartFilter::new().set_model("  "), &SortState::default());
        assert_eq!(view.records.len(), 4);
        assert_eq!(
            view.counts,
            StatusCounts {
                total: 4,
                in_stock: 1,
                low_stock: 2,
                out_of_stock: 1
            }
        );
    }

    #[test]
    fn criteria_are_anded_and_case_insensitive() {
        let filter = PartFilter::new()
            .set_model("thinkpad")
            .set_part_code("bat")
            .set_status(Status::LowStock);
        let view = PartsView::build(stock(), &filter, &SortState::default());

        assert_eq!(codes(&view.records), vec!["BAT-02"]);
        assert_eq!(view.counts.total, 1);
        assert_eq!(view.counts.of(Status::LowStock), 1);
    }

    #[test]
    fn quantity_sorts_numerically() {
        let mut records = stock();
        SortState::by(SortKey::Quantity, SortDirection::Descending).sort(&mut records);
        let quantities: Vec<u32> = records.iter().map(|r| r.quantity()).collect();
        assert_eq!(quantities, vec![12, 7, 3, 0]);
    }

    #[test]
    fn text_sorts_ignore_case() {
        let mut records = stock();
        SortState::by(SortKey::PartCode, SortDirection::Ascending).sort(&mut records);
        assert_eq!(codes(&records), vec!["BAT-01", "BAT-02", "bat-03", "FAN-01"]);
    }

    #[test]
    fn reselecting_a_key_toggles_direction() {
        let mut sort = SortState::default();
        sort.select(SortKey::Model);
        assert_eq!(sort.direction(), SortDirection::Ascending);

        sort.select(SortKey::Model);
        assert_eq!(sort.direction(), SortDirection::Descending);

        sort.select(SortKey::Location);
        assert_eq!(sort.key(), Some(SortKey::Location));
        assert_eq!(sort.direction(), SortDirection::Ascending);
    }

    #[test]
    fn last_updated_is_the_newest_stamp() {
        let records = stock();
        let newest = records.iter().map(|r| r.updated_at().clone()).max();
        let view = PartsView::build(records, &PartFilter::new(), &SortState::default());
        assert_eq!(view.last_updated, newest);

        let empty = PartsView::build(vec![], &PartFilter::new(), &SortState::default());
        assert_eq!(empty.last_updated, None);
        assert_eq!(empty.counts, StatusCounts::default());
    }
}
