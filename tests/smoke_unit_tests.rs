//! Smoke tests for the ledger components
//!
//! Happy-path checks across the public surface, each exercised in isolation
//! from the end-to-end scenarios.

use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tempfile::tempdir;

use parts_ledger::{
    Inventory,
    auth::Caller,
    config::LedgerConfig,
    ledger::{MovementLedger, ledger_digest},
    part::PartDraft,
    report::{MovementFilter, PartFilter, SortDirection, SortKey, SortState},
    status::Status,
    types::{MovementId, PartId, TimeStamp},
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
mod utils_tests {
    use super::*;

    /// Part and movement ids carry their own prefixes
    #[test]
    fn ids_carry_their_prefix() {
        let part = PartId::generate().unwrap();
        let movement = MovementId::generate().unwrap();

        assert!(part.as_str().starts_with("part1"));
        assert!(movement.as_str().starts_with("mvmt1"));
    }

    #[test]
    fn ids_are_unique() {
        let first = new_uuid_to_bech32(PartId::HRP).unwrap();
        let second = new_uuid_to_bech32(PartId::HRP).unwrap();
        assert_ne!(first, second);
    }
}

// TYPES MODULE TESTS
mod types_tests {
    use super::*;

    /// A fresh timestamp is close to now and its age grows with the clock
    #[test]
    fn timestamp_age() {
        let ts = TimeStamp::new();
        let later = ts.to_datetime_utc() + TimeDelta::minutes(5);

        assert!((Utc::now() - ts.to_datetime_utc()).num_seconds().abs() < 1);
        assert_eq!(ts.elapsed_until(later), TimeDelta::minutes(5));
    }
}

// SERVICE TESTS
mod service_tests {
    use super::*;

    fn stocked(cache: bool) -> anyhow::Result<(tempfile::TempDir, Inventory)> {
        let temp_dir = tempdir()?;
        let db = Arc::new(sled::open(temp_dir.path().join("smoke.db"))?);
        let config = LedgerConfig {
            cache,
            ..LedgerConfig::default()
        };
        let inventory = Inventory::new(db, &config)?;

        let admin = Caller::admin("admin");
        for (category, code, quantity) in [("battery", "BAT-9", 12), ("screen", "SCR-2", 3), ("fan", "FAN-1", 0)] {
            let draft = PartDraft::new()
                .set_model("ThinkPad T14")
                .set_category(category)
                .set_part_code(code)
                .set_location("C-2")
                .set_quantity(quantity);
            inventory.admin.create(&admin, draft)?;
        }
        Ok((temp_dir, inventory))
    }

    /// Both wirings report the same stock after the same writes
    #[test]
    fn cached_and_direct_agree() -> anyhow::Result<()> {
        for cache in [false, true] {
            let (_dir, inventory) = stocked(cache)?;
            let sort = SortState::by(SortKey::Quantity, SortDirection::Descending);

            let view = inventory.reports.parts_view(&PartFilter::new(), &sort)?;
            let codes: Vec<&str> = view.records.iter().map(|r| r.part_code.as_str()).collect();
            assert_eq!(codes, ["BAT-9", "SCR-2", "FAN-1"]);
            assert_eq!(view.counts.total, 3);
            assert_eq!(view.counts.of(Status::LowStock), 1);
            assert!(view.last_updated.is_some());

            let screen = view.records[1].id.clone();
            inventory
                .consumption
                .consume(&Caller::technician("desk"), &screen, "Ana")?;

            let low = PartFilter::new().set_status(Status::LowStock);
            let view = inventory.reports.parts_view(&low, &SortState::default())?;
            assert_eq!(view.records[0].quantity(), 2);
        }
        Ok(())
    }

    /// The digest changes once the ledger grows and is stable otherwise
    #[test]
    fn ledger_digest_tracks_appends() -> anyhow::Result<()> {
        let (_dir, inventory) = stocked(true)?;
        let empty = ledger_digest(&inventory.ledger().list()?)?;
        assert_eq!(empty.len(), 64);

        let part = inventory.reports.parts_view(&PartFilter::new().set_part_code("bat"), &SortState::default())?;
        inventory
            .consumption
            .consume(&Caller::technician("desk"), &part.records[0].id, "Bruno")?;

        let movements = inventory.reports.movements(&MovementFilter::default())?;
        let digest = ledger_digest(&movements)?;
        assert_ne!(digest, empty);
        assert_eq!(digest, ledger_digest(&inventory.ledger().list()?)?);
        Ok(())
    }
}
