//! Wiring of stores and services over one sled instance
use std::sync::Arc;

use crate::admin::AdminService;
use crate::cache::{CachedLedger, CachedPartStore};
use crate::config::LedgerConfig;
use crate::consume::ConsumptionService;
use crate::error::Result;
use crate::ledger::{MovementLedger, SledMovementLedger};
use crate::report::ReportFacade;
use crate::store::{PartStore, SledPartStore};

pub type SharedParts = Arc<dyn PartStore>;
pub type SharedLedger = Arc<dyn MovementLedger>;

pub struct Inventory {
    pub consumption: ConsumptionService<SharedParts, SharedLedger>,
    pub admin: AdminService<SharedParts>,
    pub reports: ReportFacade<SharedParts, SharedLedger>,
    parts: SharedParts,
    ledger: SharedLedger,
}

impl Inventory {
    /// Open the configured database and wire everything on top of it
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        let db = config.open_db()?;
        Self::new(Arc::new(db), config)
    }

    pub fn new(instance: Arc<sled::Db>, config: &LedgerConfig) -> Result<Self> {
        let parts = SledPartStore::new(instance.clone())?;
        let ledger = SledMovementLedger::new(instance)?;

        let (parts, ledger): (SharedParts, SharedLedger) = if config.cache {
            (
                Arc::new(CachedPartStore::new(parts)),
                Arc::new(CachedLedger::new(ledger)),
            )
        } else {
            (Arc::new(parts), Arc::new(ledger))
        };

        Ok(Self::from_parts(parts, ledger, config.max_consume_attempts))
    }

    /// Build on existing store and ledger implementations
    pub fn from_parts(parts: SharedParts, ledger: SharedLedger, max_attempts: u32) -> Self {
        Self {
            consumption: ConsumptionService::new(parts.clone(), ledger.clone())
                .with_max_attempts(max_attempts),
            admin: AdminService::new(parts.clone()).with_max_attempts(max_attempts),
            reports: ReportFacade::new(parts.clone(), ledger.clone()),
            parts,
            ledger,
        }
    }

    pub fn parts(&self) -> &SharedParts {
        &self.parts
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }
}
