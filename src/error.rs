use crate::auth::Capability;
use crate::part::PartRecord;
use crate::types::PartId;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Invalid part record: {0}")]
    Validation(String),
    #[error("A technician must be named for every consumption")]
    InvalidTechnician,
    #[error("Part {0} was not found")]
    NotFound(PartId),
    #[error("User '{user}' lacks the {capability} capability")]
    Forbidden { user: String, capability: Capability },
    #[error("Part {0} is already out of stock")]
    AlreadyEmpty(PartId),
    #[error("Part {id} was modified concurrently, gave up after {attempts} attempt(s)")]
    Conflict { id: PartId, attempts: u32 },
    // the stock write went through, only the ledger append failed
    #[error("Stock updated, but audit log failed: {source}")]
    AuditIncomplete {
        part: Box<PartRecord>,
        source: Box<LedgerError>,
    },
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Stored data is unreadable: {0}")]
    Corrupt(String),
    #[error("Failed to mint an identifier: {0}")]
    Identifier(String),
    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl LedgerError {
    /// Business-rule rejections, reported to the caller as-is.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation(_)
                | LedgerError::InvalidTechnician
                | LedgerError::NotFound(_)
                | LedgerError::Forbidden { .. }
                | LedgerError::AlreadyEmpty(_)
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }
}

impl From<minicbor::decode::Error> for LedgerError {
    fn from(value: minicbor::decode::Error) -> Self {
        LedgerError::Corrupt(value.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for LedgerError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        LedgerError::Corrupt(value.to_string())
    }
}
