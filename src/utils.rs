//! Utility functions for identifiers

use bech32::Bech32m;
use uuid7::uuid7;

use crate::error::{LedgerError, Result};

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> Result<String> {
    let hrp = bech32::Hrp::parse(hrp).map_err(|e| LedgerError::Identifier(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .map_err(|e| LedgerError::Identifier(e.to_string()))
}
