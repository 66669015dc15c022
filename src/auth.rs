//! Capability checks consumed from the caller's session.
//!
//! How `can_edit_stock` and `is_admin` are computed is decided outside the
//! ledger; the ledger only checks them.
use std::fmt;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    EditStock,
    Admin,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::EditStock => f.write_str("edit-stock"),
            Capability::Admin => f.write_str("admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub acting_user: String,
    pub can_edit_stock: bool,
    pub is_admin: bool,
}

impl Caller {
    pub fn new(acting_user: impl Into<String>, can_edit_stock: bool, is_admin: bool) -> Self {
        Self {
            acting_user: acting_user.into(),
            can_edit_stock,
            is_admin,
        }
    }

    /// A technician desk account: may consume stock, may not edit records
    pub fn technician(acting_user: impl Into<String>) -> Self {
        Self::new(acting_user, true, false)
    }

    pub fn admin(acting_user: impl Into<String>) -> Self {
        Self::new(acting_user, true, true)
    }

    pub fn holds(&self, capability: Capability) -> bool {
        match capability {
            Capability::EditStock => self.can_edit_stock,
            Capability::Admin => self.is_admin,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.holds(capability) {
            return Ok(());
        }
        Err(LedgerError::Forbidden {
            user: self.acting_user.clone(),
            capability,
        })
    }
}

/// Pick the technician a consumption is attributed to. A non-empty free-text
/// override wins, otherwise the roster choice must name a roster member.
pub fn resolve_technician(
    roster: &[String],
    choice: Option<&str>,
    free_text: Option<&str>,
) -> Result<String> {
    if let Some(name) = free_text.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(name.to_owned());
    }

    match choice.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) if roster.iter().any(|member| member == name) => Ok(name.to_owned()),
        _ => Err(LedgerError::InvalidTechnician),
    }
}
