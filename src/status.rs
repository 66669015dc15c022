//! Stock status, always derived from quantity
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Highest quantity still reported as low stock.
pub const LOW_STOCK_CEILING: i64 = 10;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cbor(index_only)]
pub enum Status {
    #[n(0)]
    InStock,
    #[n(1)]
    LowStock,
    #[n(2)]
    OutOfStock,
}

/// The single source of truth for stock status. Every write path that
/// touches a quantity goes through here.
pub fn derive_status(quantity: i64) -> Status {
    match quantity {
        q if q <= 0 => Status::OutOfStock,
        q if q <= LOW_STOCK_CEILING => Status::LowStock,
        _ => Status::InStock,
    }
}

impl Status {
    pub const ALL: [Status; 3] = [Status::InStock, Status::LowStock, Status::OutOfStock];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InStock => "in_stock",
            Status::LowStock => "low_stock",
            Status::OutOfStock => "out_of_stock",
        }
    }

    /// Human readable form used in exports
    pub fn label(&self) -> &'static str {
        match self {
            Status::InStock => "In Stock",
            Status::LowStock => "Low Stock",
            Status::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalised.as_str() {
            "instock" => Ok(Status::InStock),
            "lowstock" => Ok(Status::LowStock),
            "outofstock" => Ok(Status::OutOfStock),
            _ => Err(LedgerError::Validation(format!("unknown status '{s}'"))),
        }
    }
}
