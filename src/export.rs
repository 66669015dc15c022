//! Spreadsheet-friendly CSV exports.
//!
//! Layout: UTF-8 BOM, a `sep=,` hint line, the header row, then one row per
//! record. Every cell is quoted with inner quotes doubled, so commas and
//! quotes in free text cannot shift columns.
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::{LedgerError, Result};
use crate::movement::MovementRecord;
use crate::part::PartRecord;

pub const BOM: &str = "\u{FEFF}";
pub const SEPARATOR_HINT: &str = "sep=,";

pub const PART_COLUMNS: [&str; 6] = ["Component", "Model", "Part Code", "Location", "Stock", "Status"];

pub const MOVEMENT_COLUMNS: [&str; 7] = [
    "Timestamp",
    "User",
    "Technician",
    "Part Code",
    "Old Quantity",
    "New Quantity",
    "Location",
];

fn render<const N: usize>(columns: [&str; N], rows: impl IntoIterator<Item = [String; N]>) -> Result<String> {
    let mut head = Vec::from(BOM.as_bytes());
    head.extend_from_slice(SEPARATOR_HINT.as_bytes());
    head.push(b'\n');

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(head);

    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let mut bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::Export(e.into_error().into()))?;
    // rows are joined, not terminated
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }

    String::from_utf8(bytes).map_err(|e| LedgerError::Corrupt(e.to_string()))
}

pub fn parts_csv(records: &[PartRecord]) -> Result<String> {
    render(
        PART_COLUMNS,
        records.iter().map(|r| {
            [
                r.category.clone(),
                r.model.clone(),
                r.part_code.clone(),
                r.location.clone(),
                r.quantity().to_string(),
                r.status().label().to_owned(),
            ]
        }),
    )
}

pub fn movements_csv(records: &[MovementRecord]) -> Result<String> {
    render(
        MOVEMENT_COLUMNS,
        records.iter().map(|m| {
            [
                m.timestamp.to_string(),
                m.acting_user.clone(),
                m.technician.clone(),
                m.part_code.clone(),
                m.quantity_before.to_string(),
                m.quantity_after.to_string(),
                m.location.clone(),
            ]
        }),
    )
}
