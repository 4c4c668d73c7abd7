use polars::prelude::*;

use crate::error::AttachError;
use crate::schema::{attach, pair};

/// Serialize a result table as delimited text with a header row.
pub fn write_delimited(table: &DataFrame, separator: u8) -> Result<String, AttachError> {
    let mut buf = Vec::new();
    let mut table = table.clone();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(separator)
        .finish(&mut table)?;
    String::from_utf8(buf)
        .map_err(|e| AttachError::Validation(format!("export produced non-UTF8 bytes: {e}")))
}

/// Attach-rate table in the export column order: identifier, rate, counts.
pub fn attach_rates_delimited(rates: &DataFrame, separator: u8) -> Result<String, AttachError> {
    let ordered = rates.select([
        attach::MACHINE_CODE,
        attach::ITEM_CODE,
        attach::ATTACH_RATE,
        attach::DISTINCT_ORDER_COUNT,
        attach::TOTAL_ORDERS,
    ])?;
    write_delimited(&ordered, separator)
}

/// Pair table in the export column order: pair identifier, support, count.
pub fn pairs_delimited(pairs: &DataFrame, separator: u8) -> Result<String, AttachError> {
    let ordered = pairs.select([
        pair::ITEM_A,
        pair::ITEM_B,
        pair::SUPPORT,
        pair::CO_OCCURRENCE_COUNT,
    ])?;
    write_delimited(&ordered, separator)
}
