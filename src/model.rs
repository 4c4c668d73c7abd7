use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;

use crate::attach;
use crate::error::AttachError;
use crate::pairs;
use crate::resolve::{self, ColumnMap};
use crate::schema::{line, machine};

/// Non-fatal data-quality counters collected while deriving the tables.
///
/// These are surfaced next to the result tables instead of failing the load;
/// the affected rows are excluded from aggregation but never silently lost.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DataQuality {
    /// Rows whose line number was blank or not an integer. Classified as
    /// option lines.
    pub non_numeric_line_rows: usize,
    /// Surplus line-1 rows beyond the first within a single order.
    pub duplicate_machine_rows: usize,
    /// Option rows whose order has no line-1 machine row.
    pub orphaned_option_rows: usize,
}

/// Order-line dataset with its derived machine/option/joined tables.
///
/// Loading resolves the input columns, classifies lines, joins options to
/// their order's machine and records data-quality counts. All derived tables
/// are rebuilt from scratch on every load; the aggregation methods are pure
/// functions of the stored tables and their parameters.
#[derive(Debug)]
pub struct OrderLines {
    lines: DataFrame,
    machines: DataFrame,
    options: DataFrame,
    joined: DataFrame,
    quality: DataQuality,
}

impl OrderLines {
    // ── Loading ─────────────────────────────────────────────────────────────

    /// Load an order-lines CSV.
    ///
    /// All columns are read as strings; headers are resolved to the canonical
    /// fields (order id, line number, item code, optional description) via
    /// the alias tables in `schema::aliases`.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, AttachError> {
        let raw = read_csv_as_strings(path.as_ref())?;
        Self::from_dataframe(raw)
    }

    /// Build the model from an already-parsed table (e.g. an XLSX sheet
    /// decoded by the host). Column resolution and typing are applied the
    /// same way as for CSV input.
    pub fn from_dataframe(raw: DataFrame) -> Result<Self, AttachError> {
        if raw.height() == 0 {
            return Err(AttachError::EmptyDataset);
        }

        // Resolution normalizes whitespace itself, so the map holds the raw
        // header names exactly as they appear in the frame.
        let headers: Vec<String> = raw
            .get_column_names_str()
            .iter()
            .map(|c| c.to_string())
            .collect();
        let map = resolve::resolve_columns(&headers)?;

        let lines = canonicalize(raw, &map)?;
        let non_numeric_line_rows = lines.column(line::LINE_NUMBER)?.null_count();

        // Machine rows: line_number == 1. A null line number is never a
        // machine row.
        let is_machine = col(line::LINE_NUMBER).eq(lit(1)).fill_null(lit(false));

        let machine_rows = lines
            .clone()
            .lazy()
            .filter(is_machine.clone())
            .select([
                col(line::ORDER_ID),
                col(line::ITEM_CODE).alias(machine::MACHINE_CODE),
            ])
            .collect()?;

        // First line-1 row per order wins; a naive join against duplicate
        // machine rows would fan out and multiply every downstream count.
        let machines = machine_rows
            .clone()
            .lazy()
            .group_by_stable([col(machine::ORDER_ID)])
            .agg([col(machine::MACHINE_CODE).first()])
            .collect()?;
        let duplicate_machine_rows = machine_rows.height() - machines.height();

        let options = lines
            .clone()
            .lazy()
            .filter(is_machine.not())
            .select([
                col(line::ORDER_ID),
                col(line::ITEM_CODE),
                col(line::DESCRIPTION),
            ])
            .collect()?;

        // Inner join: an option attaches only to an existing machine. The
        // remainder are orphans.
        let joined = options
            .clone()
            .lazy()
            .join(
                machines.clone().lazy(),
                [col(line::ORDER_ID)],
                [col(machine::ORDER_ID)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;
        let orphaned_option_rows = options.height() - joined.height();

        let quality = DataQuality {
            non_numeric_line_rows,
            duplicate_machine_rows,
            orphaned_option_rows,
        };
        warn_on_quality_issues(&quality);

        Ok(Self {
            lines,
            machines,
            options,
            joined,
            quality,
        })
    }

    // ── Aggregation ─────────────────────────────────────────────────────────

    /// Attach-rate table over all machines, sorted by (machine_code, item_code).
    pub fn attach_rates(&self) -> Result<DataFrame, AttachError> {
        attach::attach_rates(&self.joined, &self.machines)
    }

    /// Attach rates for one machine, filtered to `min_rate` and truncated to
    /// the top `top_n` rows by descending rate. Presentation-layer shaping on
    /// top of [`attach_rates`](Self::attach_rates).
    pub fn top_attach_rates(
        &self,
        machine_code: &str,
        min_rate: f64,
        top_n: Option<usize>,
    ) -> Result<DataFrame, AttachError> {
        self.require_machine(machine_code)?;
        let rates = self.attach_rates()?;
        attach::filter_rates(&rates, machine_code, min_rate, top_n)
    }

    /// Option-pair co-occurrence table for one machine, sorted by descending
    /// count.
    pub fn option_pairs(&self, machine_code: &str) -> Result<DataFrame, AttachError> {
        pairs::pair_counts(&self.joined, &self.machines, machine_code)
    }

    /// Top `top_n` option pairs for one machine by descending count.
    pub fn top_option_pairs(
        &self,
        machine_code: &str,
        top_n: Option<usize>,
    ) -> Result<DataFrame, AttachError> {
        let all = self.option_pairs(machine_code)?;
        Ok(match top_n {
            Some(n) => all.head(Some(n)),
            None => all,
        })
    }

    /// Sorted distinct machine codes, for the host's machine selector.
    pub fn machine_codes(&self) -> Result<Vec<String>, AttachError> {
        let codes = self.machines.column(machine::MACHINE_CODE)?.str()?;
        let unique: BTreeSet<&str> = codes.into_iter().flatten().collect();
        Ok(unique.into_iter().map(|c| c.to_string()).collect())
    }

    // ── Properties ──────────────────────────────────────────────────────────

    pub fn lines(&self) -> &DataFrame {
        &self.lines
    }

    pub fn machines(&self) -> &DataFrame {
        &self.machines
    }

    pub fn options(&self) -> &DataFrame {
        &self.options
    }

    pub fn joined(&self) -> &DataFrame {
        &self.joined
    }

    pub fn quality(&self) -> DataQuality {
        self.quality
    }

    // ── Private helpers ─────────────────────────────────────────────────────

    fn require_machine(&self, machine_code: &str) -> Result<(), AttachError> {
        let codes = self.machines.column(machine::MACHINE_CODE)?.str()?;
        if codes.into_iter().flatten().any(|c| c == machine_code) {
            Ok(())
        } else {
            Err(AttachError::UnknownMachine(machine_code.to_string()))
        }
    }
}

/// Read a CSV file with all columns as String dtype, trimming whitespace
/// from column names.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, AttachError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Rename the resolved raw columns to canonical names and normalize types:
/// string ids and codes, integer line numbers (blank/non-numeric → null).
/// A missing description becomes a null string column so the schema of the
/// lines table is stable.
fn canonicalize(raw: DataFrame, map: &ColumnMap) -> Result<DataFrame, AttachError> {
    let mut selected = vec![
        col(map.order_id.as_str())
            .cast(DataType::String)
            .alias(line::ORDER_ID),
        col(map.line_number.as_str())
            .cast(DataType::String)
            .str()
            .strip_chars(lit(" \t\r\n"))
            .cast(DataType::Int64)
            .alias(line::LINE_NUMBER),
        col(map.item_code.as_str())
            .cast(DataType::String)
            .alias(line::ITEM_CODE),
    ];
    selected.push(match &map.description {
        Some(header) => col(header.as_str())
            .cast(DataType::String)
            .alias(line::DESCRIPTION),
        None => lit(NULL).cast(DataType::String).alias(line::DESCRIPTION),
    });

    let df = raw.lazy().select(selected).collect()?;
    Ok(df)
}

fn warn_on_quality_issues(quality: &DataQuality) {
    if quality.non_numeric_line_rows > 0 {
        tracing::warn!(
            rows = quality.non_numeric_line_rows,
            "line numbers that are blank or non-numeric were classified as option lines"
        );
    }
    if quality.duplicate_machine_rows > 0 {
        tracing::warn!(
            rows = quality.duplicate_machine_rows,
            "duplicate line-1 machine rows were reduced to the first per order"
        );
    }
    if quality.orphaned_option_rows > 0 {
        tracing::warn!(
            rows = quality.orphaned_option_rows,
            "option rows without a machine row were excluded from aggregation"
        );
    }
}
