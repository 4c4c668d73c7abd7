//! In-memory attach-rate and option-pair analytics over ERP order-line
//! exports.
//!
//! The crate is the aggregation core behind an interactive front end: the
//! host hands over an order-lines table (or a CSV path), selects a machine,
//! and reads back two result tables (per-option attach rates and option-pair
//! co-occurrence counts) plus data-quality diagnostics. Upload widgets, XLSX
//! decoding and download mechanics live in the host, not here.
//!
//! Pipeline, left to right: raw table → resolved canonical columns →
//! machine/option classification → option→machine join → aggregation.
//! Everything is rebuilt on each load; aggregation calls are pure functions
//! of the loaded tables and their parameters.

pub mod attach;
pub mod error;
pub mod export;
pub mod model;
pub mod pairs;
pub mod resolve;
pub mod schema;

pub use error::AttachError;
pub use model::{DataQuality, OrderLines};
pub use resolve::{normalize_header, resolve_columns, ColumnMap};
