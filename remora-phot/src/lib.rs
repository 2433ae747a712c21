//! Conversion of DOLPHOT photometry into named, sky-referenced tables.
//!
//! A field observed with DOLPHOT comes as several partitions, each a raw
//! whitespace-delimited photometry file plus a `.columns` description.
//! This crate names the columns, keeps the ones of interest, writes each
//! partition as a FITS binary table and merges the partitions into a
//! single catalog with RA/DEC from the field's WCS.

pub mod augment;
pub mod columns;
pub mod config;
pub mod error;
pub mod fits;
pub mod layout;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod rules;
pub mod select;
pub mod table;

pub use augment::{add_wcs, load_wcs, PIXEL_ORIGIN};
pub use columns::{
    classify, parse_description_line, resolve_description, ColumnDescription, ColumnKind,
    ColumnName, ColumnTable,
};
pub use config::PipelineConfig;
pub use error::{PhotError, Result};
pub use layout::FieldLayout;
pub use loader::{load_table, MISSING_SENTINEL};
pub use merge::{merge_field, merge_partitions, partition_boundary, MergeOutput};
pub use pipeline::{compress_raw, convert_partition, run_field};
pub use rules::{CompiledRules, NamingRules, Rule, RuleSet};
pub use select::{select_columns, Selection, DEFAULT_SELECTION};
pub use table::PhotTable;
