//! Reference genome length from the tree statistics table.

use clap::ValueEnum;
use clockroot_table::Table;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use strum::{Display, EnumIter, IntoEnumIterator};

/// Column of the statistics table that holds the reference length.
///
/// Older trees wrote `refseq_length`, newer trees write `ref_length`.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumIter, PartialEq, Serialize, ValueEnum,
)]
pub enum RefLengthColumn {
    #[default]
    #[strum(serialize = "ref_length")]
    RefLength,
    #[strum(serialize = "refseq_length")]
    RefseqLength,
}

/// Returns the reference length from the last row of a statistics table.
///
/// The length must be a positive integer.
///
/// ## Examples
///
/// ```rust
/// use clockroot::stats::{reference_length, RefLengthColumn};
/// use clockroot_table::Table;
///
/// let mut table = Table::with_headers(["tree", "refseq_length", "ref_length"]);
/// table.add_row(["hiv", "9181", "9719"])?;
/// assert_eq!(reference_length(&table, RefLengthColumn::RefLength)?, 9719);
/// assert_eq!(reference_length(&table, RefLengthColumn::RefseqLength)?, 9181);
///
/// table.add_row(["hiv", "0", "0"])?;
/// assert!(reference_length(&table, RefLengthColumn::RefLength).is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn reference_length(table: &Table, column: RefLengthColumn) -> Result<usize, Report> {
    let header = column.to_string();
    let index = table.get_header_index(&header).with_suggestion(|| {
        format!(
            "Known reference length columns: {}. Choose with --ref-length-column.",
            RefLengthColumn::iter().join(", ")
        )
    })?;

    let value = table
        .rows
        .last()
        .ok_or_else(|| eyre!("Statistics table has no rows."))?
        .get(index)
        .map(|v| v.trim())
        .unwrap_or_default();

    let length: i64 = value
        .parse()
        .wrap_err_with(|| eyre!("The {header} value is not an integer: {value:?}"))?;
    if length <= 0 {
        return Err(eyre!("The {header} value must be positive: {length}"));
    }

    Ok(length as usize)
}

/// Read the reference length from a statistics file (ex. `output_stats.tsv`).
pub fn read_reference_length<P>(path: &P, column: RefLengthColumn) -> Result<usize, Report>
where
    P: AsRef<Path> + Debug,
{
    let table = Table::read(path, Some('\t'))?;
    reference_length(&table, column).wrap_err_with(|| eyre!("Failed to get reference length from {path:?}"))
}
