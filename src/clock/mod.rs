//! Molecular clock inference with `treetime clock`, and selection of the oldest internal node.

use crate::pipeline::{FailurePolicy, Layout, ToolCommand};
use clockroot_table::Table;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

/// Prefix of the internal nodes in the root-to-tip report.
pub const INTERNAL_NODE_PREFIX: &str = "node_";

/// The internal node with the earliest estimated date.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct OldestNode {
    pub name: String,
    pub date: f64,
}

/// Returns the `treetime clock` command for a tree directory.
pub fn treetime_command(
    program: &str,
    layout: &Layout,
    sequence_length: usize,
    policy: FailurePolicy,
) -> ToolCommand {
    ToolCommand::new(program)
        .arg("clock")
        .arg("--sequence-length")
        .arg(sequence_length.to_string())
        .arg("--tree")
        .arg(layout.scaled_newick())
        .arg("--dates")
        .arg(layout.dates())
        .arg("--outdir")
        .arg(layout.treetime_dir())
        .output(layout.rtt())
        .log(layout.treetime_log())
        .policy(policy)
}

/// Select the internal node (`node_*`) with the minimum date.
///
/// Rows are `name, date, ...`, other rows are ignored. Ties go to the first row.
///
/// ## Examples
///
/// ```rust
/// use clockroot::clock::select_oldest;
/// let rows = [["node_A", "5.0"], ["node_B", "2.0"], ["node_C", "8.0"], ["leaf", "1.0"]];
/// assert_eq!(select_oldest(rows)?.name, "node_B");
///
/// let rows = [["#name", "date"], ["leaf", "1.0"]];
/// assert!(select_oldest(rows).is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn select_oldest<I, R, S>(rows: I) -> Result<OldestNode, Report>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut oldest: Option<OldestNode> = None;

    for row in rows {
        let row = row.as_ref();
        let Some(name) = row.first().map(|n| n.as_ref().trim()) else { continue };
        if !name.starts_with(INTERNAL_NODE_PREFIX) {
            continue;
        }
        let value = row.get(1).map(|d| d.as_ref().trim()).unwrap_or_default();
        let date: f64 = value
            .parse()
            .wrap_err_with(|| eyre!("Date of node {name} is not a number: {value:?}"))?;

        if oldest.as_ref().map_or(true, |o| date < o.date) {
            oldest = Some(OldestNode { name: name.to_string(), date });
        }
    }

    oldest.ok_or_else(|| eyre!("No internal nodes ({INTERNAL_NODE_PREFIX}*) with a date were found."))
}

/// Read the oldest internal node from a root-to-tip report (`rtt.csv`).
pub fn read_oldest<P>(path: &P) -> Result<OldestNode, Report>
where
    P: AsRef<Path> + Debug,
{
    let table = Table::read(path, Some(','))
        .suggestion("Did treetime finish successfully? See treetime.log.")?;
    // the header line is scanned too, it never looks like an internal node
    select_oldest(std::iter::once(&table.headers).chain(&table.rows))
        .wrap_err_with(|| eyre!("Failed to get oldest node from {path:?}"))
}
