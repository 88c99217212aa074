//! Export of the rerooted tree for Taxonium with `usher_to_taxonium`.

use crate::pipeline::{FailurePolicy, Layout, ToolCommand};
use clockroot_table::Table;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use std::fmt::Debug;
use std::path::Path;

/// Returns the metadata column names, in file order.
pub fn metadata_columns<P>(path: &P) -> Result<Vec<String>, Report>
where
    P: AsRef<Path> + Debug,
{
    Table::read_headers(path, Some('\t')).wrap_err_with(|| eyre!("Failed to get columns from {path:?}"))
}

/// Returns the `usher_to_taxonium` command for the rerooted tree.
///
/// ```rust
/// use clockroot::export::taxonium_command;
/// use clockroot::pipeline::Layout;
///
/// let columns = ["strain", "date", "country"].map(String::from);
/// let command = taxonium_command("usher_to_taxonium", &Layout::new("hiv"), "NC_001802.1", &columns);
/// assert_eq!(
///     command.command_line(),
///     "usher_to_taxonium -i hiv/timetree_rerooted.pb.gz -m hiv/metadata.tsv.gz \
///      --genbank hiv/treetime_rerooted_NC_001802.1.gbff -c strain,date,country \
///      --title 'Treetime-rerooted hiv' -o hiv/timetree_rerooted.jsonl.gz"
/// );
/// ```
pub fn taxonium_command(program: &str, layout: &Layout, accession: &str, columns: &[String]) -> ToolCommand {
    ToolCommand::new(program)
        .arg("-i")
        .arg(layout.rerooted_pb())
        .arg("-m")
        .arg(layout.metadata())
        .arg("--genbank")
        .arg(layout.rerooted_gbff(accession))
        .arg("-c")
        .arg(columns.join(","))
        .arg("--title")
        .arg(format!("Treetime-rerooted {}", layout.name()))
        .arg("-o")
        .arg(layout.taxonium())
        .output(layout.taxonium())
        .policy(FailurePolicy::Fatal)
}
