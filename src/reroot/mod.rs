//! Rerooting the visualization tree with `matUtils extract`.

use crate::pipeline::{FailurePolicy, Layout, ToolCommand};

/// Returns the `matUtils extract` command that reroots `viz.pb.gz` to `node`.
///
/// The tool also writes the reference as it would be at the new root.
///
/// ```rust
/// use clockroot::pipeline::Layout;
/// use clockroot::reroot::matutils_command;
///
/// let command = matutils_command("matUtils", &Layout::new("hiv"), "node_7", "NC_001802.1");
/// assert_eq!(
///     command.command_line(),
///     "matUtils extract -i hiv/viz.pb.gz --reroot node_7 --input-fasta hiv/NC_001802.1.fa \
///      --write-reroot-reference hiv/treetime_rerooted_NC_001802.1.fa -o hiv/timetree_rerooted.pb.gz"
/// );
/// ```
pub fn matutils_command(program: &str, layout: &Layout, node: &str, accession: &str) -> ToolCommand {
    ToolCommand::new(program)
        .arg("extract")
        .arg("-i")
        .arg(layout.viz_pb())
        .arg("--reroot")
        .arg(node)
        .arg("--input-fasta")
        .arg(layout.reference_fasta(accession))
        .arg("--write-reroot-reference")
        .arg(layout.rerooted_fasta(accession))
        .arg("-o")
        .arg(layout.rerooted_pb())
        .output(layout.rerooted_pb())
        .output(layout.rerooted_fasta(accession))
        .policy(FailurePolicy::Fatal)
}
