//! The [`Stage`]s of a rerooting run, in run order.

use crate::annotation;
use crate::clock;
use crate::config::RerootConfig;
use crate::dates::SampleDates;
use crate::export;
use crate::pipeline::{FailurePolicy, Pipeline, RunContext, Stage, StageOutcome, ToolStatus};
use crate::reroot;
use crate::stats;
use clockroot_phylo::Phylogeny;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::info;

/// Returns the full rerooting pipeline.
///
/// ```rust
/// let pipeline = clockroot::stages::pipeline();
/// assert_eq!(
///     pipeline.names(),
///     ["date gate", "scale branches", "dates table", "clock", "reroot", "transfer annotations", "export"]
/// );
/// ```
pub fn pipeline() -> Pipeline {
    Pipeline::new()
        .stage(DateGate)
        .stage(ScaleBranches)
        .stage(DatesTable)
        .stage(ClockRoot)
        .stage(Reroot)
        .stage(TransferAnnotations)
        .stage(Export)
}

// ----------------------------------------------------------------------------
// Date Gate

/// Halt unless enough samples have a real date.
pub struct DateGate;

impl Stage for DateGate {
    fn name(&self) -> &'static str {
        "date gate"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let path = context.layout.metadata();
        info!("Reading dates: {path:?}");
        let dates = SampleDates::read(&path)?;
        let report = dates.report;
        let min_real_dates = context.args.min_real_dates;
        context.dates = Some(dates);

        if report.passes(min_real_dates) {
            info!("{}/{} samples have a real date ({:.2}).", report.real, report.total, report.ratio);
            return Ok(StageOutcome::Continue);
        }

        let reason = format!(
            "Tree {} has too low a proportion of dates ({:.2} < {min_real_dates:.2}), not running treetime.",
            context.layout.name(),
            report.ratio,
        );
        let log = context.layout.treetime_log();
        std::fs::write(&log, format!("{reason}\n")).wrap_err_with(|| eyre!("Unable to write log: {log:?}"))?;
        Ok(StageOutcome::Halt(reason))
    }
}

// ----------------------------------------------------------------------------
// Scale Branches

/// Rescale branch lengths from mutations to substitutions per site.
pub struct ScaleBranches;

impl Stage for ScaleBranches {
    fn name(&self) -> &'static str {
        "scale branches"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let layout = &context.layout;
        let length = stats::read_reference_length(&layout.stats(), context.args.ref_length_column)?;
        info!("Reference length: {length}");
        context.reference_length = Some(length);

        let input = layout.newick();
        info!("Reading tree: {input:?}");
        let mut phylogeny = Phylogeny::read(&input)?;
        phylogeny.scale_branches(1.0 / length as f64);

        let output = layout.scaled_newick();
        info!("Writing scaled tree: {output:?}");
        phylogeny.write(&output)?;

        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Dates Table

/// Write normalized dates for treetime.
pub struct DatesTable;

impl Stage for DatesTable {
    fn name(&self) -> &'static str {
        "dates table"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let output = context.layout.dates();
        info!("Writing dates: {output:?}");
        context.dates()?.write(&output)?;
        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Clock Root

/// Run treetime and select the oldest internal node.
pub struct ClockRoot;

impl Stage for ClockRoot {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let policy = match context.args.tolerate_clock_failure {
            true => FailurePolicy::Tolerant,
            false => FailurePolicy::Fatal,
        };
        let command =
            clock::treetime_command(&context.args.treetime, &context.layout, context.reference_length()?, policy);

        if let ToolStatus::Failed(reason) = command.run()? {
            return Ok(StageOutcome::Halt(format!("No oldest node can be chosen, {reason}")));
        }

        let oldest = clock::read_oldest(&context.layout.rtt())?;
        info!("Oldest node: {} ({})", oldest.name, oldest.date);
        context.oldest_node = Some(oldest);
        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Reroot

/// Reroot the visualization tree and its reference to the oldest node.
pub struct Reroot;

impl Stage for Reroot {
    fn name(&self) -> &'static str {
        "reroot"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let layout = &context.layout;
        let config = RerootConfig::read(&layout.config())?;
        let accession = config.refseq_acc;
        info!("Reference accession: {accession}");

        let required = [layout.viz_pb(), layout.reference_fasta(&accession)];
        if let Some(missing) = required.iter().find(|path| !path.exists()) {
            return Err(eyre!("Input for rerooting not found: {missing:?}"));
        }

        let node = &context.oldest_node()?.name;
        reroot::matutils_command(&context.args.matutils, layout, node, &accession).run()?;
        info!("Rerooted tree: {:?}", layout.rerooted_pb());

        context.refseq_acc = Some(accession);
        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Transfer Annotations

/// Carry the rerooted reference into the GenBank record.
pub struct TransferAnnotations;

impl Stage for TransferAnnotations {
    fn name(&self) -> &'static str {
        "transfer annotations"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let layout = &context.layout;
        let accession = context.refseq_acc()?;
        let args = annotation::Args {
            gbff: layout.reference_gbff(accession),
            accession: accession.to_string(),
            fasta: layout.rerooted_fasta(accession),
            output: layout.rerooted_gbff(accession),
        };
        annotation::transfer_file(&args)?;
        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Export

/// Export the rerooted tree for Taxonium.
pub struct Export;

impl Stage for Export {
    fn name(&self) -> &'static str {
        "export"
    }

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let layout = &context.layout;
        let columns = export::metadata_columns(&layout.metadata())?;
        let command =
            export::taxonium_command(&context.args.usher_to_taxonium, layout, context.refseq_acc()?, &columns);
        command.run()?;
        info!("Taxonium tree: {:?}", layout.taxonium());
        Ok(StageOutcome::Continue)
    }
}
