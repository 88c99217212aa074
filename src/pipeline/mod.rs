//! An ordered list of [`Stage`]s sharing a [`RunContext`].

mod layout;
mod tool;

pub use layout::Layout;
pub use tool::{FailurePolicy, ToolCommand, ToolStatus};

use crate::clock::OldestNode;
use crate::dates::SampleDates;
use crate::run;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ----------------------------------------------------------------------------
// Stage

/// Whether the pipeline should go on after a stage.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum StageOutcome {
    #[default]
    Continue,
    /// End the pipeline early without an error.
    Halt(String),
}

/// One step of the pipeline.
pub trait Stage {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report>;
}

// ----------------------------------------------------------------------------
// Run Context

/// Everything handed from one stage to the next.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RunContext {
    pub args: run::Args,
    pub layout: Layout,
    pub dates: Option<SampleDates>,
    pub reference_length: Option<usize>,
    pub oldest_node: Option<OldestNode>,
    pub refseq_acc: Option<String>,
}

impl RunContext {
    pub fn new(args: &run::Args) -> Self {
        RunContext { args: args.clone(), layout: Layout::new(&args.tree_dir), ..Default::default() }
    }

    pub fn dates(&self) -> Result<&SampleDates, Report> {
        self.dates.as_ref().ok_or_else(|| eyre!("Sample dates have not been read yet."))
    }

    pub fn reference_length(&self) -> Result<usize, Report> {
        self.reference_length.ok_or_else(|| eyre!("Reference length has not been read yet."))
    }

    pub fn oldest_node(&self) -> Result<&OldestNode, Report> {
        self.oldest_node.as_ref().ok_or_else(|| eyre!("Oldest node has not been selected yet."))
    }

    pub fn refseq_acc(&self) -> Result<&str, Report> {
        self.refseq_acc.as_deref().ok_or_else(|| eyre!("Reference accession has not been read yet."))
    }
}

// ----------------------------------------------------------------------------
// Pipeline

/// Stages run in order until one halts or errors.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    pub fn stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the stages, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, context: &mut RunContext) -> Result<StageOutcome, Report> {
        let n = self.stages.len();
        for (i, stage) in self.stages.iter().enumerate() {
            info!("Stage {}/{n}: {}", i + 1, stage.name());
            let outcome = stage.run(context).wrap_err_with(|| eyre!("Stage {} failed.", stage.name()))?;
            if let StageOutcome::Halt(reason) = &outcome {
                warn!("Stopping after stage {}: {reason}", stage.name());
                return Ok(outcome);
            }
        }
        Ok(StageOutcome::Continue)
    }
}

// ----------------------------------------------------------------------------
// Summary

/// Record of a finished run, written as JSON to the tree directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Summary {
    pub args: run::Args,
    pub date_report: Option<crate::dates::DateReport>,
    pub reference_length: Option<usize>,
    pub oldest_node: Option<OldestNode>,
    pub refseq_acc: Option<String>,
    pub outcome: StageOutcome,
}

impl Summary {
    pub fn new(context: &RunContext, outcome: StageOutcome) -> Self {
        Summary {
            args: context.args.clone(),
            date_report: context.dates.as_ref().map(|dates| dates.report),
            reference_length: context.reference_length,
            oldest_node: context.oldest_node.clone(),
            refseq_acc: context.refseq_acc.clone(),
            outcome,
        }
    }

    /// Read summary from file.
    pub fn read(path: &Path) -> Result<Summary, Report> {
        let summary = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read file: {path:?}."))?;
        let summary = serde_json::from_str(&summary)
            .wrap_err_with(|| format!("Failed to parse file: {path:?}"))?;
        Ok(summary)
    }

    /// Write summary to file.
    pub fn write(&self, path: &Path) -> Result<(), Report> {
        let output = serde_json::to_string_pretty(self).wrap_err("Failed to serialize summary.")?;
        std::fs::write(path, format!("{output}\n"))
            .wrap_err_with(|| format!("Failed to write file: {path:?}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
