//! `clockroot` reroots a viral phylogeny to its oldest ancestor.
//!
//! A tree directory holds a phylogeny in two formats (Newick and a compressed
//! mutation-annotated tree), sample metadata and the reference genome. `clockroot`:
//!
//! 1. Checks that enough samples have a collection date to fit a molecular clock.
//! 1. Rescales the Newick branch lengths to substitutions per site and runs `treetime clock`.
//! 1. Picks the oldest internal node from the root-to-tip regression.
//! 1. Reroots the mutation-annotated tree to that node with `matUtils`, which also
//!    rewrites the reference as it would be at the new root.
//! 1. Carries the new reference into the GenBank annotations, recomputing every
//!    CDS translation.
//! 1. Exports the rerooted tree for Taxonium with `usher_to_taxonium`.
//!
//! The external tools are run as subprocesses; `clockroot` checks their inputs and outputs.

pub mod annotation;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dates;
pub mod export;
pub mod pipeline;
pub mod reroot;
pub mod run;
pub mod sequence;
pub mod stages;
pub mod stats;
mod utils;

#[doc(inline)]
pub use crate::cli::Cli;
#[doc(inline)]
pub use crate::pipeline::{Pipeline, RunContext, Stage, StageOutcome};
#[doc(inline)]
pub use utils::verbosity::Verbosity;
