//! Carry a substitute reference sequence into an annotated GenBank record.
//!
//! The record keeps its name, accession and references. Only the sequence and
//! the `translation` of each `CDS` are replaced.

use crate::sequence;
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use gb_io::seq::{Feature, Location, Seq};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Feature types whose extent is recomputed from the new sequence.
const SEQUENCE_FEATURES: [&str; 3] = ["CDS", "gene", "mRNA"];

// ----------------------------------------------------------------------------
// Args

/// Transfer annotations arguments.
#[derive(Clone, Debug, Default, Deserialize, Parser, Serialize)]
#[clap(verbatim_doc_comment)]
pub struct Args {
    /// Input GenBank flat file.
    #[clap(long, required = true)]
    pub gbff: PathBuf,

    /// Accession of the record in the GenBank file to be altered.
    #[clap(long, required = true)]
    pub accession: String,

    /// FASTA file with exactly one sequence, same length as the record.
    #[clap(long, required = true)]
    pub fasta: PathBuf,

    /// Output GenBank flat file.
    #[clap(long, required = true)]
    pub output: PathBuf,
}

// ----------------------------------------------------------------------------
// Strand

/// Orientation of a feature relative to the record sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

/// Returns the 0-based, half-open span and strand of a simple location.
///
/// Composite locations (`join`, `order`, ...) return [`None`].
///
/// ```rust
/// use clockroot::annotation::{simple_span, Strand};
/// use gb_io::seq::Location;
///
/// let location = Location::simple_range(10, 16);
/// assert_eq!(simple_span(&location), Some((10, 16, Strand::Forward)));
///
/// let location = Location::Complement(Box::new(location));
/// assert_eq!(simple_span(&location), Some((10, 16, Strand::Reverse)));
///
/// let location = Location::Join(vec![Location::simple_range(0, 3), Location::simple_range(5, 8)]);
/// assert_eq!(simple_span(&location), None);
/// ```
pub fn simple_span(location: &Location) -> Option<(i64, i64, Strand)> {
    match location {
        Location::Range((start, _), (end, _)) => Some((*start, *end, Strand::Forward)),
        Location::Complement(inner) => match inner.as_ref() {
            Location::Range((start, _), (end, _)) => Some((*start, *end, Strand::Reverse)),
            _ => None,
        },
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Transfer

/// Returns a copy of `record` whose sequence is replaced by `sequence`.
///
/// - The replacement must be exactly as long as the record sequence.
/// - Every `CDS`, `gene` and `mRNA` with a simple location is sliced from the new
///   sequence, reverse complemented on the reverse strand.
/// - Each such `CDS` gets a `translation` recomputed with the standard code, without
///   stopping at stop codons.
/// - Composite locations are copied unchanged.
///
/// ## Examples
///
/// ```rust
/// use clockroot::annotation::transfer;
/// use gb_io::seq::{Feature, Location, Seq};
///
/// let mut record = Seq::empty();
/// record.name = Some("TEST".to_string());
/// record.seq = b"ATGAAATTT".to_vec();
/// record.features.push(Feature {
///     kind: "CDS".into(),
///     location: Location::simple_range(0, 9),
///     qualifiers: vec![("translation".into(), Some("MKF".to_string()))],
/// });
///
/// let altered = transfer(&record, b"ATGAAACCC")?;
/// assert_eq!(altered.seq, b"ATGAAACCC");
/// assert_eq!(altered.features[0].qualifiers[0].1.as_deref(), Some("MKP"));
///
/// assert!(transfer(&record, b"ATGAAACC").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn transfer(record: &Seq, sequence: &[u8]) -> Result<Seq, Report> {
    let name = record.name.as_deref().unwrap_or_default();
    if record.seq.len() != sequence.len() {
        return Err(eyre!(
            "The replacement sequence must match the length of record {name}: {} != {}",
            sequence.len(),
            record.seq.len()
        )
        .suggestion("Sequences are never truncated or padded, was the right reference used?"));
    }

    let mut altered = record.clone();
    altered.seq = sequence.to_vec();
    altered.len = Some(sequence.len());

    for feature in altered.features.iter_mut() {
        if !SEQUENCE_FEATURES.contains(&&*feature.kind) {
            continue;
        }
        let Some((start, end, strand)) = simple_span(&feature.location) else {
            debug!("Skipping composite {} location in record {name}: {:?}", feature.kind, feature.location);
            continue;
        };
        let slice = feature_slice(sequence, start, end, strand)
            .wrap_err_with(|| eyre!("Failed to transfer {} {:?}", feature.kind, feature.location))?;

        if &*feature.kind == "CDS" {
            set_translation(feature, sequence::translate(&slice));
        }
    }

    Ok(altered)
}

/// Slice `[start, end)` from the sequence, reverse complemented on the reverse strand.
fn feature_slice(sequence: &[u8], start: i64, end: i64, strand: Strand) -> Result<Vec<u8>, Report> {
    let (start, end) = match (usize::try_from(start), usize::try_from(end)) {
        (Ok(start), Ok(end)) if start <= end && end <= sequence.len() => (start, end),
        _ => {
            return Err(eyre!(
                "Feature span {start}..{end} is outside the {} bp sequence.",
                sequence.len()
            ))
        }
    };
    let slice = &sequence[start..end];
    Ok(match strand {
        Strand::Forward => slice.to_vec(),
        Strand::Reverse => sequence::reverse_complement(slice),
    })
}

/// Overwrite the first `translation` qualifier (dropping any others), or add one.
fn set_translation(feature: &mut Feature, translation: String) {
    let key: Cow<'static, str> = Cow::from("translation");
    let mut replaced = false;
    feature.qualifiers.retain_mut(|(k, value)| {
        if *k != key {
            return true;
        }
        if replaced {
            return false;
        }
        *value = Some(translation.clone());
        replaced = true;
        true
    });
    if !replaced {
        feature.qualifiers.push((key, Some(translation)));
    }
}

// ----------------------------------------------------------------------------
// Read and Write

/// Returns true if the record is identified by this accession.
///
/// The version (ex. `NC_045512.2`) is checked first, then the primary accession,
/// then the LOCUS name.
pub fn matches_accession(record: &Seq, accession: &str) -> bool {
    record.version.as_deref() == Some(accession)
        || record
            .accession
            .as_deref()
            .and_then(|a| a.split_whitespace().next())
            .is_some_and(|a| a == accession)
        || record.name.as_deref() == Some(accession)
}

/// Read the record with this accession from a GenBank file (gzip-compressed if it ends in `.gz`).
pub fn read_record<P>(path: &P, accession: &str) -> Result<Seq, Report>
where
    P: AsRef<Path> + Debug,
{
    let reader = clockroot_table::open(path)
        .suggestion("Is the reference GenBank file in the tree directory?")?;

    for (i, record) in gb_io::reader::SeqReader::new(reader).enumerate() {
        let record = record.map_err(|e| eyre!("Failed to parse GenBank record {} of {path:?}: {e}", i + 1))?;
        if matches_accession(&record, accession) {
            return Ok(record);
        }
    }

    Err(eyre!("Accession {accession} not found in GenBank file {path:?}")
        .suggestion("The accession is matched against the VERSION, ACCESSION and LOCUS lines."))
}

/// Write a single record as a GenBank file.
pub fn write_record<P>(record: &Seq, path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug,
{
    let file = File::create(path).wrap_err_with(|| eyre!("Unable to create file: {path:?}"))?;
    gb_io::writer::write(BufWriter::new(file), record)
        .wrap_err_with(|| eyre!("Unable to write GenBank record: {path:?}"))?;
    Ok(())
}

/// Read the record and the replacement FASTA, transfer, and write the new record.
pub fn transfer_file(args: &Args) -> Result<Seq, Report> {
    info!("Reading replacement sequence: {:?}", args.fasta);
    let replacement = sequence::read_single_fasta(&args.fasta)?;

    info!("Reading record {}: {:?}", args.accession, args.gbff);
    let record = read_record(&args.gbff, &args.accession)?;

    if replacement.id != args.accession {
        warn!("Replacement sequence {} is named differently from record {}.", replacement.id, args.accession);
    }
    let altered = transfer(&record, &replacement.sequence)
        .wrap_err_with(|| eyre!("Failed to transfer {:?} into {:?}", args.fasta, args.gbff))?;

    info!("Writing altered record: {:?}", args.output);
    write_record(&altered, &args.output)?;

    Ok(altered)
}
