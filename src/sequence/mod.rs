//! Nucleotide [`Record`]s read from FASTA, reverse complements and translation.

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use noodles::fasta;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::io::BufReader;
use std::path::Path;

/// Amino acids of the standard genetic code, codons ordered `TCAG` at each position.
const STANDARD_CODE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

// ----------------------------------------------------------------------------
// Record
// ----------------------------------------------------------------------------

/// A named nucleotide sequence.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Record {
    pub id: String,
    pub sequence: Vec<u8>,
}

impl Record {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Convert a noodles fasta record.
    pub fn from_fasta(fasta: &fasta::Record) -> Self {
        Record { id: fasta.name().to_string(), sequence: fasta.sequence().as_ref().to_vec() }
    }
}

/// Read a FASTA file that must contain exactly one record.
///
/// ## Examples
///
/// ```rust
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("NC_001802.1.fa");
/// std::fs::write(&path, ">NC_001802.1\nACGT\nAC\n")?;
/// let record = clockroot::sequence::read_single_fasta(&path)?;
/// assert_eq!(record.id, "NC_001802.1");
/// assert_eq!(record.sequence, b"ACGTAC");
///
/// std::fs::write(&path, ">A\nACGT\n>B\nACGT\n")?;
/// assert!(clockroot::sequence::read_single_fasta(&path).is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn read_single_fasta<P>(path: &P) -> Result<Record, Report>
where
    P: AsRef<Path> + Debug,
{
    let mut reader = clockroot_table::open(path).map(BufReader::new).map(fasta::Reader::new)?;

    let records = reader
        .records()
        .map(|result| {
            result
                .map(|record| Record::from_fasta(&record))
                .wrap_err_with(|| eyre!("Unable to read fasta record: {path:?}"))
        })
        .collect::<Result<Vec<_>, Report>>()?;

    match <[Record; 1]>::try_from(records) {
        Ok([record]) => Ok(record),
        Err(records) => Err(eyre!(
            "FASTA file {path:?} must contain exactly one sequence, found {}.",
            records.len()
        )
        .suggestion("Check that the reference was written by the rerooting step.")),
    }
}

// ----------------------------------------------------------------------------
// Reverse Complement
// ----------------------------------------------------------------------------

/// Returns the complement of an IUPAC nucleotide code, case is preserved.
///
/// Unknown symbols are returned unchanged.
pub fn complement(base: u8) -> u8 {
    let upper = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'T' | b'U' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        // S, W, N and gaps are their own complement
        _ => return base,
    };
    match base.is_ascii_lowercase() {
        true => upper.to_ascii_lowercase(),
        false => upper,
    }
}

/// Returns the reverse complement of a nucleotide sequence.
///
/// ```rust
/// use clockroot::sequence::reverse_complement;
/// assert_eq!(reverse_complement(b"AACGTn"), b"nACGTT");
/// assert_eq!(reverse_complement(b"RYKM-"), b"-KMRY");
/// ```
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|base| complement(*base)).collect()
}

// ----------------------------------------------------------------------------
// Translation
// ----------------------------------------------------------------------------

/// Unambiguous bases an IUPAC nucleotide code stands for, empty if unknown.
fn expand(base: u8) -> &'static [u8] {
    match base.to_ascii_uppercase() {
        b'A' => b"A",
        b'C' => b"C",
        b'G' => b"G",
        b'T' | b'U' => b"T",
        b'R' => b"AG",
        b'Y' => b"CT",
        b'S' => b"CG",
        b'W' => b"AT",
        b'K' => b"GT",
        b'M' => b"AC",
        b'B' => b"CGT",
        b'D' => b"AGT",
        b'H' => b"ACT",
        b'V' => b"ACG",
        b'N' => b"ACGT",
        _ => b"",
    }
}

fn code_index(base: u8) -> usize {
    match base {
        b'T' => 0,
        b'C' => 1,
        b'A' => 2,
        _ => 3,
    }
}

/// Translate a single codon with the standard genetic code.
///
/// - Stop codons are `*`.
/// - A gap codon (`---`) is `-`.
/// - Ambiguous codons resolve when every possible codon agrees, or to `B` (`D`/`N`),
///   `Z` (`E`/`Q`) and `J` (`I`/`L`) when they split across one of those pairs.
///   Anything else is `X`.
///
/// ```rust
/// use clockroot::sequence::translate_codon;
/// assert_eq!(translate_codon(b"ATG"), b'M');
/// assert_eq!(translate_codon(b"taa"), b'*');
/// assert_eq!(translate_codon(b"GCN"), b'A');
/// assert_eq!(translate_codon(b"RAT"), b'B');
/// assert_eq!(translate_codon(b"NNN"), b'X');
/// assert_eq!(translate_codon(b"---"), b'-');
/// ```
pub fn translate_codon(codon: &[u8]) -> u8 {
    if codon.len() != 3 {
        return b'X';
    }
    if codon.iter().all(|base| *base == b'-') {
        return b'-';
    }

    let amino_acids = codon
        .iter()
        .map(|base| expand(*base).iter())
        .multi_cartesian_product()
        .map(|bases| {
            STANDARD_CODE[code_index(*bases[0]) * 16 + code_index(*bases[1]) * 4 + code_index(*bases[2])]
        })
        .unique()
        .sorted()
        .collect_vec();

    match amino_acids.as_slice() {
        [amino_acid] => *amino_acid,
        [b'D', b'N'] => b'B',
        [b'E', b'Q'] => b'Z',
        [b'I', b'L'] => b'J',
        _ => b'X',
    }
}

/// Translate a nucleotide sequence with the standard genetic code.
///
/// Translation does not stop at stop codons and a trailing partial codon is ignored.
///
/// ```rust
/// use clockroot::sequence::translate;
/// assert_eq!(translate(b"ATGTAAGGGCC"), "M*G");
/// ```
pub fn translate(sequence: &[u8]) -> String {
    sequence.chunks_exact(3).map(|codon| translate_codon(codon) as char).collect()
}
