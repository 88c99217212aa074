use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Conventional file names inside a tree directory.
///
/// ```rust
/// use clockroot::pipeline::Layout;
/// let layout = Layout::new("trees/mpox/");
/// assert_eq!(layout.name(), "trees/mpox");
/// assert_eq!(layout.reference_fasta("NC_063383.1"), std::path::Path::new("trees/mpox/NC_063383.1.fa"));
/// assert_eq!(
///     layout.rerooted_gbff("NC_063383.1"),
///     std::path::Path::new("trees/mpox/treetime_rerooted_NC_063383.1.gbff")
/// );
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Layout {
    pub dir: PathBuf,
}

impl Layout {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Layout { dir: dir.as_ref().to_path_buf() }
    }

    fn join(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// The tree directory as given, without a trailing `/`.
    pub fn name(&self) -> String {
        let name = self.dir.to_string_lossy();
        match name.trim_end_matches('/') {
            "" => name.to_string(),
            trimmed => trimmed.to_string(),
        }
    }

    pub fn metadata(&self) -> PathBuf {
        self.join("metadata.tsv.gz")
    }

    pub fn stats(&self) -> PathBuf {
        self.join("output_stats.tsv")
    }

    pub fn newick(&self) -> PathBuf {
        self.join("viz.nwk.gz")
    }

    pub fn scaled_newick(&self) -> PathBuf {
        self.join("viz.scaled.nwk")
    }

    pub fn dates(&self) -> PathBuf {
        self.join("dates.csv")
    }

    pub fn treetime_dir(&self) -> PathBuf {
        self.join("treetime_out")
    }

    /// Root-to-tip report written by treetime.
    pub fn rtt(&self) -> PathBuf {
        self.treetime_dir().join("rtt.csv")
    }

    pub fn treetime_log(&self) -> PathBuf {
        self.join("treetime.log")
    }

    pub fn config(&self) -> PathBuf {
        self.join("config.toml")
    }

    /// Binary tree used for visualization.
    pub fn viz_pb(&self) -> PathBuf {
        self.join("viz.pb.gz")
    }

    pub fn rerooted_pb(&self) -> PathBuf {
        self.join("timetree_rerooted.pb.gz")
    }

    pub fn reference_fasta(&self, accession: &str) -> PathBuf {
        self.join(&format!("{accession}.fa"))
    }

    pub fn reference_gbff(&self, accession: &str) -> PathBuf {
        self.join(&format!("{accession}.gbff"))
    }

    pub fn rerooted_fasta(&self, accession: &str) -> PathBuf {
        self.join(&format!("treetime_rerooted_{accession}.fa"))
    }

    pub fn rerooted_gbff(&self, accession: &str) -> PathBuf {
        self.join(&format!("treetime_rerooted_{accession}.gbff"))
    }

    pub fn taxonium(&self) -> PathBuf {
        self.join("timetree_rerooted.jsonl.gz")
    }

    pub fn summary(&self) -> PathBuf {
        self.join("clockroot_summary.json")
    }

    /// Check that the tree directory has been built.
    pub fn check(&self) -> Result<(), Report> {
        if !self.dir.is_dir() {
            return Err(eyre!("Tree directory not found: {:?}", self.dir).suggestion("Check the spelling."));
        }
        let missing = [self.metadata(), self.stats()].into_iter().filter(|p| !p.exists()).collect_vec();
        if !missing.is_empty() {
            return Err(eyre!("Expected files not found in {:?}: {missing:?}", self.dir)
                .suggestion("Has the tree been built?"));
        }
        Ok(())
    }
}
