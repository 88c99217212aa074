//! The per-tree `config.toml`.

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

/// Settings of a tree directory that the rerooting needs.
///
/// Other keys in the file are ignored.
///
/// ```rust
/// use clockroot::config::RerootConfig;
/// let config = RerootConfig::from_toml("refseq_acc = 'NC_045512.2'\ntaxonium_title = 'SARS-CoV-2'\n")?;
/// assert_eq!(config.refseq_acc, "NC_045512.2");
/// assert!(RerootConfig::from_toml("taxonium_title = 'SARS-CoV-2'\n").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RerootConfig {
    /// Accession of the reference sequence, names the reference `.fa` and `.gbff` files.
    pub refseq_acc: String,
}

impl RerootConfig {
    pub fn from_toml(contents: &str) -> Result<Self, Report> {
        let config: RerootConfig = toml::from_str(contents).wrap_err("Failed to parse config.")?;
        if config.refseq_acc.trim().is_empty() {
            return Err(eyre!("refseq_acc is empty."));
        }
        Ok(config)
    }

    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| eyre!("Failed to read file: {path:?}"))
            .suggestion("Has the tree been built?")?;
        RerootConfig::from_toml(&contents)
            .wrap_err_with(|| eyre!("Failed to find refseq_acc in {path:?}"))
    }
}
