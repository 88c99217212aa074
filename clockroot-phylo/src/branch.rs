use crate::{newick, FromNewick};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Display, Formatter};

/// A [`Branch`] in the [`Phylogeny`](crate::Phylogeny).
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Branch {
    /// [`Branch`] length (ex. 1.0), [`None`] if the Newick had no length.
    pub length: Option<f64>,
}

#[rustfmt::skip]
impl Display for Branch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.length { Some(length) => write!(f, ":{length}"), None => Ok(()) }
    }
}

impl Branch {
    pub fn new(length: f64) -> Self {
        Branch { length: Some(length) }
    }

    /// Multiply the branch length by `factor`, branches without a length are left alone.
    ///
    /// ```rust
    /// use clockroot_phylo::Branch;
    /// let mut branch = Branch::new(3.0);
    /// branch.scale(0.25);
    /// assert_eq!(branch.length, Some(0.75));
    /// ```
    pub fn scale(&mut self, factor: f64) {
        if let Some(length) = self.length.as_mut() {
            *length *= factor;
        }
    }
}

impl FromNewick for Branch {
    /// Returns a branch created from the attributes following a node label.
    ///
    /// # Examples
    ///
    /// Just a node name.
    ///
    /// ```rust
    /// use clockroot_phylo::{Branch, FromNewick};
    /// let branch = Branch::from_newick(&"A")?;
    /// assert_eq!(branch, Branch { length: None });
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A node name and branch length.
    ///
    /// ```rust
    /// # use clockroot_phylo::{Branch, FromNewick};
    /// let branch = Branch::from_newick(&"node_1:2.5")?;
    /// assert_eq!(branch, Branch { length: Some(2.5) });
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Branch, Report> {
        let (_label, length) = newick::split_attributes(newick);
        let length = match length {
            Some(length) => Some(
                length
                    .parse()
                    .wrap_err_with(|| eyre!("Failed to parse branch length from newick: {newick}"))?,
            ),
            None => None,
        };
        Ok(Branch { length })
    }
}
