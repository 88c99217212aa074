use crate::{newick, FromNewick};
use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A [`Node`] in the [`Phylogeny`](crate::Phylogeny) graph.
///
/// Unnamed nodes (common for internal nodes) have an empty label.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Node {
    /// [`Node`] label, quotes included if the Newick label was quoted.
    pub label: String,
}

#[rustfmt::skip]
impl Display for Node { fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.label) } }

impl Node {
    pub fn new(label: &str) -> Self {
        Node { label: label.to_string() }
    }
}

impl FromNewick for Node {
    /// Returns a [`Node`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) node [`str`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use clockroot_phylo::{Node, FromNewick};
    /// let node = Node::from_newick(&"node_7:0.002;")?;
    /// assert_eq!(node, Node::new("node_7"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Self, Report> {
        let (label, _length) = newick::split_attributes(newick);
        Ok(Node::new(label))
    }
}
