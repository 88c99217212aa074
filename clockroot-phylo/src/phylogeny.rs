use crate::{newick, Branch, FromNewick, Node, ToNewick};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use flate2::read::GzDecoder;
use itertools::Itertools;
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A rooted [`Phylogeny`] of [`Node`]s connected by [`Branch`]es.
///
/// ## Introduction
///
/// - Nodes are identified by their [`NodeIndex`], not by their label, since
///   internal nodes are frequently unnamed.
/// - Branches are directed from parent to child.
/// - The order in which children are added is the order they are written back
///   out in Newick.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Phylogeny {
    /// Directed graph of parents and children.
    pub graph: Graph<Node, Branch>,
    /// The branch above the root, Newick allows a length there (ex. `(A,B):0.1;`).
    pub root_branch: Branch,
}

impl Phylogeny {
    /// Returns a new empty [`Phylogeny`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use clockroot_phylo::{Branch, Node, Phylogeny};
    /// let mut phylo = Phylogeny::new();
    /// let a = phylo.add_node(Node::new("A"));
    /// let b = phylo.add_node(Node::new("B"));
    /// phylo.add_branch(a, b, Branch::new(10.0))?;
    /// # assert_eq!(phylo.node_count(), 2);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new() -> Self {
        Phylogeny { graph: Graph::new(), root_branch: Branch::default() }
    }

    /// Adds a new node to the [`Phylogeny`] and returns its [`NodeIndex`].
    ///
    /// Unlike a population graph, two nodes with the same (ex. empty) label are distinct.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Creates a branch between the parent and child nodes and returns the [`EdgeIndex`].
    ///
    /// - A child can only have one parent, a second parent returns an Error.
    /// - A node cannot be its own parent.
    ///
    /// ```rust
    /// use clockroot_phylo::{Branch, Node, Phylogeny};
    /// let mut phylo = Phylogeny::new();
    /// let a = phylo.add_node(Node::new("A"));
    /// let b = phylo.add_node(Node::new("B"));
    /// let c = phylo.add_node(Node::new("C"));
    /// phylo.add_branch(a, c, Branch::new(1.0))?;
    /// assert!(phylo.add_branch(b, c, Branch::new(1.0)).is_err());
    /// assert!(phylo.add_branch(a, a, Branch::new(1.0)).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_branch(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
        branch: Branch,
    ) -> Result<EdgeIndex, Report> {
        if parent == child {
            Err(eyre!("Node {} cannot be its own parent.", self.get_node(&child)?))?;
        }
        if self.get_parent_edge(&child).is_some() {
            Err(eyre!("Node {:?} already has a parent.", self.get_node(&child)?.label))?;
        }
        Ok(self.graph.add_edge(parent, child, branch))
    }

    /// Returns the [`Node`] at a [`NodeIndex`].
    pub fn get_node(&self, node_index: &NodeIndex) -> Result<&Node, Report> {
        self.graph
            .node_weight(*node_index)
            .ok_or_else(|| eyre!("Node index {node_index:?} is not in the phylogeny."))
    }

    /// Returns all nodes, in the order they were added.
    pub fn get_nodes(&self) -> Vec<&Node> {
        self.graph.node_weights().collect()
    }

    /// Returns all branches, in the order they were added.
    ///
    /// ```rust
    /// let phylo = clockroot_phylo::newick::parse("(A:1,(B:2,C:3):4);")?;
    /// let lengths: Vec<_> = phylo.get_branches().iter().map(|b| b.length).collect();
    /// assert_eq!(lengths, [Some(1.0), Some(4.0), Some(2.0), Some(3.0)]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_branches(&self) -> Vec<&Branch> {
        self.graph.edge_weights().collect()
    }

    /// Returns the [`NodeIndex`] of the first node with this label.
    pub fn get_node_index(&self, label: &str) -> Result<NodeIndex, Report> {
        self.graph
            .node_indices()
            .find(|i| self.graph[*i].label == label)
            .ok_or_else(|| eyre!("Node {label:?} is not in the phylogeny."))
    }

    /// Returns the children of a node, in the order they were added.
    pub fn get_children(&self, node_index: &NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(*node_index, Direction::Outgoing)
            .sorted_by_key(|edge| edge.id())
            .map(|edge| edge.target())
            .collect()
    }

    /// Returns the [`EdgeIndex`] of the branch leading into a node, [`None`] for the root.
    pub fn get_parent_edge(&self, node_index: &NodeIndex) -> Option<EdgeIndex> {
        self.graph.edges_directed(*node_index, Direction::Incoming).next().map(|edge| edge.id())
    }

    /// Returns the [`Branch`] leading into a node, the root returns [`Phylogeny::root_branch`].
    pub fn get_parent_branch(&self, node_index: &NodeIndex) -> Result<&Branch, Report> {
        match self.get_parent_edge(node_index) {
            Some(edge_index) => self
                .graph
                .edge_weight(edge_index)
                .ok_or_else(|| eyre!("Edge index {edge_index:?} is not in the phylogeny.")),
            None => Ok(&self.root_branch),
        }
    }

    /// Returns the [`NodeIndex`] of the root, the only node without a parent.
    ///
    /// ```rust
    /// use clockroot_phylo::{Node, Phylogeny};
    /// let mut phylo = Phylogeny::new();
    /// assert!(phylo.get_root_index().is_err());
    /// phylo.add_node(Node::new("A"));
    /// phylo.add_node(Node::new("B"));
    /// assert!(phylo.get_root_index().is_err());
    /// ```
    pub fn get_root_index(&self) -> Result<NodeIndex, Report> {
        let roots = self
            .graph
            .externals(Direction::Incoming)
            .collect_vec();
        match roots.as_slice() {
            [root] => Ok(*root),
            [] => Err(eyre!("Phylogeny has no root node.")),
            _ => Err(eyre!("Phylogeny has multiple root nodes: {}", roots.len())),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Multiplies every branch length (including the root branch) by `factor`.
    ///
    /// Node count, labels and topology are unchanged.
    ///
    /// ```rust
    /// use clockroot_phylo::{newick, ToNewick};
    /// let mut phylo = newick::parse("(A:10,B:20)node_1:5;")?;
    /// phylo.scale_branches(0.1);
    /// assert_eq!(phylo.to_newick()?, "(A:1,B:2)node_1:0.5;");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn scale_branches(&mut self, factor: f64) {
        self.graph.edge_weights_mut().for_each(|branch| branch.scale(factor));
        self.root_branch.scale(factor);
    }

    /// Reads a Newick file, gzip-compressed if the path ends in `.gz`.
    pub fn read<P>(path: &P) -> Result<Phylogeny, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let file = File::open(path)
            .wrap_err_with(|| eyre!("Failed to open newick: {path:?}"))
            .suggestion("Has the tree been built?")?;

        let mut newick = String::new();
        match path.as_ref().extension().is_some_and(|ext| ext == "gz") {
            true => GzDecoder::new(file).read_to_string(&mut newick),
            false => std::io::BufReader::new(file).read_to_string(&mut newick),
        }
        .wrap_err_with(|| eyre!("Failed to read newick: {path:?}"))?;

        Phylogeny::from_newick(&newick).wrap_err_with(|| eyre!("Failed to parse newick: {path:?}"))
    }

    /// Writes the [`Phylogeny`] as a single-line Newick file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let newick = format!("{}\n", self.to_newick()?);
        std::fs::write(path, newick).wrap_err_with(|| eyre!("Failed to write newick: {path:?}"))
    }
}

impl FromNewick for Phylogeny {
    /// Returns a [`Phylogeny`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) string.
    ///
    /// ```rust
    /// use clockroot_phylo::{FromNewick, Phylogeny};
    /// let phylo = Phylogeny::from_newick("(A,B);")?;
    /// # assert_eq!(phylo.node_count(), 3);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Phylogeny, Report> {
        newick::parse(newick)
    }
}

impl ToNewick for Phylogeny {
    fn to_newick(&self) -> Result<String, Report> {
        newick::write(self)
    }
}

#[cfg(test)]
mod tests;
