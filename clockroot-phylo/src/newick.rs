//! Conversion between [Newick](https://en.wikipedia.org/wiki/Newick_format) text and a [`Phylogeny`].

use crate::{Branch, FromNewick, Node, Phylogeny};
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use petgraph::graph::NodeIndex;

/// Splits a Newick node token into its label and optional branch length text.
///
/// Quoted labels may contain `:`, which is only treated as the length separator
/// after the closing quote.
///
/// ```rust
/// use clockroot_phylo::newick::split_attributes;
/// assert_eq!(split_attributes("A:0.5"), ("A", Some("0.5")));
/// assert_eq!(split_attributes("node_3"), ("node_3", None));
/// assert_eq!(split_attributes("'hCoV-19/x:1':2"), ("'hCoV-19/x:1'", Some("2")));
/// assert_eq!(split_attributes(":1e-3;"), ("", Some("1e-3")));
/// ```
pub fn split_attributes(newick: &str) -> (&str, Option<&str>) {
    let newick = newick.trim().trim_end_matches(';').trim();

    // find where the label ends, skipping over quoted content
    let label_end = match newick.starts_with('\'') {
        true => {
            let bytes = newick.as_bytes();
            let mut i = 1;
            let mut end = newick.len();
            while i < bytes.len() {
                if bytes[i] == b'\'' {
                    // '' is an escaped quote inside a quoted label
                    if bytes.get(i + 1) == Some(&b'\'') {
                        i += 2;
                        continue;
                    }
                    end = i + 1;
                    break;
                }
                i += 1;
            }
            end
        }
        false => newick.find(':').unwrap_or(newick.len()),
    };

    let (label, rest) = newick.split_at(label_end);
    let length = rest.trim().strip_prefix(':').map(str::trim).filter(|l| !l.is_empty());
    (label.trim(), length)
}

/// Returns a [`Phylogeny`] parsed from a Newick [`str`].
///
/// The parser is iterative, so deep trees (ex. hundreds of thousands of
/// samples) do not exhaust the stack. Comments in square brackets are dropped.
///
/// ## Examples
///
/// ```rust
/// use clockroot_phylo::newick;
/// let phylo = newick::parse("((A:1,B:2)node_2:3,C:4)node_1;")?;
/// assert_eq!(phylo.node_count(), 5);
/// assert_eq!(phylo.get_node(&phylo.get_root_index()?)?.label, "node_1");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
///
/// Unbalanced parentheses are an error.
///
/// ```rust
/// # use clockroot_phylo::newick;
/// assert!(newick::parse("((A,B);").is_err());
/// assert!(newick::parse("(A,B));").is_err());
/// ```
pub fn parse(newick: &str) -> Result<Phylogeny, Report> {
    let newick = newick.trim();
    if newick.is_empty() || newick == ";" {
        return Err(eyre!("Newick string is empty."));
    }

    let mut parser = Parser::default();
    let mut chars = newick.chars().peekable();
    let mut finished = false;

    while let Some(c) = chars.next() {
        if finished {
            if c.is_whitespace() {
                continue;
            }
            return Err(eyre!("Unexpected content after ';' in newick: {c}"));
        }
        match c {
            '(' => parser.open()?,
            ',' => parser.sibling()?,
            ')' => parser.close()?,
            ';' => {
                parser.flush()?;
                finished = true;
            }
            // comments
            '[' => {
                chars.by_ref().find(|c| *c == ']').ok_or_else(|| eyre!("Unterminated newick comment."))?;
            }
            // quoted labels keep their whitespace and delimiters
            '\'' => {
                parser.token.push(c);
                loop {
                    let c = chars.next().ok_or_else(|| eyre!("Unterminated quoted newick label."))?;
                    parser.token.push(c);
                    if c == '\'' {
                        match chars.peek() == Some(&'\'') {
                            true => parser.token.push(chars.next().unwrap_or('\'')),
                            false => break,
                        }
                    }
                }
            }
            c if c.is_whitespace() => (),
            c => parser.token.push(c),
        }
    }

    // tolerate a missing trailing ';'
    if !finished {
        parser.flush()?;
    }
    if !parser.stack.is_empty() {
        Err(eyre!("Newick has more '(' than ')'.")
            .suggestion("Is the newick file truncated?"))?;
    }

    Ok(parser.phylogeny)
}

/// Returns the Newick [`String`] of a [`Phylogeny`], terminated by `;`.
///
/// Children are written in the order they were added.
///
/// ```rust
/// use clockroot_phylo::newick;
/// let input = "((A:1,B:2)node_2:3,C:4)node_1;";
/// let phylo = newick::parse(input)?;
/// assert_eq!(newick::write(&phylo)?, input);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn write(phylogeny: &Phylogeny) -> Result<String, Report> {
    enum Visit {
        Enter(NodeIndex),
        Exit(NodeIndex),
        Comma,
    }

    let root = phylogeny.get_root_index()?;
    let mut newick = String::new();
    let mut stack = vec![Visit::Enter(root)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(node_index) => {
                let children = phylogeny.get_children(&node_index);
                if children.is_empty() {
                    newick.push_str(&phylogeny.get_node(&node_index)?.label);
                    newick.push_str(&phylogeny.get_parent_branch(&node_index)?.to_string());
                } else {
                    newick.push('(');
                    stack.push(Visit::Exit(node_index));
                    // reversed, so the first child is popped first
                    for (i, child) in children.iter().enumerate().rev() {
                        stack.push(Visit::Enter(*child));
                        if i > 0 {
                            stack.push(Visit::Comma);
                        }
                    }
                }
            }
            Visit::Exit(node_index) => {
                newick.push(')');
                newick.push_str(&phylogeny.get_node(&node_index)?.label);
                newick.push_str(&phylogeny.get_parent_branch(&node_index)?.to_string());
            }
            Visit::Comma => newick.push(','),
        }
    }

    newick.push(';');
    Ok(newick)
}

/// Incremental state while reading a Newick string.
#[derive(Default)]
struct Parser {
    phylogeny: Phylogeny,
    /// Open internal nodes, innermost last.
    stack: Vec<NodeIndex>,
    /// Internal node that was just closed and may be followed by a label and length.
    closed: Option<NodeIndex>,
    /// Characters of the current label and length.
    token: String,
    /// True when the next token starts a new node rather than annotating `closed`.
    expect_node: bool,
    started: bool,
}

impl Parser {
    fn open(&mut self) -> Result<(), Report> {
        if !self.token.trim().is_empty() || (self.started && !self.expect_node) {
            Err(eyre!("Unexpected '(' after node {:?} in newick.", self.token))?;
        }
        let node_index = self.phylogeny.add_node(Node::default());
        if let Some(parent) = self.stack.last() {
            self.phylogeny.add_branch(*parent, node_index, Branch::default())?;
        }
        self.stack.push(node_index);
        self.closed = None;
        self.expect_node = true;
        self.started = true;
        Ok(())
    }

    fn sibling(&mut self) -> Result<(), Report> {
        self.flush()?;
        if self.stack.is_empty() {
            Err(eyre!("Unexpected ',' outside of parentheses in newick."))?;
        }
        self.closed = None;
        self.expect_node = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Report> {
        self.flush()?;
        let node_index =
            self.stack.pop().ok_or_else(|| eyre!("Newick has more ')' than '('."))?;
        self.closed = Some(node_index);
        self.expect_node = false;
        Ok(())
    }

    /// Applies the current token to a new leaf or to the node that was just closed.
    fn flush(&mut self) -> Result<(), Report> {
        let token = std::mem::take(&mut self.token);
        let node = Node::from_newick(&token)?;
        let branch = Branch::from_newick(&token)?;

        let node_index = match (self.expect_node || !self.started, self.closed) {
            (true, _) => {
                let node_index = self.phylogeny.add_node(node);
                if let Some(parent) = self.stack.last() {
                    self.phylogeny.add_branch(*parent, node_index, branch)?;
                } else {
                    self.phylogeny.root_branch = branch;
                }
                self.started = true;
                self.expect_node = false;
                return Ok(());
            }
            (false, Some(node_index)) => node_index,
            (false, None) if token.trim().is_empty() => return Ok(()),
            (false, None) => return Err(eyre!("Unexpected newick label: {token}")),
        };

        self.phylogeny.graph[node_index] = node;
        match self.phylogeny.get_parent_edge(&node_index) {
            Some(edge_index) => self.phylogeny.graph[edge_index] = branch,
            None => self.phylogeny.root_branch = branch,
        }
        self.closed = None;
        Ok(())
    }
}
