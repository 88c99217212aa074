use crate::{newick, FromNewick, Phylogeny, ToNewick};

use color_eyre::eyre::{Report, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

const NEWICK: &str = "((A:29.903,B:59.806)node_2:2990.3,(C:1,D:0)node_3:14.9515,E:299.03)node_1;";

#[test]
fn scale_preserves_topology() -> Result<(), Report> {
    let mut phylo = Phylogeny::from_newick(NEWICK)?;
    let before = phylo.node_count();
    phylo.scale_branches(1.0 / 29903.0);

    assert_eq!(phylo.node_count(), before);
    let labels: Vec<_> = phylo.get_nodes().iter().map(|n| n.label.clone()).collect();
    assert_eq!(labels, ["node_1", "node_2", "A", "B", "node_3", "C", "D", "E"]);

    let observed = phylo.get_branches().iter().filter_map(|b| b.length).collect::<Vec<_>>();
    let expected = [0.1, 0.001, 0.002, 0.0005, 1.0 / 29903.0, 0.0, 0.01];
    assert_eq!(observed.len(), expected.len());
    observed.iter().zip(expected).for_each(|(o, e)| assert!((o - e).abs() < 1e-12, "{o} != {e}"));
    Ok(())
}

#[test]
fn scale_round_trip() -> Result<(), Report> {
    let original = Phylogeny::from_newick(NEWICK)?;
    let mut phylo = original.clone();
    phylo.scale_branches(1.0 / 29903.0);
    phylo.scale_branches(29903.0);

    original.get_branches().iter().zip(phylo.get_branches()).for_each(|(o, s)| {
        let (o, s) = (o.length.unwrap_or_default(), s.length.unwrap_or_default());
        assert!((o - s).abs() <= 1e-9 * o.abs().max(1.0), "{o} != {s}");
    });
    Ok(())
}

#[test]
fn lookup_by_label() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(NEWICK)?;
    let node_2 = phylo.get_node_index("node_2")?;
    let children = phylo
        .get_children(&node_2)
        .iter()
        .map(|i| phylo.get_node(i).map(|n| n.label.clone()))
        .collect::<Result<Vec<_>, Report>>()?;
    assert_eq!(children, ["A", "B"]);
    assert_eq!(phylo.get_parent_branch(&node_2)?.length, Some(2990.3));

    let root = phylo.get_node_index("node_1")?;
    assert_eq!(phylo.get_root_index()?, root);
    assert!(phylo.get_parent_edge(&root).is_none());
    assert!(phylo.get_node_index("F").is_err());
    Ok(())
}

#[test]
fn unnamed_nodes_are_preserved() -> Result<(), Report> {
    let input = "((A:1,B:2):3,(C:4,):5);";
    let phylo = newick::parse(input)?;
    assert_eq!(phylo.node_count(), 7);
    assert_eq!(phylo.to_newick()?, input);
    Ok(())
}

#[test]
fn quoted_labels_and_comments() -> Result<(), Report> {
    let phylo = newick::parse("('hCoV-19/A (1)':0.5,B[&comment]:2)'root node';")?;
    let labels: Vec<_> = phylo.get_nodes().iter().map(|n| n.label.clone()).collect();
    assert_eq!(labels, ["'root node'", "'hCoV-19/A (1)'", "B"]);
    assert_eq!(phylo.to_newick()?, "('hCoV-19/A (1)':0.5,B:2)'root node';");
    Ok(())
}

#[test]
fn single_leaf() -> Result<(), Report> {
    let phylo = newick::parse("A:3;")?;
    assert_eq!(phylo.node_count(), 1);
    assert_eq!(phylo.root_branch.length, Some(3.0));
    assert_eq!(phylo.to_newick()?, "A:3;");
    Ok(())
}

#[test]
fn malformed_newick() {
    assert!(newick::parse("").is_err());
    assert!(newick::parse("(A:x,B);").is_err());
    assert!(newick::parse("(A,B);C").is_err());
    assert!(newick::parse("(A,'B);").is_err());
    assert!(newick::parse("A(B,C);").is_err());
}

#[test]
fn read_compressed() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("viz.nwk.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path)?, Compression::default());
    encoder.write_all(format!("{NEWICK}\n").as_bytes())?;
    encoder.finish()?;

    let phylo = Phylogeny::read(&path)?;
    assert_eq!(phylo.to_newick()?, Phylogeny::from_newick(NEWICK)?.to_newick()?);

    let output = dir.path().join("viz.scaled.nwk");
    phylo.write(&output)?;
    assert_eq!(Phylogeny::read(&output)?.node_count(), 8);
    Ok(())
}
