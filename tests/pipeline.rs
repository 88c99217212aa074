//! Run the whole pipeline on a small tree directory, with shell scripts standing in
//! for treetime, matUtils and usher_to_taxonium.
#![cfg(unix)]

use clockroot::pipeline::{StageOutcome, Summary};
use clockroot::run::{self, Args};
use clockroot_phylo::Phylogeny;

use color_eyre::eyre::{Report, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use indoc::indoc;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const ACCESSION: &str = "TEST_1.1";

const NEWICK: &str = "((A:30,B:60)node_2:90,(C:3,D:0)node_3:15,E:300)node_1;\n";

const GBFF: &str = indoc! {"
    LOCUS       TEST_1                    30 bp    DNA     linear   VRL 01-JAN-2020
    DEFINITION  Test virus, complete genome.
    ACCESSION   TEST_1
    VERSION     TEST_1.1
    KEYWORDS    .
    SOURCE      Test virus
      ORGANISM  Test virus
                Viruses.
    FEATURES             Location/Qualifiers
         source          1..30
                         /organism=\"Test virus\"
         CDS             1..9
                         /gene=\"a\"
                         /translation=\"MKF\"
    ORIGIN
            1 atgaaattta aatttgggcc caaatttggg
    //
"};

const TREETIME: &str = indoc! {r#"
    #!/bin/sh
    while [ $# -gt 0 ]; do
        [ "$1" = "--outdir" ] && outdir="$2"
        shift
    done
    mkdir -p "$outdir"
    printf '#name, date\nA, 2020.1\nnode_1, 2019.8\nnode_2, 2019.2\nnode_3, 2019.5\n' > "$outdir/rtt.csv"
    echo "treetime done"
"#};

const MATUTILS: &str = indoc! {r#"
    #!/bin/sh
    echo "$@" > "$(dirname "$0")/matutils.args"
    while [ $# -gt 0 ]; do
        case "$1" in
            --write-reroot-reference) reference="$2" ;;
            -o) output="$2" ;;
        esac
        shift
    done
    # the rerooted reference differs at the third codon
    printf '>TEST_1.1\natgaaatgtaaatttgggcccaaatttggg\n' > "$reference"
    touch "$output"
"#};

const TAXONIUM: &str = indoc! {r#"
    #!/bin/sh
    echo "$@" > "$(dirname "$0")/taxonium.args"
    while [ $# -gt 0 ]; do
        [ "$1" = "-o" ] && output="$2"
        shift
    done
    touch "$output"
"#};

fn write_script(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, Report> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

fn write_gzip(path: &Path, contents: &str) -> Result<(), Report> {
    let mut encoder = GzEncoder::new(std::fs::File::create(path)?, Compression::default());
    encoder.write_all(contents.as_bytes())?;
    encoder.finish()?;
    Ok(())
}

/// Creates a tree directory with `real` of 10 samples dated, and the stand-in tools.
fn setup(root: &Path, real: usize) -> Result<Args, Report> {
    let tree_dir = root.join("tree");
    let bin = root.join("bin");
    std::fs::create_dir_all(&tree_dir)?;
    std::fs::create_dir_all(&bin)?;

    let mut metadata = String::from("strain\tdate\tcountry\n");
    for i in 0..10 {
        let date = match i < real {
            true => "2020-03",
            false => "",
        };
        metadata.push_str(&format!("sample_{i}\t{date}\tCanada\n"));
    }
    write_gzip(&tree_dir.join("metadata.tsv.gz"), &metadata)?;
    write_gzip(&tree_dir.join("viz.nwk.gz"), NEWICK)?;
    std::fs::write(tree_dir.join("output_stats.tsv"), "tree\tref_length\ntest\t30\n")?;
    std::fs::write(tree_dir.join("config.toml"), format!("refseq_acc = '{ACCESSION}'\n"))?;
    std::fs::write(tree_dir.join("viz.pb.gz"), "")?;
    std::fs::write(tree_dir.join(format!("{ACCESSION}.fa")), ">TEST_1.1\natgaaatttaaatttgggcccaaatttggg\n")?;
    std::fs::write(tree_dir.join(format!("{ACCESSION}.gbff")), GBFF)?;

    Ok(Args {
        tree_dir,
        treetime: write_script(&bin, "treetime", TREETIME)?.display().to_string(),
        matutils: write_script(&bin, "matUtils", MATUTILS)?.display().to_string(),
        usher_to_taxonium: write_script(&bin, "usher_to_taxonium", TAXONIUM)?.display().to_string(),
        ..Default::default()
    })
}

#[test]
fn enough_dates_runs_every_stage() -> Result<(), Report> {
    let root = tempfile::tempdir()?;
    let args = setup(root.path(), 9)?;
    let dir = &args.tree_dir;

    let summary = run::run(&args)?;
    assert_eq!(summary.outcome, StageOutcome::Continue);
    assert_eq!(summary.date_report.map(|r| r.ratio), Some(0.9));
    assert_eq!(summary.reference_length, Some(30));
    assert_eq!(summary.oldest_node.map(|n| n.name), Some("node_2".to_string()));

    // scaled to substitutions per site
    let scaled = Phylogeny::read(&dir.join("viz.scaled.nwk"))?;
    let labels = scaled.get_nodes().iter().map(|n| n.label.clone()).collect::<Vec<_>>();
    assert_eq!(labels, ["node_1", "node_2", "A", "B", "node_3", "C", "D", "E"]);
    let lengths = scaled.get_branches().iter().filter_map(|b| b.length).collect::<Vec<_>>();
    let expected = [3.0, 1.0, 2.0, 0.5, 0.1, 0.0, 10.0];
    assert_eq!(lengths.len(), expected.len());
    lengths.iter().zip(expected).for_each(|(l, e)| assert!((l - e).abs() < 1e-12, "{l} != {e}"));

    let dates = std::fs::read_to_string(dir.join("dates.csv"))?;
    assert!(dates.starts_with("name,date\nsample_0,2020-03-XX\n"), "{dates}");
    assert_eq!(dates.lines().count(), 10);

    let log = std::fs::read_to_string(dir.join("treetime.log"))?;
    assert!(log.contains("treetime done"), "{log}");
    assert!(log.lines().last().is_some_and(|l| l.starts_with("[OK] ")), "{log}");

    let matutils = std::fs::read_to_string(root.path().join("bin/matutils.args"))?;
    assert!(matutils.starts_with("extract -i "), "{matutils}");
    assert!(matutils.contains("--reroot node_2 "), "{matutils}");

    // the annotations follow the rerooted reference
    let gbff = dir.join(format!("treetime_rerooted_{ACCESSION}.gbff"));
    let record = clockroot::annotation::read_record(&gbff, ACCESSION)?;
    let translation = record.features[1].qualifiers.iter().find(|(k, _)| &**k == "translation");
    assert_eq!(translation.and_then(|(_, v)| v.as_deref()), Some("MKC"));

    let taxonium = std::fs::read_to_string(root.path().join("bin/taxonium.args"))?;
    assert!(taxonium.contains("-c strain,date,country "), "{taxonium}");
    assert!(taxonium.contains(&format!("--title Treetime-rerooted {} ", dir.display())), "{taxonium}");
    assert!(dir.join("timetree_rerooted.jsonl.gz").exists());

    let summary = Summary::read(&dir.join("clockroot_summary.json"))?;
    assert_eq!(summary.refseq_acc.as_deref(), Some(ACCESSION));
    Ok(())
}

#[test]
fn too_few_dates_halts_cleanly() -> Result<(), Report> {
    let root = tempfile::tempdir()?;
    let args = setup(root.path(), 7)?;
    let dir = &args.tree_dir;

    let summary = run::run(&args)?;
    assert!(matches!(summary.outcome, StageOutcome::Halt(_)));
    assert!(!dir.join("viz.scaled.nwk").exists());
    assert!(!dir.join("dates.csv").exists());
    assert!(!dir.join("treetime_out").exists());

    let log = std::fs::read_to_string(dir.join("treetime.log"))?;
    assert!(log.contains("too low a proportion of dates (0.70 < 0.80)"), "{log}");
    Ok(())
}

#[test]
fn tolerated_clock_failure_halts_cleanly() -> Result<(), Report> {
    let root = tempfile::tempdir()?;
    let mut args = setup(root.path(), 10)?;
    args.treetime = write_script(&root.path().join("bin"), "failing_treetime", "#!/bin/sh\necho bad tree >&2\nexit 2\n")?
        .display()
        .to_string();

    assert!(run::run(&args).is_err());

    args.tolerate_clock_failure = true;
    let summary = run::run(&args)?;
    assert!(matches!(summary.outcome, StageOutcome::Halt(_)));
    assert!(!args.tree_dir.join("timetree_rerooted.pb.gz").exists());

    let log = std::fs::read_to_string(args.tree_dir.join("treetime.log"))?;
    assert!(log.contains("bad tree"), "{log}");
    assert!(log.contains("failed with return code 2"), "{log}");
    Ok(())
}

#[test]
fn missing_config_is_fatal() -> Result<(), Report> {
    let root = tempfile::tempdir()?;
    let args = setup(root.path(), 10)?;
    std::fs::remove_file(args.tree_dir.join("config.toml"))?;
    assert!(run::run(&args).is_err());
    assert!(!args.tree_dir.join("timetree_rerooted.pb.gz").exists());
    Ok(())
}

#[test]
fn unbuilt_tree_is_fatal() -> Result<(), Report> {
    let root = tempfile::tempdir()?;
    let args = setup(root.path(), 10)?;
    std::fs::remove_file(args.tree_dir.join("output_stats.tsv"))?;
    let error = run::run(&args).err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error.contains("Expected files not found"), "{error}");
    Ok(())
}
