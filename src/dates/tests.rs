use crate::dates::{DatePatterns, DateReport, SampleDates};

use clockroot_table::Table;
use color_eyre::eyre::{Report, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use indoc::indoc;
use std::io::Write;

const METADATA: &str = indoc! {"
    strain\tdate\tcountry
    A\t2020-01-15\tCanada
    B\t2020\tCanada
    C\t2020-07\tPeru
    D\t\tPeru
    E\t?\tPeru
    F
"};

#[test]
fn ratio_is_a_proportion() -> Result<(), Report> {
    let dates = ["2020", "", "1999-01-01", "abc", "20", "2021-XX-XX", "12345", "NA"];
    for n in 0..=dates.len() {
        let mut table = Table::with_headers(["strain", "date"]);
        for (i, date) in dates.iter().take(n).enumerate() {
            table.add_row([i.to_string(), date.to_string()])?;
        }
        let report = SampleDates::from_table(&table)?.report;
        assert!((0.0..=1.0).contains(&report.ratio), "{report:?}");
        assert_eq!(report.total, n);
    }
    Ok(())
}

#[test]
fn ratio_is_one_when_all_dates_are_real() -> Result<(), Report> {
    let mut table = Table::with_headers(["strain", "date"]);
    table.add_row(["A", "2020"])?;
    table.add_row(["B", "2020-02"])?;
    table.add_row(["C", "20201"])?;
    assert_eq!(SampleDates::from_table(&table)?.report.ratio, 1.0);
    Ok(())
}

#[test]
fn no_samples() -> Result<(), Report> {
    let table = Table::with_headers(["strain", "date"]);
    let dates = SampleDates::from_table(&table)?;
    assert_eq!(dates.report, DateReport { total: 0, real: 0, ratio: 0.0 });
    assert!(!dates.report.passes(0.8));
    Ok(())
}

#[test]
fn strain_must_be_first() -> Result<(), Report> {
    let table = Table::with_headers(["date", "strain"]);
    let error = SampleDates::from_table(&table).err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error.contains("schema violation"), "{error}");
    Ok(())
}

#[test]
fn date_column_required() -> Result<(), Report> {
    let table = Table::with_headers(["strain", "country"]);
    assert!(SampleDates::from_table(&table).is_err());
    Ok(())
}

#[test]
fn repeated_names_keep_first_position() -> Result<(), Report> {
    let mut table = Table::with_headers(["strain", "date"]);
    table.add_row(["A", "2020"])?;
    table.add_row(["B", "2021"])?;
    table.add_row(["A", "2022"])?;
    let dates = SampleDates::from_table(&table)?;
    let expected = [("A", "2022"), ("B", "2021")].map(|(n, d)| (n.to_string(), d.to_string()));
    assert_eq!(dates.dates, expected);
    assert_eq!(dates.report.real, 3);
    Ok(())
}

#[test]
fn normalize_is_idempotent() -> Result<(), Report> {
    let patterns = DatePatterns::new()?;
    for date in ["2020", "2020-07", "2020-01-15", "2020-XX-XX", "20201", "unknown"] {
        let once = patterns.normalize(date);
        assert_eq!(patterns.normalize(&once), once);
    }
    assert_eq!(patterns.normalize("20201"), "20201");
    Ok(())
}

#[test]
fn read_and_write_dates() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let metadata = dir.path().join("metadata.tsv.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&metadata)?, Compression::default());
    encoder.write_all(METADATA.as_bytes())?;
    encoder.finish()?;

    let dates = SampleDates::read(&metadata)?;
    assert_eq!(dates.report, DateReport::new(6, 3));
    assert_eq!(dates.report.ratio, 0.5);

    let output = dir.path().join("dates.csv");
    dates.write(&output)?;
    let expected = "name,date\nA,2020-01-15\nB,2020-XX-XX\nC,2020-07-XX\n";
    assert_eq!(std::fs::read_to_string(&output)?, expected);
    Ok(())
}

#[test]
fn dates_are_trimmed() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let metadata = dir.path().join("metadata.tsv");
    std::fs::write(&metadata, "strain\tcountry\tdate\nA\tCanada\t2020 \nB\tPeru\t 2021-04\nC\tPeru\t \n")?;

    let dates = SampleDates::read(&metadata)?;
    assert_eq!(dates.report, DateReport::new(3, 2));

    let output = dir.path().join("dates.csv");
    dates.write(&output)?;
    assert_eq!(std::fs::read_to_string(&output)?, "name,date\nA,2020-XX-XX\nB,2021-04-XX\n");
    Ok(())
}

#[test]
fn streamed_metadata_checks_schema() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let metadata = dir.path().join("metadata.tsv");
    std::fs::write(&metadata, "date\tstrain\n2020\tA\n")?;
    let error = SampleDates::read(&metadata).err().map(|e| format!("{e:?}")).unwrap_or_default();
    assert!(error.contains("schema violation"), "{error}");

    std::fs::write(&metadata, "strain\tcountry\nA\tCanada\n")?;
    assert!(SampleDates::read(&metadata).is_err());
    Ok(())
}
