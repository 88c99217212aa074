//! Sample collection dates: completeness, normalization and the dates table.

use clockroot_table::Table;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

/// Default minimum proportion of samples with a real date.
pub const DEFAULT_MIN_REAL_DATES: f64 = 0.8;
/// Column that identifies samples, it must be the first column.
pub const NAME_COLUMN: &str = "strain";
/// Column with the sample collection date.
pub const DATE_COLUMN: &str = "date";

// ----------------------------------------------------------------------------
// Date Patterns

/// Compiled patterns for recognizing and normalizing partial dates.
#[derive(Clone, Debug)]
pub struct DatePatterns {
    /// Starts with a 4-digit year, anything after is ignored.
    real: Regex,
    year: Regex,
    year_month: Regex,
}

impl DatePatterns {
    pub fn new() -> Result<Self, Report> {
        Ok(DatePatterns {
            real: Regex::new("^[0-9]{4}")?,
            year: Regex::new("^[0-9]{4}$")?,
            year_month: Regex::new("^[0-9]{4}-[0-9]{2}$")?,
        })
    }

    /// Returns true if the date starts with a 4-digit year.
    ///
    /// ```rust
    /// let patterns = clockroot::dates::DatePatterns::new()?;
    /// assert!(patterns.is_real("2020"));
    /// assert!(patterns.is_real("2021-03-XX"));
    /// assert!(!patterns.is_real(""));
    /// assert!(!patterns.is_real("?"));
    /// assert!(!patterns.is_real("20-01-01"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn is_real(&self, date: &str) -> bool {
        self.real.is_match(date)
    }

    /// Fill in a missing month and/or day with `XX`.
    ///
    /// ```rust
    /// let patterns = clockroot::dates::DatePatterns::new()?;
    /// assert_eq!(patterns.normalize("2020"), "2020-XX-XX");
    /// assert_eq!(patterns.normalize("2020-07"), "2020-07-XX");
    /// assert_eq!(patterns.normalize("2020-01-15"), "2020-01-15");
    /// assert_eq!(patterns.normalize("2020-XX-XX"), "2020-XX-XX");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn normalize(&self, date: &str) -> String {
        if self.year.is_match(date) {
            format!("{date}-XX-XX")
        } else if self.year_month.is_match(date) {
            format!("{date}-XX")
        } else {
            date.to_string()
        }
    }
}

// ----------------------------------------------------------------------------
// Date Report

/// How many samples have a usable date.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DateReport {
    /// Number of samples scanned.
    pub total: usize,
    /// Number of samples with a date starting with a 4-digit year.
    pub real: usize,
    /// `real / total`, `0.0` when there are no samples.
    pub ratio: f64,
}

impl DateReport {
    pub fn new(total: usize, real: usize) -> Self {
        let ratio = match total {
            0 => 0.0,
            _ => real as f64 / total as f64,
        };
        DateReport { total, real, ratio }
    }

    /// Returns true if enough samples have a real date.
    pub fn passes(&self, min_real_dates: f64) -> bool {
        self.ratio >= min_real_dates
    }
}

// ----------------------------------------------------------------------------
// Sample Dates

/// Real sample dates, in metadata order, and the completeness report.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SampleDates {
    pub dates: Vec<(String, String)>,
    pub report: DateReport,
}

impl SampleDates {
    /// Collect real dates from a metadata table.
    ///
    /// - The `strain` column must be first.
    /// - A `date` column is required.
    /// - A row too short to have a date counts as a sample without one.
    /// - Dates are trimmed of surrounding whitespace.
    /// - A repeated name keeps its first position and its last date.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use clockroot::dates::SampleDates;
    /// use clockroot_table::Table;
    ///
    /// let mut table = Table::with_headers(["strain", "country", "date"]);
    /// table.add_row(["A", "Canada", "2020-03-01"])?;
    /// table.add_row(["B", "Canada", ""])?;
    /// table.add_row(["C", "Canada", "2021"])?;
    /// table.add_row(["D", "Canada", "?"])?;
    ///
    /// let dates = SampleDates::from_table(&table)?;
    /// assert_eq!(dates.report.total, 4);
    /// assert_eq!(dates.report.real, 2);
    /// assert_eq!(dates.report.ratio, 0.5);
    /// assert_eq!(dates.dates[1], ("C".to_string(), "2021".to_string()));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn from_table(table: &Table) -> Result<Self, Report> {
        let mut collector = DateCollector::new(&table.headers)?;
        let date_index = collector.date_index;
        for row in &table.rows {
            collector.add(row.first().map(String::as_str), row.get(date_index).map(String::as_str));
        }
        Ok(collector.finish())
    }

    /// Read real dates from a metadata file, gzip-compressed if it ends in `.gz`.
    ///
    /// Rows are streamed, only the name and date of each sample are kept.
    pub fn read<P>(path: &P) -> Result<Self, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let (headers, rows) = clockroot_table::read_rows(path, Some('\t'))?;
        let mut collector =
            DateCollector::new(&headers).wrap_err_with(|| eyre!("Failed to collect dates from {path:?}"))?;
        let date_index = collector.date_index;
        for row in rows {
            let row = row?;
            collector.add(row.get(0), row.get(date_index));
        }
        Ok(collector.finish())
    }

    /// Returns the table of normalized dates, with columns `name,date`.
    ///
    /// ```rust
    /// use clockroot::dates::{DateReport, SampleDates};
    ///
    /// let dates = SampleDates {
    ///     dates: vec![("A".to_string(), "2020".to_string()), ("B".to_string(), "2020-01-15".to_string())],
    ///     report: DateReport::new(2, 2),
    /// };
    /// let table = dates.to_table()?;
    /// assert_eq!(table.get("date", 0)?, "2020-XX-XX");
    /// assert_eq!(table.get("date", 1)?, "2020-01-15");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn to_table(&self) -> Result<Table, Report> {
        let patterns = DatePatterns::new()?;
        let mut table = Table::with_headers(["name", "date"]);
        for (name, date) in &self.dates {
            table.add_row([name.to_string(), patterns.normalize(date)])?;
        }
        Ok(table)
    }

    /// Write normalized dates as CSV.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        self.to_table()?.write(path, Some(','))
    }
}

/// Accumulates [`SampleDates`] one metadata row at a time.
struct DateCollector {
    patterns: DatePatterns,
    date_index: usize,
    dates: Vec<(String, String)>,
    positions: HashMap<String, usize>,
    total: usize,
    real: usize,
}

impl DateCollector {
    fn new(headers: &[String]) -> Result<Self, Report> {
        match headers.first() {
            Some(header) if header == NAME_COLUMN => (),
            header => Err(eyre!(
                "Metadata schema violation: the first column must be {NAME_COLUMN:?}, found {header:?}"
            ))?,
        }
        let date_index = headers
            .iter()
            .position(|h| h == DATE_COLUMN)
            .ok_or_else(|| eyre!("Column {DATE_COLUMN:?} was not found in metadata: {headers:?}"))
            .suggestion("The metadata must have a date column to run the clock.")?;

        Ok(DateCollector {
            patterns: DatePatterns::new()?,
            date_index,
            dates: Vec::new(),
            positions: HashMap::new(),
            total: 0,
            real: 0,
        })
    }

    /// A missing cell counts as an empty value.
    fn add(&mut self, name: Option<&str>, date: Option<&str>) {
        self.total += 1;
        let name = name.unwrap_or_default();
        let date = date.unwrap_or_default().trim();
        if !self.patterns.is_real(date) {
            return;
        }
        self.real += 1;
        match self.positions.get(name) {
            Some(i) => self.dates[*i].1 = date.to_string(),
            None => {
                self.positions.insert(name.to_string(), self.dates.len());
                self.dates.push((name.to_string(), date.to_string()));
            }
        }
    }

    fn finish(self) -> SampleDates {
        let report = DateReport::new(self.total, self.real);
        debug!("Dates: {}/{} samples have a real date ({:.2})", report.real, report.total, report.ratio);
        SampleDates { dates: self.dates, report }
    }
}

#[cfg(test)]
mod tests;
