//! Create, read and write a row-based [`Table`].
//!
//! Tables are delimited text files (TSV or CSV), optionally gzip-compressed.

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use flate2::read::GzDecoder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// A row-based [`Table`] of text values.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Table {
    /// Names of the table columns.
    pub headers: Vec<String>,
    /// Rows of table values. Rows read from a file may be shorter than the headers.
    pub rows: Vec<Vec<String>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl Table {
    /// Returns a new row-based [`Table`] with empty headers and rows.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = clockroot_table::Table::new();
    /// table.headers = vec!["name".to_string(), "date".to_string()];
    /// table.add_row(["A", "2020-XX-XX"])?;
    /// # assert_eq!(table.rows, vec![vec!["A", "2020-XX-XX"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// | name | date       |
    /// |------|------------|
    /// | A    | 2020-XX-XX |
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Returns a new [`Table`] with these column names.
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Table { headers: headers.into_iter().map(|h| h.to_string()).collect(), ..Table::new() }
    }

    /// Add a new row to the table.
    ///
    /// ## Arguments
    ///
    /// * `row` - A iterable object of new values to add as a row.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = clockroot_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_row(["D", "E", "F"])?;
    /// assert!(table.add_row(["G"]).is_err());
    /// # assert_eq!(table.rows, [["A", "B", "C"], ["D", "E", "F"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_row<I, S>(&mut self, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let row = row.into_iter().map(|v| v.to_string()).collect_vec();
        // if table has headers, check that the new row is the correct length
        if !self.headers.is_empty() && row.len() != self.headers.len() {
            return Err(eyre!(
                "New row size ({}) does not match table headers ({}).",
                row.len(),
                self.headers.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the [`Table`] value under a particular header and row index.
    ///
    /// # Examples
    ///
    /// ```
    /// let mut table = clockroot_table::Table::with_headers(["1", "2", "3"]);
    /// table.add_row(["A", "B", "C"])?;
    ///
    /// assert_eq!(table.get("2", 0)?, "B");
    /// assert!(table.get("2", 1).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get(&self, header: &str, row: usize) -> Result<&str, Report> {
        let header_i = self.get_header_index(header)?;
        let row = self.get_row(row)?;
        Ok(row.get(header_i).map(String::as_str).unwrap_or_default())
    }

    /// Returns the values under a header, missing trailing cells are empty.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = clockroot_table::Table::with_headers(["1", "2"]);
    /// table.add_row(["A", "B"])?;
    /// table.add_row(["C", "D"])?;
    ///
    /// assert_eq!(table.get_column("1")?, ["A", "C"]);
    /// assert_eq!(table.get_column("2")?, ["B", "D"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_column(&self, header: &str) -> Result<Vec<&str>, Report> {
        let header_i = self.get_header_index(header)?;
        let column = self
            .rows
            .iter()
            .map(|row| row.get(header_i).map(String::as_str).unwrap_or_default())
            .collect();
        Ok(column)
    }

    /// Returns the column index (0-based) of the header in the [`Table`].
    ///
    /// # Examples
    ///
    /// ```
    /// let table = clockroot_table::Table::with_headers(["strain", "date"]);
    /// assert_eq!(table.get_header_index("strain")?, 0);
    /// assert_eq!(table.get_header_index("date")?, 1);
    /// assert!(table.get_header_index("country").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| eyre!("Column '{header}' was not found in table: {:?}.", self.path))
    }

    /// Return a row of [`Table`] values from a row index (0-based).
    pub fn get_row(&self, i: usize) -> Result<&[String], Report> {
        self.rows.get(i).map(Vec::as_slice).ok_or_else(|| eyre!("Row ({i}) does not exist in the table."))
    }

    /// Read a delimited file into a [`Table`], the first line is the header.
    ///
    /// Header names are trimmed of surrounding whitespace. Fields are split
    /// literally on the delimiter, without any quote handling for TSV.
    ///
    /// # Arguments
    ///
    /// * `path` - File path, gzip-compressed if it ends in `.gz`.
    /// * `delim` - Optional delimiter. Otherwise, identified from the path (see [`path_to_delim`]).
    ///
    /// # Examples
    ///
    /// ```
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("output_stats.tsv");
    /// std::fs::write(&path, "tree\tref_length\nsars\t29903\n")?;
    ///
    /// let table = clockroot_table::Table::read(&path, None)?;
    /// assert_eq!(table.get("ref_length", 0)?, "29903");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<char>) -> Result<Table, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let mut reader = csv_reader(path, delim)?;
        let mut table = Table::new();

        for (i, record) in reader.records().enumerate() {
            let record = record.wrap_err_with(|| eyre!("Failed to read line {} of {path:?}", i + 1))?;
            let row = record.iter().map(String::from).collect_vec();
            // the first line is the header
            match i {
                0 => table.headers = row.iter().map(|h| h.trim().to_string()).collect(),
                _ => table.rows.push(row),
            }
        }

        if table.headers.is_empty() {
            Err(eyre!("Table is empty: {path:?}").suggestion("A header line is required."))?;
        }
        table.path = Some(path.as_ref().to_path_buf());

        Ok(table)
    }

    /// Read only the header line of a delimited file.
    ///
    /// ```
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("metadata.tsv");
    /// std::fs::write(&path, "strain\tdate \tcountry\nA\t2020\tX\n")?;
    /// let headers = clockroot_table::Table::read_headers(&path, None)?;
    /// assert_eq!(headers, ["strain", "date", "country"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read_headers<P>(path: &P, delim: Option<char>) -> Result<Vec<String>, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let (headers, _rows) = read_rows(path, delim)?;
        Ok(headers)
    }

    /// Write [`Table`] to file [`Path`].
    ///
    /// Values containing the delimiter are quoted.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = clockroot_table::Table::with_headers(["name", "date"]);
    /// table.add_row(["A", "2021-03-XX"])?;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("dates.csv");
    /// table.write(&path, None)?;
    /// assert_eq!(std::fs::read_to_string(&path)?, "name,date\nA,2021-03-XX\n");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P, delim: Option<char>) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        // if not provided, lookup delimiter from file extension
        let delim = match delim {
            Some(c) => c,
            None => path_to_delim(path)?,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delim as u8)
            .flexible(true)
            .from_path(path)
            .wrap_err_with(|| eyre!("Unable to create file: {path:?}"))?;

        writer
            .write_record(&self.headers)
            .wrap_err_with(|| eyre!("Unable to write table headers: {:?}", self.headers))?;

        self.rows.iter().try_for_each(|row| {
            writer.write_record(row).wrap_err_with(|| eyre!("Unable to write table row: {row:?}"))
        })?;

        writer.flush().wrap_err_with(|| eyre!("Unable to write table: {path:?}"))?;
        Ok(())
    }
}

/// Opens a file for reading, decompressing on the fly if the path ends in `.gz`.
pub fn open<P>(path: &P) -> Result<Box<dyn Read>, Report>
where
    P: AsRef<Path> + Debug,
{
    let file = File::open(path).wrap_err_with(|| eyre!("Failed to open file: {path:?}"))?;
    let reader: Box<dyn Read> = match is_gzip(path) {
        true => Box::new(GzDecoder::new(BufReader::new(file))),
        false => Box::new(BufReader::new(file)),
    };
    Ok(reader)
}

/// Read a delimited file one row at a time, without holding the whole table.
///
/// Returns the trimmed header names and an iterator over the remaining rows.
///
/// ```
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("metadata.tsv");
/// std::fs::write(&path, "strain\tdate\nA\t2020\nB\n")?;
///
/// let (headers, rows) = clockroot_table::read_rows(&path, None)?;
/// assert_eq!(headers, ["strain", "date"]);
/// let rows = rows.map(|row| row.map(|r| r.iter().map(String::from).collect::<Vec<_>>())).collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(rows, [vec!["A", "2020"], vec!["B"]]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn read_rows<P>(
    path: &P,
    delim: Option<char>,
) -> Result<(Vec<String>, impl Iterator<Item = Result<csv::StringRecord, Report>>), Report>
where
    P: AsRef<Path> + Debug,
{
    let mut records = csv_reader(path, delim)?.into_records();
    let header = records
        .next()
        .wrap_err_with(|| eyre!("Table is empty: {path:?}"))?
        .wrap_err_with(|| eyre!("Failed to read header of {path:?}"))?;
    let headers = header.iter().map(|h| h.trim().to_string()).collect();

    let path = path.as_ref().to_path_buf();
    // the header is line 1
    let rows = records
        .enumerate()
        .map(move |(i, record)| record.wrap_err_with(|| eyre!("Failed to read line {} of {path:?}", i + 2)));
    Ok((headers, rows))
}

/// Get delimiter based on file extension, ignoring a trailing `.gz`.
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// ```rust
/// use clockroot_table::path_to_delim;
///
/// assert_eq!(path_to_delim(&"file.tsv")?, '\t');
/// assert_eq!(path_to_delim(&"metadata.tsv.gz")?, '\t');
/// assert_eq!(path_to_delim(&"rtt.csv")?, ',');
/// assert!(path_to_delim(&"file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn path_to_delim<P>(path: &P) -> Result<char, Report>
where
    P: AsRef<Path> + Debug,
{
    let path = path.as_ref();
    let path = match is_gzip(&path) {
        true => Path::new(path.file_stem().unwrap_or_default()),
        false => path,
    };
    let ext = path
        .extension()
        .wrap_err_with(|| eyre!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| eyre!("Failed to convert file extension to str: {path:?}"))?;

    // convert extension to the expected delimiter
    match ext {
        "tsv" | "txt" => Ok('\t'),
        "csv" => Ok(','),
        _ext => Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt")),
    }
}

fn is_gzip<P>(path: &P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref().extension().is_some_and(|ext| ext == "gz")
}

fn csv_reader<P>(path: &P, delim: Option<char>) -> Result<csv::Reader<Box<dyn Read>>, Report>
where
    P: AsRef<Path> + Debug,
{
    let delim = match delim {
        Some(c) => c,
        None => path_to_delim(path)?,
    };
    let reader = csv::ReaderBuilder::new()
        .delimiter(delim as u8)
        .has_headers(false)
        .flexible(true)
        .quoting(delim != '\t')
        .from_reader(open(path)?);
    Ok(reader)
}
