use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Terminator, Trim};
use serde::de::DeserializeOwned;
use std::{
    cell::RefCell,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

type Rewind<R> = Box<dyn Fn() -> Result<StringRecordsIntoIter<R>, BatchError>>;

/// A CSV item reader that implements the `ItemReader` trait.
///
/// This reader deserializes CSV data into Rust structs row by row
/// using Serde's deserialization capabilities. Rows are pulled lazily from
/// the underlying source; blank lines are skipped.
///
/// When field names are declared with [`CsvItemReaderBuilder::names`], each
/// line must carry exactly that many fields and the names are used as the
/// header row during deserialization, so columns map positionally onto the
/// named struct fields.
///
/// Readers created with [`CsvItemReaderBuilder::from_path`] are restartable:
/// [`ItemReader::open`] reopens the file so a new run starts from the first
/// line.
///
/// # Examples
///
/// ```
/// use herc_reader::item::csv::csv_reader::CsvItemReaderBuilder;
/// use herc_reader::core::item::ItemReader;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Person {
///     first_name: String,
///     last_name: String,
/// }
///
/// let reader = CsvItemReaderBuilder::new()
///     .names(&["firstName", "lastName"])
///     .from_reader("Jill,Doe\nJoe,Doe".as_bytes());
///
/// let person: Person = reader.read().unwrap().unwrap();
/// assert_eq!(person.first_name, "Jill");
/// assert_eq!(person.last_name, "Doe");
/// ```
pub struct CsvItemReader<R> {
    /// Iterator over the CSV records
    ///
    /// Uses `RefCell` to provide interior mutability so we can iterate
    /// through records while keeping the `read` method signature compatible
    /// with the `ItemReader` trait.
    records: RefCell<StringRecordsIntoIter<R>>,
    /// Declared field names, used as the header row when deserializing
    names: Option<StringRecord>,
    /// Description of the source, for error messages
    resource: String,
    /// Reopens the source from its first line; `None` when the source cannot
    /// be rewound
    rewind: Option<Rewind<R>>,
}

impl<R> CsvItemReader<R> {
    fn parse_error(&self, record: &StringRecord, cause: &str) -> BatchError {
        let line = record.position().map_or(0, |position| position.line());
        let input = record.iter().collect::<Vec<_>>().join(",");
        BatchError::ItemReader(format!(
            "Parsing error at line: {} in resource=[{}], input=[{}]: {}",
            line, self.resource, input, cause
        ))
    }

    fn map_record<T: DeserializeOwned>(&self, record: &StringRecord) -> Result<T, BatchError> {
        if let Some(names) = &self.names {
            if record.len() != names.len() {
                return Err(self.parse_error(
                    record,
                    &format!("expected {} fields, found {}", names.len(), record.len()),
                ));
            }
        }

        record
            .deserialize(self.names.as_ref())
            .map_err(|error| self.parse_error(record, &error.to_string()))
    }
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for CsvItemReader<R> {
    /// Reads the next item from the CSV source.
    ///
    /// # Returns
    /// - `Ok(Some(record))` if a record is successfully read
    /// - `Ok(None)` if there are no more records to read
    /// - `Err(BatchError::ItemReader(error))` if a line cannot be parsed; the
    ///   message names the line number and its content
    fn read(&self) -> ItemReaderResult<T> {
        let next = self.records.borrow_mut().next();

        match next {
            Some(Ok(record)) => self.map_record(&record).map(Some),
            Some(Err(error)) => {
                let line = error.position().map_or(0, |position| position.line());
                Err(BatchError::ItemReader(format!(
                    "Parsing error at line: {} in resource=[{}]: {}",
                    line, self.resource, error
                )))
            }
            None => Ok(None),
        }
    }

    fn open(&self) -> Result<(), BatchError> {
        if let Some(rewind) = &self.rewind {
            *self.records.borrow_mut() = rewind()?;
        }
        Ok(())
    }
}

/// A builder for configuring CSV item reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Terminator: CRLF (also accepts a lone `\n`)
/// - Headers: disabled
/// - Names: none, the record is deserialized positionally
/// - Trimming: All fields trimmed
#[derive(Clone)]
pub struct CsvItemReaderBuilder {
    /// The delimiter character (default: comma ',')
    delimiter: u8,
    /// The line terminator (default: CRLF)
    terminator: Terminator,
    /// Whether the CSV has headers (default: false)
    has_headers: bool,
    /// Names given to the fields of each line, in order
    names: Option<Vec<String>>,
}

impl Default for CsvItemReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            terminator: Terminator::CRLF,
            has_headers: false,
            names: None,
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Sets whether the first line is a header row to be skipped.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    /// Declares the names of the fields of each line, in order.
    ///
    /// Lines with a different number of fields are rejected with a parsing
    /// error.
    pub fn names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|name| name.to_string()).collect());
        self
    }

    fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .terminator(self.terminator)
            .has_headers(self.has_headers)
            // field counts are checked against the declared names instead
            .flexible(self.names.is_some());
        builder
    }

    fn string_names(&self) -> Option<StringRecord> {
        self.names.as_ref().map(|names| StringRecord::from(names.clone()))
    }

    fn open_records(&self, path: &Path) -> Result<StringRecordsIntoIter<File>, BatchError> {
        let file = File::open(path).map_err(|error| {
            BatchError::ResourceNotFound(format!("{}: {}", path.display(), error))
        })?;

        Ok(self.reader_builder().from_reader(file).into_records())
    }

    /// Creates a `CsvItemReader` from any source implementing `Read`.
    ///
    /// Such a reader is not restartable.
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvItemReader<R> {
        let records = self.reader_builder().from_reader(rdr).into_records();

        CsvItemReader {
            records: RefCell::new(records),
            names: self.string_names(),
            resource: "reader".to_string(),
            rewind: None,
        }
    }

    /// Creates a restartable `CsvItemReader` from a file path.
    ///
    /// # Errors
    /// Returns `BatchError::ResourceNotFound` if the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemReader<File>, BatchError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let records = self.open_records(&path)?;
        let names = self.string_names();
        let resource = path.display().to_string();

        Ok(CsvItemReader {
            records: RefCell::new(records),
            names,
            resource,
            rewind: Some(Box::new(move || self.open_records(&path))),
        })
    }
}
