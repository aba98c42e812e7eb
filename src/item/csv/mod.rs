/// CSV support for reading delimited text resources.
///
/// The [`csv_reader::CsvItemReader`] deserializes each non-empty line into a
/// Rust struct using serde, either positionally or through a declared list of
/// field names. It implements the core `ItemReader` trait so it can feed a
/// chunk-oriented step.
///
/// # Examples
///
/// ```
/// use herc_reader::item::csv::csv_reader::CsvItemReaderBuilder;
/// use herc_reader::core::item::ItemReader;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct City {
///     city: String,
///     country: String,
///     pop: u32,
/// }
///
/// let csv_data = "\
/// city,country,pop
/// Boston,United States,4628910
/// Concord,United States,42695
/// ";
///
/// let reader = CsvItemReaderBuilder::new()
///     .has_headers(true)
///     .delimiter(b',')
///     .from_reader(csv_data.as_bytes());
///
/// let mut cities: Vec<City> = Vec::new();
/// while let Some(city) = reader.read().unwrap() {
///     cities.push(city);
/// }
///
/// assert_eq!(cities.len(), 2);
/// assert_eq!(cities[1].city, "Concord");
/// assert_eq!(cities[1].pop, 42695);
/// ```

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;
