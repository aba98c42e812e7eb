/// `importUserJob`: imports `sample-data.csv` into the `people` table,
/// upper-casing every name on the way.
///
/// Everything is wired explicitly in [`configuration`]: a CSV reader over the
/// sample data, the [`person::PersonItemProcessor`], a SQLite writer
/// committing ten rows per transaction, and [`listener::notify_completion`]
/// as the completion notification.
pub mod configuration;

pub mod listener;

pub mod person;

pub use configuration::run_import_user_job;
pub use person::Person;
