use std::{fs::File, path::Path, str::FromStr};

use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    BatchError,
    core::{
        job::{Job, JobBuilder, JobExecution, RunIdIncrementer},
        repository::JobRepository,
        step::{StepBuilder, StepInstance},
    },
    item::{
        csv::csv_reader::{CsvItemReader, CsvItemReaderBuilder},
        rdbc::sqlite_writer::{SqliteItemWriter, SqliteItemWriterBuilder},
    },
};

use super::{
    listener::notify_completion,
    person::{Person, PersonItemBinder, PersonItemProcessor},
};

pub const JOB_NAME: &str = "importUserJob";

pub const STEP_NAME: &str = "step1";

/// Commit interval of the import step.
pub const CHUNK_SIZE: usize = 10;

/// Input resource, looked up in the resources directory.
pub const SAMPLE_DATA: &str = "sample-data.csv";

pub const TABLE: &str = "people";

pub const COLUMNS: [&str; 2] = ["first_name", "last_name"];

/// Names of the input fields, in file order.
pub const FIELD_NAMES: [&str; 2] = ["firstName", "lastName"];

const SCHEMA: &str = include_str!("../../resources/schema-all.sql");

/// Opens a pool on `database_url`, creating the database file when missing.
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new().connect_with(options).await
}

/// Creates the `people` table when it does not exist.
pub async fn initialize_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await.map(|_| ())
}

/// Reader over `<resources_dir>/sample-data.csv`.
pub fn person_reader(resources_dir: &Path) -> Result<CsvItemReader<File>, BatchError> {
    CsvItemReaderBuilder::new()
        .delimiter(b',')
        .names(&FIELD_NAMES)
        .from_path(resources_dir.join(SAMPLE_DATA))
}

/// Writer inserting into `people (first_name, last_name)`.
pub fn person_writer<'a>(
    pool: &'a Pool<Sqlite>,
    binder: &'a PersonItemBinder,
) -> Result<SqliteItemWriter<'a, Person>, BatchError> {
    COLUMNS
        .iter()
        .fold(
            SqliteItemWriterBuilder::<Person>::new().pool(pool).table(TABLE),
            |builder, column| builder.add_column(column),
        )
        .item_binder(binder)
        .build()
}

/// Builds `importUserJob` and runs it once.
///
/// # Errors
///
/// `BatchError::ResourceNotFound` when the sample data is missing, in which
/// case no run is recorded. A run that fails while reading, processing or
/// writing returns `Ok` with a failed execution.
pub fn run_import_user_job(
    resources_dir: &Path,
    pool: &Pool<Sqlite>,
    repository: &dyn JobRepository,
) -> Result<JobExecution, BatchError> {
    let reader = person_reader(resources_dir)?;
    let processor = PersonItemProcessor;
    let binder = PersonItemBinder;
    let writer = person_writer(pool, &binder)?;

    let step: StepInstance<Person, Person> = StepBuilder::new()
        .name(STEP_NAME.to_string())
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(CHUNK_SIZE)
        .build()?;

    let job = JobBuilder::new()
        .name(JOB_NAME.to_string())
        .incrementer(RunIdIncrementer)
        .repository(repository)
        .listener(|execution: &JobExecution| notify_completion(pool, execution))
        .start(&step)
        .build();

    job.run()
}
