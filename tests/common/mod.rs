//! Shared fixtures: a throw-away SQLite database and resources directory.
use std::{fs, path::Path};

use herc_reader::people::configuration;
use sqlx::{Pool, Sqlite};
use tempfile::{NamedTempFile, TempDir};

pub struct Fixture {
    // kept alive for the duration of the test
    _database: NamedTempFile,
    pub resources: TempDir,
    pub pool: Pool<Sqlite>,
}

impl Fixture {
    /// Creates the `people` table and a resources directory holding
    /// `sample-data.csv` with the given content.
    pub async fn new(sample_data: &str) -> anyhow::Result<Self> {
        let database = NamedTempFile::new()?;
        let url = format!("sqlite://{}", database.path().display());
        let pool = configuration::connect(&url).await?;
        configuration::initialize_schema(&pool).await?;

        let resources = TempDir::new()?;
        write_sample_data(resources.path(), sample_data)?;

        Ok(Self {
            _database: database,
            resources,
            pool,
        })
    }

    pub async fn rows(&self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(
            sqlx::query_as("SELECT first_name, last_name FROM people ORDER BY person_id")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

pub fn write_sample_data(resources: &Path, content: &str) -> std::io::Result<()> {
    fs::write(resources.join(configuration::SAMPLE_DATA), content)
}

/// `count` lines of distinct lower-case names.
pub fn sample_lines(count: usize) -> String {
    (1..=count)
        .map(|i| format!("first{i},last{i}\n"))
        .collect()
}
