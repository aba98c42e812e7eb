use sqlx::{Pool, Sqlite};

use crate::{BatchError, core::job::JobExecution, item::rdbc::block_on};

use super::JobRepository;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS batch_job_execution (
    execution_id TEXT PRIMARY KEY,
    job_name TEXT NOT NULL,
    run_id INTEGER NOT NULL,
    status TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    exit_message TEXT
)";

const LAST_RUN_ID: &str = "SELECT MAX(run_id) FROM batch_job_execution WHERE job_name = ?";

const UPSERT: &str = "INSERT INTO batch_job_execution
    (execution_id, job_name, run_id, status, start_time, end_time, exit_message)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(execution_id) DO UPDATE SET
        status = excluded.status,
        end_time = excluded.end_time,
        exit_message = excluded.exit_message";

/// Records job executions in the `batch_job_execution` table, so run ids keep
/// increasing across process invocations.
pub struct SqliteJobRepository<'a> {
    pool: &'a Pool<Sqlite>,
}

impl<'a> SqliteJobRepository<'a> {
    pub fn new(pool: &'a Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Creates the execution table when it does not exist yet.
    pub fn initialize(&self) -> Result<(), BatchError> {
        block_on(sqlx::query(CREATE_TABLE).execute(self.pool))
            .map(|_| ())
            .map_err(|error| BatchError::JobRepository(error.to_string()))
    }
}

impl JobRepository for SqliteJobRepository<'_> {
    fn last_run_id(&self, job_name: &str) -> Result<Option<u64>, BatchError> {
        let last: Option<i64> = block_on(
            sqlx::query_scalar(LAST_RUN_ID)
                .bind(job_name)
                .fetch_one(self.pool),
        )
        .map_err(|error| BatchError::JobRepository(error.to_string()))?;

        last.map(|run_id| {
            u64::try_from(run_id)
                .map_err(|_| BatchError::JobRepository(format!("invalid run id {run_id}")))
        })
        .transpose()
    }

    fn save(&self, execution: &JobExecution) -> Result<(), BatchError> {
        let run_id = i64::try_from(execution.run_id).map_err(|_| {
            BatchError::JobRepository(format!("run id {} out of range", execution.run_id))
        })?;

        block_on(
            sqlx::query(UPSERT)
                .bind(execution.id.to_string())
                .bind(execution.job_name.clone())
                .bind(run_id)
                .bind(execution.status.as_str())
                .bind(execution.start_time.to_rfc3339())
                .bind(execution.end_time.map(|end_time| end_time.to_rfc3339()))
                .bind(execution.exit_message.clone())
                .execute(self.pool),
        )
        .map(|_| ())
        .map_err(|error| BatchError::JobRepository(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
    use tempfile::NamedTempFile;

    use crate::core::{
        job::{JobExecution, JobStatus},
        repository::JobRepository,
    };

    use super::SqliteJobRepository;

    async fn pool(file: &NamedTempFile) -> Result<SqlitePool, sqlx::Error> {
        SqlitePool::connect_with(SqliteConnectOptions::new().filename(file.path())).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_ids_survive_a_new_repository() -> anyhow::Result<()> {
        let file = NamedTempFile::new()?;
        let pool = pool(&file).await?;

        let repository = SqliteJobRepository::new(&pool);
        repository.initialize()?;
        assert_eq!(repository.last_run_id("importUserJob")?, None);

        let mut execution = JobExecution::new("importUserJob", 1);
        repository.save(&execution)?;
        execution.status = JobStatus::Completed;
        repository.save(&execution)?;
        repository.save(&JobExecution::new("importUserJob", 2))?;

        let reopened = SqliteJobRepository::new(&pool);
        reopened.initialize()?;
        assert_eq!(reopened.last_run_id("importUserJob")?, Some(2));
        assert_eq!(reopened.last_run_id("otherJob")?, None);

        let statuses: Vec<String> = sqlx::query_scalar(
            "SELECT status FROM batch_job_execution WHERE job_name = ? ORDER BY run_id",
        )
        .bind("importUserJob")
        .fetch_all(&pool)
        .await?;
        assert_eq!(statuses, vec!["COMPLETED", "STARTING"]);

        Ok(())
    }
}
