use log::{error, info};
use sqlx::{Pool, Sqlite};

use crate::{
    core::job::{JobExecution, JobStatus},
    item::rdbc::block_on,
};

use super::person::Person;

/// Returns every row committed to `people`, in insertion order.
pub fn committed_people(pool: &Pool<Sqlite>) -> Result<Vec<Person>, sqlx::Error> {
    block_on(
        sqlx::query_as::<_, Person>("SELECT first_name, last_name FROM people ORDER BY person_id")
            .fetch_all(pool),
    )
}

/// Completion notification of `importUserJob`.
///
/// A completed run lists the rows now present in `people`; a failed run logs
/// its cause.
pub fn notify_completion(pool: &Pool<Sqlite>, execution: &JobExecution) {
    match execution.status {
        JobStatus::Completed => {
            info!("!!! JOB FINISHED! Time to verify the results");

            match committed_people(pool) {
                Ok(people) => people
                    .iter()
                    .for_each(|person| info!("Found <{}> in the database.", person)),
                Err(err) => error!("Unable to list committed people: {}", err),
            }
        }
        JobStatus::Failed => error!(
            "Job {} run.id {} failed: {}",
            execution.job_name,
            execution.run_id,
            execution.exit_message.as_deref().unwrap_or("unknown cause")
        ),
        JobStatus::Starting | JobStatus::Running => {}
    }
}
