use std::cell::RefCell;

use crate::BatchError;

use super::job::JobExecution;

#[cfg(feature = "rdbc-sqlite")]
/// Job repository persisting executions in SQLite.
pub mod sqlite;

/// Stores job executions so that run ids keep increasing between runs.
pub trait JobRepository {
    /// Returns the highest run id recorded for `job_name`, if any.
    fn last_run_id(&self, job_name: &str) -> Result<Option<u64>, BatchError>;

    /// Inserts the execution, or updates it when its id is already known.
    fn save(&self, execution: &JobExecution) -> Result<(), BatchError>;
}

impl<T: JobRepository + ?Sized> JobRepository for &T {
    fn last_run_id(&self, job_name: &str) -> Result<Option<u64>, BatchError> {
        (**self).last_run_id(job_name)
    }

    fn save(&self, execution: &JobExecution) -> Result<(), BatchError> {
        (**self).save(execution)
    }
}

/// Job repository living for the duration of the process.
#[derive(Default)]
pub struct InMemoryJobRepository {
    executions: RefCell<Vec<JobExecution>>,
}

impl InMemoryJobRepository {
    pub fn find_by_job_name(&self, job_name: &str) -> Vec<JobExecution> {
        self.executions
            .borrow()
            .iter()
            .filter(|execution| execution.job_name == job_name)
            .cloned()
            .collect()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn last_run_id(&self, job_name: &str) -> Result<Option<u64>, BatchError> {
        Ok(self
            .executions
            .borrow()
            .iter()
            .filter(|execution| execution.job_name == job_name)
            .map(|execution| execution.run_id)
            .max())
    }

    fn save(&self, execution: &JobExecution) -> Result<(), BatchError> {
        let mut executions = self.executions.borrow_mut();
        match executions.iter_mut().find(|saved| saved.id == execution.id) {
            Some(saved) => *saved = execution.clone(),
            None => executions.push(execution.clone()),
        }
        Ok(())
    }
}
