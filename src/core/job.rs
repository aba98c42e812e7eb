use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use log::{error, info};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    repository::{InMemoryJobRepository, JobRepository},
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
///
/// A failed step does not produce an `Err`: the returned [`JobExecution`]
/// carries [`JobStatus::Failed`]. `Err` is reserved for failures of the job
/// repository, when the outcome of the run cannot be recorded.
type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
pub trait Job {
    /// Runs the job once and returns the final state of the run.
    fn run(&self) -> JobResult<JobExecution>;
}

/// Lifecycle of a run: `Starting` → `Running` → `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Starting,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "STARTING",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents one run of a job.
///
/// Created when the run starts, finalized when it ends, and handed to every
/// completion listener.
#[derive(Debug, Clone)]
pub struct JobExecution {
    /// Unique identifier of this execution
    pub id: Uuid,
    pub job_name: String,
    /// Incrementing identifier distinguishing repeated runs of the same job
    pub run_id: u64,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Duration,
    /// Executions of the steps that ran, in order
    pub step_executions: Vec<StepExecution>,
    /// Error text of a failed run
    pub exit_message: Option<String>,
}

impl JobExecution {
    pub fn new(job_name: &str, run_id: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_name: job_name.to_owned(),
            run_id,
            status: JobStatus::Starting,
            start_time: Utc::now(),
            end_time: None,
            duration: Duration::ZERO,
            step_executions: Vec::new(),
            exit_message: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

/// Computes the run id of the next execution of a job.
///
/// Run ids start at 1 and grow by one for every run recorded by the
/// job repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunIdIncrementer;

impl RunIdIncrementer {
    pub fn next(&self, last_run_id: Option<u64>) -> u64 {
        last_run_id.map_or(1, |run_id| run_id + 1)
    }
}

type JobListener<'a> = Box<dyn Fn(&JobExecution) + 'a>;

/// Represents an instance of a job.
///
/// A job instance is created through the `JobBuilder` and executed by calling
/// the `run` method, any number of times. The steps are executed in the
/// order they were added.
pub struct JobInstance<'a> {
    name: String,
    steps: Vec<&'a dyn Step>,
    incrementer: RunIdIncrementer,
    repository: Box<dyn JobRepository + 'a>,
    listeners: Vec<JobListener<'a>>,
}

impl JobInstance<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    fn execute_steps(&self, execution: &mut JobExecution) {
        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());
            let result = step.execute(&mut step_execution);
            execution.step_executions.push(step_execution);

            if let Err(err) = result {
                execution.status = JobStatus::Failed;
                execution.exit_message =
                    Some(BatchError::Step(format!("{}: {}", step.get_name(), err)).to_string());
                return;
            }
        }

        execution.status = JobStatus::Completed;
    }
}

impl Job for JobInstance<'_> {
    /// Runs the job by executing its steps in sequence.
    ///
    /// The first failing step stops the run. Listeners are invoked once the
    /// run reached `Completed` or `Failed` and its state has been saved.
    fn run(&self) -> JobResult<JobExecution> {
        let last_run_id = self.repository.last_run_id(&self.name)?;
        let run_id = self.incrementer.next(last_run_id);

        let mut execution = JobExecution::new(&self.name, run_id);
        self.repository.save(&execution)?;

        info!(
            "Start of job: {}, run.id: {}, id: {}",
            self.name, run_id, execution.id
        );

        execution.status = JobStatus::Running;
        self.execute_steps(&mut execution);

        let end_time = Utc::now();
        execution.duration = (end_time - execution.start_time)
            .to_std()
            .unwrap_or(Duration::ZERO);
        execution.end_time = Some(end_time);

        self.repository.save(&execution)?;

        match execution.status {
            JobStatus::Completed => info!(
                "End of job: {}, run.id: {}, status: {}",
                self.name, run_id, execution.status
            ),
            _ => error!(
                "End of job: {}, run.id: {}, status: {}, cause: {}",
                self.name,
                run_id,
                execution.status,
                execution.exit_message.as_deref().unwrap_or("unknown")
            ),
        }

        for listener in &self.listeners {
            listener(&execution);
        }

        Ok(execution)
    }
}

/// Builder for creating a job instance.
///
/// # Example
///
/// ```rust,no_run,compile_fail
/// use herc_reader::core::job::JobBuilder;
///
/// let job = JobBuilder::new()
///     .name("importUserJob".to_string())
///     .start(&step)
///     .listener(|execution| println!("{}", execution.status))
///     .build();
/// ```
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    steps: Vec<&'a dyn Step>,
    incrementer: RunIdIncrementer,
    repository: Option<Box<dyn JobRepository + 'a>>,
    listeners: Vec<JobListener<'a>>,
}

impl Default for JobBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
            incrementer: RunIdIncrementer,
            repository: None,
            listeners: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the first step of the job.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job. Steps are executed in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    pub fn incrementer(mut self, incrementer: RunIdIncrementer) -> JobBuilder<'a> {
        self.incrementer = incrementer;
        self
    }

    /// Sets where executions are recorded. Defaults to an in-memory repository.
    pub fn repository(mut self, repository: impl JobRepository + 'a) -> JobBuilder<'a> {
        self.repository = Some(Box::new(repository));
        self
    }

    /// Registers a completion notification, invoked synchronously with the
    /// final execution of every run.
    pub fn listener(mut self, listener: impl Fn(&JobExecution) + 'a) -> JobBuilder<'a> {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
            incrementer: self.incrementer,
            repository: self
                .repository
                .unwrap_or_else(|| Box::new(InMemoryJobRepository::default())),
            listeners: self.listeners,
        }
    }
}
