use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    /// The input resource could not be opened; the run never starts.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Error occured in step: {0}")]
    Step(String),

    #[error("JobRepository from: {0}")]
    JobRepository(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
