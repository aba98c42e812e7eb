use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::BatchError;

use super::{
    build_name,
    chunk::{Chunk, ChunkStatus},
    item::{ItemProcessor, ItemReader, ItemWriter},
};

/// Status of a step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Starting,
    Started,
    Success,
    Failed,
}

/// Counters and timing of one execution of a step.
///
/// A fresh `StepExecution` is handed to [`Step::execute`] on every run, so a
/// step definition can be executed any number of times.
#[derive(Debug, Clone)]
pub struct StepExecution {
    pub name: String,
    pub status: StepStatus,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub read_count: usize,
    pub write_count: usize,
    /// Number of chunks whose write was committed.
    pub commit_count: usize,
    /// Number of chunks whose write was rolled back.
    pub rollback_count: usize,
    pub read_error_count: usize,
    pub process_error_count: usize,
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            name: name.to_owned(),
            status: StepStatus::Starting,
            start: now,
            end: now,
            duration: Duration::ZERO,
            read_count: 0,
            write_count: 0,
            commit_count: 0,
            rollback_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }
}

/// A sequential phase of a job.
pub trait Step {
    /// Executes the step, recording progress into `step_execution`.
    ///
    /// On error the execution is left in [`StepStatus::Failed`] with its
    /// counters describing how far the step got.
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;

    fn get_name(&self) -> &str;
}

/// Chunk-oriented step: read `chunk_size` items, process them, write them as
/// one unit, repeat until the reader is exhausted.
pub struct StepInstance<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    chunk_size: usize,
}

impl<R, W> Step for StepInstance<'_, R, W> {
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        step_execution.start = Instant::now();
        step_execution.status = StepStatus::Started;

        info!("Start of step: {}", self.name);

        let result = self.run_chunks(step_execution);

        let closed = self.reader.close().and(self.writer.close());

        step_execution.end = Instant::now();
        step_execution.duration = step_execution.start.elapsed();

        let result = result.and(closed);
        match &result {
            Ok(()) => {
                step_execution.status = StepStatus::Success;
                info!(
                    "End of step: {}, read: {}, written: {}, commits: {}",
                    self.name,
                    step_execution.read_count,
                    step_execution.write_count,
                    step_execution.commit_count
                );
            }
            Err(err) => {
                step_execution.status = StepStatus::Failed;
                error!("Step {} failed: {}", self.name, err);
            }
        }

        result
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl<R, W> StepInstance<'_, R, W> {
    fn run_chunks(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        self.reader.open()?;
        self.writer.open()?;

        let mut chunk = Chunk::new(self.chunk_size);

        loop {
            chunk.clear();

            self.read_chunk(&mut chunk, step_execution)?;

            let processed_items = self.process_chunk(chunk.get_items(), step_execution)?;

            self.write_chunk(&processed_items, step_execution)?;

            if chunk.get_status() == &ChunkStatus::Finished {
                return Ok(());
            }
        }
    }

    fn read_chunk(
        &self,
        chunk: &mut Chunk<R>,
        step_execution: &mut StepExecution,
    ) -> Result<(), BatchError> {
        debug!("Start reading chunk");

        loop {
            match self.reader.read() {
                Ok(item) => {
                    if item.is_some() {
                        step_execution.read_count += 1;
                    }
                    chunk.add_item(item);
                }
                Err(err) => {
                    step_execution.read_error_count += 1;
                    error!("Error occured during read item: {}", err);
                    return Err(err);
                }
            }

            match chunk.get_status() {
                ChunkStatus::Full => {
                    debug!("End reading chunk: FULL");
                    return Ok(());
                }
                ChunkStatus::Finished => {
                    debug!("End reading chunk: FINISHED");
                    return Ok(());
                }
                ChunkStatus::Continuable => {}
            }
        }
    }

    fn process_chunk(
        &self,
        read_items: &[R],
        step_execution: &mut StepExecution,
    ) -> Result<Vec<W>, BatchError> {
        debug!("Start processing chunk");

        let mut processed_items = Vec::with_capacity(read_items.len());
        for item in read_items {
            match self.processor.process(item) {
                Ok(processed) => processed_items.push(processed),
                Err(err) => {
                    step_execution.process_error_count += 1;
                    error!("Error occured during process item: {}", err);
                    return Err(err);
                }
            }
        }

        debug!("End processing chunk");
        Ok(processed_items)
    }

    fn write_chunk(
        &self,
        processed_items: &[W],
        step_execution: &mut StepExecution,
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            return Ok(());
        }

        debug!("Start writing chunk of {} items", processed_items.len());

        match self
            .writer
            .write(processed_items)
            .and_then(|()| self.writer.flush())
        {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                step_execution.commit_count += 1;
                debug!("End writing chunk");
                Ok(())
            }
            Err(err) => {
                step_execution.write_error_count += processed_items.len();
                step_execution.rollback_count += 1;
                error!("ItemWriter error: {}", err);
                Err(err)
            }
        }
    }
}

/// Builder for a chunk-oriented [`StepInstance`].
pub struct StepBuilder<'a, R, W> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    chunk_size: usize,
}

impl<R, W> Default for StepBuilder<'_, R, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new() -> StepBuilder<'a, R, W> {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
        }
    }

    pub fn name(mut self, name: String) -> StepBuilder<'a, R, W> {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<R>) -> StepBuilder<'a, R, W> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<R, W>) -> StepBuilder<'a, R, W> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<W>) -> StepBuilder<'a, R, W> {
        self.writer = Some(writer);
        self
    }

    /// Sets the commit interval: the number of items written per transaction.
    pub fn chunk(mut self, chunk_size: usize) -> StepBuilder<'a, R, W> {
        self.chunk_size = chunk_size;
        self
    }

    pub fn build(self) -> Result<StepInstance<'a, R, W>, BatchError> {
        let name = self.name.unwrap_or_else(build_name);

        let reader = self.reader.ok_or_else(|| {
            BatchError::Configuration(format!("step {name}: an ItemReader is required"))
        })?;
        let processor = self.processor.ok_or_else(|| {
            BatchError::Configuration(format!("step {name}: an ItemProcessor is required"))
        })?;
        let writer = self.writer.ok_or_else(|| {
            BatchError::Configuration(format!("step {name}: an ItemWriter is required"))
        })?;

        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(format!(
                "step {name}: chunk size must be greater than zero"
            )));
        }

        Ok(StepInstance {
            name,
            reader,
            processor,
            writer,
            chunk_size: self.chunk_size,
        })
    }
}
