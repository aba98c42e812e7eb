use crate::error::BatchError;

/// Result of reading one item: `Ok(None)` once the source is exhausted.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of processing one item.
pub type ItemProcessorResult<W> = Result<W, BatchError>;

/// Result of writing a chunk of items.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieves input for a step, one item at a time.
pub trait ItemReader<R> {
    /// Reads the next item, `Ok(None)` when there is nothing left to read.
    fn read(&self) -> ItemReaderResult<R>;

    /// Prepares the reader for a new run. Restartable readers rewind here.
    fn open(&self) -> Result<(), BatchError> {
        Ok(())
    }

    fn close(&self) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Business logic applied to each item between reading and writing.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ItemProcessorResult<W>;
}

/// Output of a step, one chunk of items at a time.
///
/// A call to [`ItemWriter::write`] receives a whole chunk; writers backed by a
/// transactional store must commit all of it or none of it.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
