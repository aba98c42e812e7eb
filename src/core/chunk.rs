#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    Continuable,
    Finished,
    Full,
}

/// Items read for one commit interval.
pub struct Chunk<R> {
    items: Vec<R>,
    status: ChunkStatus,
    chunk_size: usize,
}

impl<R> Chunk<R> {
    pub fn new(chunk_size: usize) -> Chunk<R> {
        Chunk {
            items: Vec::with_capacity(chunk_size),
            status: ChunkStatus::Continuable,
            chunk_size,
        }
    }

    /// Adds the outcome of one read. `None` means the reader is exhausted.
    pub fn add_item(&mut self, read_item: Option<R>) {
        match read_item {
            Some(item) => {
                self.items.push(item);
                self.status = if self.items.len() >= self.chunk_size {
                    ChunkStatus::Full
                } else {
                    ChunkStatus::Continuable
                };
            }
            None => self.status = ChunkStatus::Finished,
        }
    }

    pub fn get_items(&self) -> &[R] {
        &self.items
    }

    pub fn get_status(&self) -> &ChunkStatus {
        &self.status
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.status = ChunkStatus::Continuable;
        self.items.clear();
    }
}
