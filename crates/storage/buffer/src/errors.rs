use segment::page_id::PageId;
use thiserror::Error;

/// Buffer error.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The pool is full and every resident frame is currently fixed by some
    /// client. Non-fatal; the caller may retry after pages are unfixed.
    #[error("buffer is full: all {capacity} frames are pinned")]
    BufferFull {
        /// Configured frame capacity of the pool
        capacity: usize,
    },

    /// A segment file read failed while loading the page.
    #[error("i/o error on page {page_id}")]
    Io {
        /// The page on which the error occurred
        page_id: PageId,
        /// The underlying file error
        #[source]
        source: std::io::Error,
    },
}

/// Result type of buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;
