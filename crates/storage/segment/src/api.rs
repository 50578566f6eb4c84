//! Public API for the `segment` crate

use crate::page_id::SegmentId;
use std::io;

/// Segment manager public API
///
/// A `SegmentManager` manages a collection of segments, each a flat sequence
/// of bytes addressed positionally. Implementations are free to choose the
/// backing storage; the trait itself documents method-level expectations.
/// Concurrent calls for distinct offsets must be safe.
pub trait SegmentManager: Send + Sync {
    /// Definition
    /// Read `destination.len()` bytes from the segment at `offset`.
    ///
    /// Params
    /// - `segment_id`: Identifier of the segment to read from.
    /// - `offset`: Byte offset within the segment.
    /// - `destination`: Caller-provided buffer to receive the bytes.
    ///
    /// Return
    /// - `io::Result<()>`: `Ok` when the buffer was filled. Bytes past the
    ///   current segment length read as zero, and a segment that does not
    ///   exist yet is created empty first, so reading a never-written page
    ///   yields a zero-filled buffer.
    fn read_block(
        &self,
        segment_id: SegmentId,
        offset: u64,
        destination: &mut [u8],
    ) -> io::Result<()>;

    /// Definition
    /// Write the contents of `source` into the segment at `offset`.
    ///
    /// Params
    /// - `segment_id`: Identifier of the segment to write to.
    /// - `source`: Bytes to write.
    /// - `offset`: Byte offset within the segment. The segment grows as
    ///   needed; any gap below `offset` reads as zero afterwards.
    ///
    /// Return
    /// - `io::Result<()>`: `Ok` when every byte was written.
    fn write_block(&self, segment_id: SegmentId, source: &[u8], offset: u64) -> io::Result<()>;
}
