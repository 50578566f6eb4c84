use crate::guards::Latch;
use parking_lot::RwLock;
use segment::api::SegmentManager;
use segment::page_id::PageId;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Load state of a frame's byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameState {
    /// Buffer allocated, contents not yet loaded from the segment file
    Empty,
    /// Contents match the on-disk image
    Clean,
    /// Contents have been written by a client since the last load/flush
    Dirty,
}

impl FrameState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => FrameState::Empty,
            1 => FrameState::Clean,
            _ => FrameState::Dirty,
        }
    }
}

/// The in-memory image of one page.
///
/// The page bytes sit behind an `Arc<RwLock<..>>`; that `RwLock` is also the
/// frame's reader/writer latch. A frame is *pinned* exactly while some client
/// holds the latch, so eviction probes pinnedness with a non-blocking
/// exclusive acquire instead of keeping a reference count.
///
/// `hit_claims` covers the one gap that probe leaves open: a hit-path caller
/// that failed the non-blocking acquire registers a claim before giving up
/// the pool mutex, and drops it once the blocking acquire went through.
/// Eviction skips claimed frames, so a frame a caller is still waiting on is
/// never destroyed under them.
#[derive(Debug)]
pub(crate) struct Frame {
    page_id: PageId,
    /// Byte offset of the page within its segment file
    offset: u64,
    state: AtomicU8,
    hit_claims: AtomicUsize,
    bytes: Arc<RwLock<Box<[u8]>>>,
}

impl Frame {
    /// Creates the frame descriptor with a zeroed buffer. No I/O happens
    /// until [`Frame::load`].
    pub(crate) fn new(page_id: PageId, page_size: usize) -> Self {
        Self {
            page_id,
            offset: page_id.byte_offset(page_size),
            state: AtomicU8::new(FrameState::Empty as u8),
            hit_claims: AtomicUsize::new(0),
            bytes: Arc::new(RwLock::new(vec![0u8; page_size].into_boxed_slice())),
        }
    }

    pub(crate) fn page_id(&self) -> PageId {
        self.page_id
    }

    pub(crate) fn state(&self) -> FrameState {
        // Plain Relaxed: every state transition happens under the pool mutex
        // or the frame's exclusive latch, which order it against readers.
        FrameState::from_u8(self.state.load(Ordering::Relaxed))
    }

    fn set_state(&self, state: FrameState) {
        self.state.store(state as u8, Ordering::Relaxed);
    }

    /// Marks the buffer as modified. Caller must hold the exclusive latch.
    pub(crate) fn mark_dirty(&self) {
        self.set_state(FrameState::Dirty);
    }

    /// Reads the page bytes from the segment file.
    ///
    /// Called by the pool at admission, before the frame is visible to any
    /// client; a never-written page reads as all zeroes. Empty -> Clean.
    pub(crate) fn load(&self, files: &impl SegmentManager) -> io::Result<()> {
        if self.state() != FrameState::Empty {
            return Ok(());
        }
        let mut bytes = self.bytes.write();
        files.read_block(self.page_id.segment_id(), self.offset, &mut bytes)?;
        self.set_state(FrameState::Clean);
        Ok(())
    }

    /// Writes the buffer back to the segment file if it is dirty; does
    /// nothing for a clean or empty frame. Dirty -> Clean.
    ///
    /// `bytes` are the frame's own page bytes, passed in by the caller that
    /// already holds the latch on them (eviction holds the exclusive latch,
    /// teardown a `try_write` guard).
    pub(crate) fn flush(&self, files: &impl SegmentManager, bytes: &[u8]) -> io::Result<()> {
        if self.state() != FrameState::Dirty {
            return Ok(());
        }
        files.write_block(self.page_id.segment_id(), bytes, self.offset)?;
        self.set_state(FrameState::Clean);
        Ok(())
    }

    /// Acquires the frame latch, blocking until it is granted.
    pub(crate) fn latch(&self, exclusive: bool) -> Latch {
        if exclusive {
            Latch::Exclusive(self.bytes.write_arc())
        } else {
            Latch::Shared(self.bytes.read_arc())
        }
    }

    /// Attempts to acquire the frame latch without blocking.
    pub(crate) fn try_latch(&self, exclusive: bool) -> Option<Latch> {
        if exclusive {
            self.bytes.try_write_arc().map(Latch::Exclusive)
        } else {
            self.bytes.try_read_arc().map(Latch::Shared)
        }
    }

    /// Non-blocking `try_write` on the frame bytes, for teardown.
    pub(crate) fn try_bytes_mut(&self) -> Option<parking_lot::RwLockWriteGuard<'_, Box<[u8]>>> {
        self.bytes.try_write()
    }

    /// Registers a hit-path claim. Must be called under the pool mutex.
    pub(crate) fn claim(&self) {
        self.hit_claims.fetch_add(1, Ordering::Relaxed);
    }

    /// Drops a hit-path claim once the blocking latch acquire succeeded.
    pub(crate) fn release_claim(&self) {
        self.hit_claims.fetch_sub(1, Ordering::Relaxed);
    }

    /// Whether some hit-path caller is waiting on this frame's latch.
    /// Only meaningful under the pool mutex.
    pub(crate) fn is_claimed(&self) -> bool {
        self.hit_claims.load(Ordering::Relaxed) > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segment::in_memory_segment_manager::InMemorySegmentManager;

    #[test]
    fn new_frame_is_empty_with_zeroed_buffer() {
        let frame = Frame::new(PageId::new(1, 2), 512);

        assert_eq!(frame.state(), FrameState::Empty);
        assert_eq!(frame.offset, 2 * 512);
        let bytes = frame.bytes.read();
        assert_eq!(bytes.len(), 512);
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn load_reads_segment_bytes_and_marks_clean() {
        let files = InMemorySegmentManager::new();
        files.write_block(1, &[0xaau8; 512], 512).unwrap();
        let frame = Frame::new(PageId::new(1, 1), 512);

        frame.load(&files).unwrap();

        assert_eq!(frame.state(), FrameState::Clean);
        assert!(frame.bytes.read().iter().all(|b| *b == 0xaa));
    }

    #[test]
    fn load_is_a_no_op_once_loaded() {
        let files = InMemorySegmentManager::new();
        let frame = Frame::new(PageId::new(0, 0), 64);
        frame.load(&files).unwrap();

        {
            let mut bytes = frame.bytes.write();
            bytes[0] = 42;
        }
        frame.load(&files).unwrap();

        assert_eq!(frame.bytes.read()[0], 42);
    }

    #[test]
    fn flush_writes_back_only_when_dirty() {
        let files = InMemorySegmentManager::new();
        let frame = Frame::new(PageId::new(3, 0), 64);
        frame.load(&files).unwrap();

        {
            let mut bytes = frame.bytes.write();
            bytes.fill(7);
        }

        // Clean frame: flush must not touch the segment.
        frame
            .flush(&files, &frame.bytes.read())
            .unwrap();
        assert!(files.segment_contents(3).unwrap().is_empty());

        frame.mark_dirty();
        frame
            .flush(&files, &frame.bytes.read())
            .unwrap();
        assert_eq!(frame.state(), FrameState::Clean);
        assert_eq!(files.segment_contents(3).unwrap(), vec![7u8; 64]);
    }
}
