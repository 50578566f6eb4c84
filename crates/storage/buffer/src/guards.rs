use crate::frame::Frame;
use parking_lot::RawRwLock;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use segment::page_id::PageId;
use std::fmt;
use std::sync::Arc;

/// A held frame latch, shared or exclusive.
///
/// The guards are owned (`Arc`-based), so a fixed page can travel with the
/// client without borrowing from the pool. Dropping the latch releases it.
pub(crate) enum Latch {
    Shared(ArcRwLockReadGuard<RawRwLock, Box<[u8]>>),
    Exclusive(ArcRwLockWriteGuard<RawRwLock, Box<[u8]>>),
}

impl Latch {
    pub(crate) fn bytes(&self) -> &[u8] {
        match self {
            Latch::Shared(guard) => guard,
            Latch::Exclusive(guard) => guard,
        }
    }

    pub(crate) fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Latch::Exclusive(guard) => Some(guard),
            Latch::Shared(_) => None,
        }
    }

    pub(crate) fn is_exclusive(&self) -> bool {
        matches!(self, Latch::Exclusive(_))
    }
}

/// A page fixed in the buffer pool.
///
/// Holds the frame's latch in the mode requested from
/// [`fix_page`](crate::buffer::BufferManager::fix_page) and keeps the frame
/// alive for the duration of the bracket. Release it through
/// [`unfix_page`](crate::buffer::BufferManager::unfix_page); dropping the
/// handle releases the latch too and is equivalent to unfixing clean.
pub struct FixedPage {
    pub(crate) frame: Arc<Frame>,
    pub(crate) latch: Latch,
}

impl FixedPage {
    pub(crate) fn new(frame: Arc<Frame>, latch: Latch) -> Self {
        Self { frame, latch }
    }

    /// The id of the fixed page.
    pub fn page_id(&self) -> PageId {
        self.frame.page_id()
    }

    /// The page bytes.
    pub fn data(&self) -> &[u8] {
        self.latch.bytes()
    }

    /// The page bytes, writable.
    ///
    /// # Panics
    /// Panics when the page was fixed shared; mutation requires an exclusive
    /// fix.
    pub fn data_mut(&mut self) -> &mut [u8] {
        match self.latch.bytes_mut() {
            Some(bytes) => bytes,
            None => panic!(
                "page {} was fixed shared; writing requires an exclusive fix",
                self.frame.page_id()
            ),
        }
    }

    /// Whether the page is held exclusively.
    pub fn is_exclusive(&self) -> bool {
        self.latch.is_exclusive()
    }
}

impl fmt::Debug for FixedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPage")
            .field("page_id", &self.frame.page_id())
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}
