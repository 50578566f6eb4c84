//! Provides the implementation for the main buffer pool leveraged by the engine

use crate::config::BufferConfig;
use crate::errors::{BufferError, BufferResult};
use crate::frame::Frame;
use crate::guards::FixedPage;
use parking_lot::Mutex;
use segment::api::SegmentManager;
use segment::disk_segment_manager::DiskSegmentManager;
use segment::page_id::PageId;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Structural state of the pool: which frame caches which page, and the two
/// replacement queues.
///
/// A resident frame is in the map and in exactly one of the queues: FIFO
/// while it has been fixed only once since admission, LRU from its second
/// fix on (most recently fixed at the tail). Eviction scans FIFO before LRU,
/// so pages touched once go first.
#[derive(Debug)]
struct PoolInner {
    map: HashMap<PageId, Arc<Frame>>,
    fifo: VecDeque<Arc<Frame>>,
    lru: VecDeque<Arc<Frame>>,
}

/// The buffer manager responsible for handling the cache pool of data pages.
///
/// Structural changes (map and queues) happen under the pool mutex; access to
/// a page's bytes is serialized by the frame's own reader/writer latch, held
/// for the duration of a fix/unfix bracket. The pool mutex is never acquired
/// while holding a frame latch, and a contended frame latch is only waited on
/// after the pool mutex has been released.
#[derive(Debug)]
pub struct BufferManager<S: SegmentManager> {
    files: Arc<S>,
    page_size: usize,
    capacity: usize,
    pool: Mutex<PoolInner>,
}

impl<S: SegmentManager> BufferManager<S> {
    /// Creates a new empty buffer manager holding at most `capacity` pages of
    /// `page_size` bytes, backed by `files`.
    pub fn new(files: Arc<S>, page_size: usize, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            files,
            page_size,
            capacity,
            pool: Mutex::new(PoolInner {
                map: HashMap::with_capacity(capacity),
                fifo: VecDeque::with_capacity(capacity),
                lru: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Size in bytes of every page in this pool.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Maximum number of pages resident at the same time.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fixes the page identified by `page_id` and returns a handle to its
    /// in-memory bytes, latched shared or exclusive per `exclusive`.
    ///
    /// A page that is not resident is read from its segment file, evicting
    /// another page first when the pool is full. When the pool is full and
    /// every resident frame is fixed, this fails with
    /// [`BufferError::BufferFull`] instead of waiting for a fix to be
    /// released.
    ///
    /// Thread-safe w.r.t. concurrent `fix_page`/`unfix_page` calls.
    pub fn fix_page(&self, page_id: PageId, exclusive: bool) -> BufferResult<FixedPage> {
        let mut pool = self.pool.lock();

        if let Some(frame) = pool.map.get(&page_id).cloned() {
            // Repeat access: the frame leaves FIFO for good and moves to the
            // LRU tail.
            detach(&mut pool.fifo, &frame);
            detach(&mut pool.lru, &frame);
            pool.lru.push_back(Arc::clone(&frame));

            if let Some(latch) = frame.try_latch(exclusive) {
                return Ok(FixedPage::new(frame, latch));
            }

            // Latch contended. Claim the frame so eviction leaves it alone,
            // then wait without the pool mutex.
            frame.claim();
            drop(pool);
            let latch = frame.latch(exclusive);
            frame.release_claim();
            return Ok(FixedPage::new(frame, latch));
        }

        if pool.map.len() >= self.capacity {
            self.evict_one(&mut pool)?;
        }

        let frame = Arc::new(Frame::new(page_id, self.page_size));
        frame
            .load(self.files.as_ref())
            .map_err(|source| BufferError::Io { page_id, source })?;

        pool.map.insert(page_id, Arc::clone(&frame));
        pool.fifo.push_back(Arc::clone(&frame));

        // Uncontended: the frame has not been handed out yet.
        let latch = frame.latch(exclusive);
        Ok(FixedPage::new(frame, latch))
    }

    /// Releases a page returned by an earlier [`BufferManager::fix_page`].
    /// When `is_dirty` is true the page is written back to its segment file
    /// eventually (on eviction or teardown).
    pub fn unfix_page(&self, page: FixedPage, is_dirty: bool) {
        if is_dirty {
            debug_assert!(
                page.is_exclusive(),
                "page {} unfixed dirty but was fixed shared",
                page.page_id()
            );
            page.frame.mark_dirty();
        }
        // Dropping the handle releases the latch.
        drop(page);
    }

    /// The page ids of all pages currently in the FIFO queue, oldest first.
    pub fn fifo_snapshot(&self) -> Vec<PageId> {
        self.pool.lock().fifo.iter().map(|f| f.page_id()).collect()
    }

    /// The page ids of all pages currently in the LRU queue, least recently
    /// fixed first.
    pub fn lru_snapshot(&self) -> Vec<PageId> {
        self.pool.lock().lru.iter().map(|f| f.page_id()).collect()
    }

    /// Picks a victim, writes it back if dirty and drops it from the pool.
    ///
    /// Scans FIFO oldest-first, then LRU least-recent-first. A frame is a
    /// candidate only when nobody holds or awaits its latch; when every
    /// resident frame is fixed this fails with `BufferFull` rather than
    /// blocking, since waiting here while pinning pages of our own could
    /// deadlock with the other pinners.
    fn evict_one(&self, pool: &mut PoolInner) -> BufferResult<()> {
        let mut victim = None;
        for frame in pool.fifo.iter().chain(pool.lru.iter()) {
            if frame.is_claimed() {
                continue;
            }
            if let Some(latch) = frame.try_latch(true) {
                victim = Some((Arc::clone(frame), latch));
                break;
            }
        }

        let Some((frame, latch)) = victim else {
            return Err(BufferError::BufferFull {
                capacity: self.capacity,
            });
        };

        tracing::debug!(page_id = %frame.page_id(), "evicting page");
        if let Err(err) = frame.flush(self.files.as_ref(), latch.bytes()) {
            tracing::warn!(
                page_id = %frame.page_id(),
                error = %err,
                "write-back failed during eviction; page contents are lost"
            );
        }

        pool.map.remove(&frame.page_id());
        detach(&mut pool.fifo, &frame);
        detach(&mut pool.lru, &frame);
        Ok(())
    }
}

impl BufferManager<DiskSegmentManager> {
    /// Opens a disk-backed pool over the segment files in the config's data
    /// directory.
    pub fn open(config: &BufferConfig) -> Self {
        let files = Arc::new(DiskSegmentManager::new(config.data_dir.clone()));
        Self::new(files, config.page_size.get(), config.buffer_pages.get())
    }
}

impl<S: SegmentManager> Drop for BufferManager<S> {
    /// Writes every dirty resident page back to its segment file,
    /// best-effort: a failed write-back is logged and the remaining frames
    /// are still flushed and freed.
    fn drop(&mut self) {
        let pool = self.pool.get_mut();
        for frame in pool.map.values() {
            match frame.try_bytes_mut() {
                Some(bytes) => {
                    if let Err(err) = frame.flush(self.files.as_ref(), &bytes) {
                        tracing::warn!(
                            page_id = %frame.page_id(),
                            error = %err,
                            "write-back failed during teardown"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        page_id = %frame.page_id(),
                        "page still fixed at teardown; skipping write-back"
                    );
                }
            }
        }
        pool.map.clear();
        pool.fifo.clear();
        pool.lru.clear();
    }
}

/// Unlinks `frame` from `queue` if present.
fn detach(queue: &mut VecDeque<Arc<Frame>>, frame: &Arc<Frame>) {
    queue.retain(|f| !Arc::ptr_eq(f, frame));
}

// ------------------------------------------------------------------------------------------------
