use crate::api::SegmentManager;
use crate::page_id::SegmentId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// A disk based segment manager
///
/// Each segment lives in its own file inside `base_dir`, named by the decimal
/// representation of the segment id (segment `7` is the file `"7"`). Open
/// handles are cached for the lifetime of the manager.
#[derive(Debug)]
pub struct DiskSegmentManager {
    base_dir: PathBuf,
    files: RwLock<HashMap<SegmentId, Arc<File>>>,
}

impl DiskSegmentManager {
    /// Creates a manager storing its segment files under `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a manager storing its segment files in the current working
    /// directory.
    pub fn in_current_dir() -> Self {
        Self::new(".")
    }

    fn get_or_open_file(&self, segment_id: SegmentId) -> io::Result<Arc<File>> {
        // 1. Fast path — read lock
        {
            let files = self.files.read();
            if let Some(file) = files.get(&segment_id) {
                return Ok(Arc::clone(file));
            }
        }

        // 2. Slow path — write lock
        let mut files = self.files.write();

        // 3. Double-check
        if let Some(file) = files.get(&segment_id) {
            return Ok(Arc::clone(file));
        }

        // 4. Actually open the file, creating the segment if it does not
        //    exist yet
        let path = self.base_dir.join(segment_id.to_string());
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        tracing::trace!(segment_id, path = %path.display(), "opened segment file");

        let file = Arc::new(file);
        files.insert(segment_id, Arc::clone(&file));

        Ok(file)
    }

    #[inline]
    fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.read_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_read(buf, offset)
        }
    }

    #[inline]
    fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
        #[cfg(unix)]
        {
            file.write_at(buf, offset)
        }

        #[cfg(windows)]
        {
            file.seek_write(buf, offset)
        }
    }
}

impl SegmentManager for DiskSegmentManager {
    fn read_block(
        &self,
        segment_id: SegmentId,
        offset: u64,
        destination: &mut [u8],
    ) -> io::Result<()> {
        let file = self.get_or_open_file(segment_id)?;

        // Anything the file does not cover stays zero.
        destination.fill(0);

        let mut read = 0;
        while read < destination.len() {
            let n = Self::read_at(file.as_ref(), &mut destination[read..], offset + read as u64)?;
            if n == 0 {
                break;
            }
            read += n;
        }

        Ok(())
    }

    fn write_block(&self, segment_id: SegmentId, source: &[u8], offset: u64) -> io::Result<()> {
        let file = self.get_or_open_file(segment_id)?;

        let mut written = 0;
        while written < source.len() {
            let n = Self::write_at(file.as_ref(), &source[written..], offset + written as u64)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "segment write returned 0 bytes",
                ));
            }
            written += n;
        }

        Ok(())
    }
}
