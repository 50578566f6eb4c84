use crate::api::SegmentManager;
use crate::page_id::SegmentId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;

/// An in memory segment manager
///
/// Keeps every segment as a growable byte vector. Mirrors the disk manager's
/// semantics (zero-filled reads past the end, writes extend the segment) so
/// it can stand in for it in tests.
#[derive(Debug, Default)]
pub struct InMemorySegmentManager {
    segments: RwLock<HashMap<SegmentId, Vec<u8>>>,
}

impl InMemorySegmentManager {
    /// Creates a new empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the segment's current contents, if it exists.
    pub fn segment_contents(&self, segment_id: SegmentId) -> Option<Vec<u8>> {
        self.segments.read().get(&segment_id).cloned()
    }
}

impl SegmentManager for InMemorySegmentManager {
    fn read_block(
        &self,
        segment_id: SegmentId,
        offset: u64,
        destination: &mut [u8],
    ) -> io::Result<()> {
        destination.fill(0);

        let mut segments = self.segments.write();
        let segment = segments.entry(segment_id).or_default();

        let offset = offset as usize;
        if offset < segment.len() {
            let available = segment.len() - offset;
            let n = destination.len().min(available);
            destination[..n].copy_from_slice(&segment[offset..offset + n]);
        }

        Ok(())
    }

    fn write_block(&self, segment_id: SegmentId, source: &[u8], offset: u64) -> io::Result<()> {
        let mut segments = self.segments.write();
        let segment = segments.entry(segment_id).or_default();

        let offset = offset as usize;
        let end = offset + source.len();
        if segment.len() < end {
            segment.resize(end, 0);
        }
        segment[offset..end].copy_from_slice(source);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_of_missing_segment_yields_zeroes() {
        let manager = InMemorySegmentManager::new();
        let mut buf = [0xffu8; 32];

        manager.read_block(1, 0, &mut buf).unwrap();

        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn write_then_read_round_trips() {
        let manager = InMemorySegmentManager::new();

        manager.write_block(2, &[0xcdu8; 16], 48).unwrap();

        let mut buf = [0u8; 16];
        manager.read_block(2, 48, &mut buf).unwrap();
        assert_eq!(buf, [0xcdu8; 16]);
    }

    #[test]
    fn write_extends_segment_with_zero_gap() {
        let manager = InMemorySegmentManager::new();

        manager.write_block(3, &[9u8; 4], 100).unwrap();

        let contents = manager.segment_contents(3).unwrap();
        assert_eq!(contents.len(), 104);
        assert!(contents[..100].iter().all(|b| *b == 0));
        assert_eq!(&contents[100..], &[9u8; 4]);
    }

    #[test]
    fn read_spanning_the_end_zero_fills_the_tail() {
        let manager = InMemorySegmentManager::new();
        manager.write_block(4, &[5u8; 8], 0).unwrap();

        let mut buf = [0xffu8; 16];
        manager.read_block(4, 4, &mut buf).unwrap();

        assert_eq!(&buf[..4], &[5u8; 4]);
        assert!(buf[4..].iter().all(|b| *b == 0));
    }
}
