//! Segment file management: fixed-size pages stored in per-segment files.

/// Public API for the `segment` crate
pub mod api;

/// Disk-backed segment manager
pub mod disk_segment_manager;

/// In-memory segment manager, used as a test double
pub mod in_memory_segment_manager;

/// Page identifiers and their segment/page-number encoding
pub mod page_id;
