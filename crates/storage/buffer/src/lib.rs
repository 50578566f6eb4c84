//! Page buffer management for the storage engine.

pub mod buffer;

/// Pool configuration, loadable from a TOML file.
pub mod config;

pub mod errors;

mod frame;

/// Exposes the `FixedPage` handle that provides access to a fixed page's
/// bytes for the duration of a fix/unfix bracket.
pub mod guards;
