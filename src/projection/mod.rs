//! Read-only views built from the record store.

/// CSV export of every record.
pub mod export;
/// Printable label payloads.
pub mod labels;
/// Daily progress summary.
pub mod summary;
