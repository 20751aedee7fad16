//! Checksum, serial allocation, and the in-memory record store.

/// Luhn check digits.
pub mod checksum;
/// Serial formatting and clocks.
pub mod serial;
/// In-memory record store.
pub mod store;
