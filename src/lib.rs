//! Inbound skid tracking for a receiving dock: serial allocation, durable
//! skid records, scan-driven completion, and read-only label/export views.
//!
//! # Examples
//!
//! Formatting a serial for a fixed date:
//! ```
//! use chrono::NaiveDate;
//! use skidlog::core::{checksum::luhn_is_valid, serial::allocate_serial};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 2, 1).expect("date");
//! let serial = allocate_serial("01", 42, date).expect("serial");
//! assert_eq!(&serial[..19], "0401202403200000042");
//! assert!(luhn_is_valid(&serial));
//! ```
//!
//! Runtime usage with a SQLite store:
//! ```no_run
//! use std::sync::Arc;
//!
//! use skidlog::{
//!     core::serial::SystemClock,
//!     intake::IntakeRequest,
//!     persist::sqlite::SqliteRecordStore,
//!     runtime::handle::{spawn_skidlog, RuntimeConfig},
//!     vendor::VendorDirectory,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteRecordStore::open("skidlog.db").expect("open sqlite");
//! let vendors = VendorDirectory::load("vendor.csv").expect("vendors");
//! let handle = spawn_skidlog(Box::new(store), vendors, Arc::new(SystemClock), RuntimeConfig::default());
//! let receipt = handle.intake(IntakeRequest {
//!     vendor_code: "V1".to_string(),
//!     total_skids: 3,
//!     invoice_no: "INV-1".to_string(),
//! }).await.expect("intake");
//! handle.scan(receipt.records[0].serial_no.clone()).await.expect("scan");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```

/// HTTP routes and problem responses.
pub mod api;
/// Environment configuration for the server binary.
pub mod config;
/// Checksum engine, serial allocator, and in-memory store.
pub mod core;
/// CSV field quoting shared by vendor import and record export.
pub mod csv;
/// Batch intake workflow and scan routing.
pub mod intake;
/// Record store abstraction and SQLite implementation.
pub mod persist;
/// Read-only summaries, labels, and exports.
pub mod projection;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Skid records and query filters.
pub mod skid;
/// Shared primitive types and enums.
pub mod types;
/// Vendor reference data.
pub mod vendor;
