//! Read-only vendor directory.

use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::csv::parse_records;

/// Reference data for one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique lookup key.
    pub vendor_code: String,
    /// Display name copied onto skid records.
    pub vendor_name: String,
}

/// Vendor directory load failures.
#[derive(Debug, Error)]
pub enum VendorError {
    /// The directory file could not be read.
    #[error("failed to read vendor file: {0}")]
    Io(#[from] std::io::Error),
    /// The header lacks a required column.
    #[error("vendor file header is missing column {0:?}")]
    MissingColumn(&'static str),
    /// A data line could not be parsed.
    #[error("malformed vendor line {line}")]
    Malformed {
        /// One-based line number.
        line: usize,
    },
}

/// Vendors keyed by code.
#[derive(Debug, Clone, Default)]
pub struct VendorDirectory {
    vendors: HashMap<String, Vendor>,
}

impl VendorDirectory {
    /// Builds a directory from `vendors`; later duplicates replace earlier ones.
    pub fn new(vendors: impl IntoIterator<Item = Vendor>) -> Self {
        let mut dir = Self::default();
        for vendor in vendors {
            dir.add(vendor);
        }
        dir
    }

    /// Loads a `vendorCode,vendorName` CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VendorError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv(&text)
    }

    /// Parses CSV text with a `vendorCode,vendorName` header.
    ///
    /// Quoted names may span lines.
    pub fn from_csv(text: &str) -> Result<Self, VendorError> {
        let records = parse_records(text).map_err(|line| VendorError::Malformed { line })?;
        let mut records = records.into_iter();

        let Some((_, header)) = records.next() else {
            return Ok(Self::default());
        };
        let code_col = column(&header, "vendorCode")?;
        let name_col = column(&header, "vendorName")?;

        let mut dir = Self::default();
        for (line, fields) in records {
            let (Some(code), Some(name)) = (fields.get(code_col), fields.get(name_col)) else {
                return Err(VendorError::Malformed { line });
            };
            dir.add(Vendor {
                vendor_code: code.trim().to_string(),
                vendor_name: name.trim().to_string(),
            });
        }
        Ok(dir)
    }

    /// Exact-match lookup on the trimmed code.
    pub fn lookup(&self, vendor_code: &str) -> Option<&Vendor> {
        self.vendors.get(vendor_code.trim())
    }

    /// Number of vendors.
    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    /// True when no vendors are loaded.
    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    fn add(&mut self, vendor: Vendor) {
        if let Some(prev) = self.vendors.insert(vendor.vendor_code.clone(), vendor) {
            warn!(vendor_code = %prev.vendor_code, "duplicate vendor code, keeping last entry");
        }
    }
}

fn column(header: &[String], name: &'static str) -> Result<usize, VendorError> {
    header
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
        .ok_or(VendorError::MissingColumn(name))
}
