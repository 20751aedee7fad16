//! Luhn mod-10 check digits.

use thiserror::Error;

/// Rejected checksum input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChecksumError {
    /// Input was empty.
    #[error("checksum input is empty")]
    Empty,
    /// Input contained something other than ASCII decimal digits.
    #[error("checksum input contains a non-digit at position {position}")]
    InvalidDigits {
        /// Zero-based byte offset of the first offending character.
        position: usize,
    },
}

/// Computes the digit that makes `digits` followed by it pass [`luhn_is_valid`].
///
/// Weights are assigned as if the check digit were already appended, so the
/// rightmost input digit is the first one doubled.
pub fn luhn_check_digit(digits: &str) -> Result<u8, ChecksumError> {
    let values = parse_digits(digits)?;
    let total = weighted_sum(values.iter().rev().copied(), true);
    Ok(((10 - total % 10) % 10) as u8)
}

/// Returns true when `digits` (check digit last) passes the Luhn test.
pub fn luhn_is_valid(digits: &str) -> bool {
    match parse_digits(digits) {
        Ok(values) => weighted_sum(values.iter().rev().copied(), false) % 10 == 0,
        Err(_) => false,
    }
}

fn parse_digits(digits: &str) -> Result<Vec<u32>, ChecksumError> {
    if digits.is_empty() {
        return Err(ChecksumError::Empty);
    }
    digits
        .bytes()
        .enumerate()
        .map(|(position, b)| {
            if b.is_ascii_digit() {
                Ok(u32::from(b - b'0'))
            } else {
                Err(ChecksumError::InvalidDigits { position })
            }
        })
        .collect()
}

// `double_first` is true when iterating a payload that still lacks its check digit.
fn weighted_sum(from_right: impl Iterator<Item = u32>, double_first: bool) -> u32 {
    from_right
        .enumerate()
        .map(|(idx, d)| {
            let doubled = (idx % 2 == 0) == double_first;
            if doubled {
                let v = d * 2;
                if v > 9 { v - 9 } else { v }
            } else {
                d
            }
        })
        .sum()
}
