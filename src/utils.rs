//! This module provides shared, low-level utility functions used throughout
//! the strata codec core.
//!
//! Its primary responsibilities are:
//! 1.  Safe, validated conversions between raw byte slices and typed slices.
//! 2.  The `bit_width` helper shared by the RLE hybrid, dictionary and delta
//!     kernels.

use bytemuck;

use crate::error::{Result, StrataError};

/// Number of bits needed to represent `max_n`; 0 when `max_n` is 0.
pub fn bit_width(max_n: u64) -> u32 {
    64 - max_n.leading_zeros()
}

/// Safely reinterprets a byte slice as a slice of a fixed-width value type.
///
/// This is the gateway for converting raw page bytes into a workable typed
/// slice without a copy. Length and alignment are validated by `bytemuck`;
/// a mismatch is reported as corruption since it means the page does not
/// hold a whole number of values.
pub fn bytes_to_typed_slice<T: bytemuck::Pod>(bytes: &[u8]) -> Result<&[T]> {
    bytemuck::try_cast_slice(bytes)
        .map_err(|e| StrataError::corrupted(format!("Failed to cast page bytes: {}", e)))
}

/// Converts a slice of fixed-width values into an owned byte vector,
/// respecting the platform (little-endian) byte order.
pub fn typed_slice_to_bytes<T: bytemuck::Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}
