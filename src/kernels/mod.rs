//! This module collects the codec kernels, one per wire format. Every
//! kernel builds on the bit cursor; the facade in `values` selects and
//! drives them.

/// Foundation: the bit-level cursor.
pub mod bitstream;

/// The RLE/bit-packed hybrid stream (dictionary indices, boolean pages,
/// levels).
pub mod rle;

/// PLAIN, for every physical type.
pub mod plain;

/// Dictionary pages, index streams, and the adaptive dict-or-plain encoder.
pub mod dictionary;

/// DELTA_BINARY_PACKED for INT32/INT64.
pub mod delta;

/// DELTA_LENGTH_BYTE_ARRAY and DELTA_BYTE_ARRAY.
pub mod delta_byte_array;

/// BYTE_STREAM_SPLIT for FLOAT/DOUBLE.
pub mod byte_stream_split;
