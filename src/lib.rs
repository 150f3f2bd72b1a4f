//! This crate is the encoding/decoding core of a columnar file format
//! compatible with the Parquet data layout. It transforms between raw typed
//! column values and on-disk byte sequences: the bit cursor, the
//! RLE/bit-packed hybrid, PLAIN, dictionary pages with adaptive fallback,
//! the delta family, byte-stream-split, the definition/repetition level
//! codec, and the per-type facade that selects among them.
//!
//! The crate owns no I/O: the embedding page reader/writer hands codecs
//! pre-materialized page buffers and caller-provided sinks. Each codec
//! instance is a mutable owner of in-progress state; distinct instances are
//! independent across threads.

pub mod error;
pub mod kernels;
pub mod levels;
pub mod traits;
pub mod types;
pub mod utils;
pub mod values;

#[cfg(test)]
mod values_tests;

pub use error::{Result, StrataError};
pub use levels::{LevelDecoder, LevelEncoder};
pub use types::{Encoding, FlushResult, Int96, PhysicalType};
pub use values::{
    make_value_encoder, BooleanType, ByteArrayType, ColumnType, DoubleType, FixedLenByteArrayType,
    FloatType, Int32Type, Int64Type, Int96Type, PageDecoder, PageEncoder, ValueDecoder,
};
