//! This module defines the canonical, strongly-typed representations of the
//! on-disk vocabulary: the closed set of physical types and the closed set of
//! encodings.
//!
//! Additional types related to page metadata may be added here.

pub mod physical_type;

pub use physical_type::{Encoding, PhysicalType};

/// INT96 values are three little-endian 32-bit words. The type is deprecated
/// by the format and is decode-only.
pub type Int96 = [i32; 3];

/// What a value encoder produced on `flush`. The realized encoding may
/// differ from the requested one: the adaptive dictionary encoder reports
/// `Plain` for pages written after its fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushResult {
    pub bytes_written: usize,
    pub encoding: Encoding,
}
