//! This module defines the canonical, type-safe representation of physical
//! types and encodings used throughout the strata codec core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The physical type of a column, as declared by the file schema.
///
/// This is the closed set of on-disk value representations. Logical types
/// (timestamps, decimals, strings...) are an annotation layer owned by the
/// embedding reader/writer and never reach the codecs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    /// Deprecated by the format; decode-only.
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

/// The encoding of a single page, as declared by the page header.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    /// Deprecated read-only alias of `RleDictionary`.
    PlainDictionary,
    RleDictionary,
    Rle,
    /// Legacy encoding for definition/repetition levels only.
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    ByteStreamSplit,
}

/// The string representations are part of the public contract; they match
/// the names used by the format specification.
impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicalType::Boolean => "BOOLEAN",
            PhysicalType::Int32 => "INT32",
            PhysicalType::Int64 => "INT64",
            PhysicalType::Int96 => "INT96",
            PhysicalType::Float => "FLOAT",
            PhysicalType::Double => "DOUBLE",
            PhysicalType::ByteArray => "BYTE_ARRAY",
            PhysicalType::FixedLenByteArray => "FIXED_LEN_BYTE_ARRAY",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Plain => "PLAIN",
            Encoding::PlainDictionary => "PLAIN_DICTIONARY",
            Encoding::RleDictionary => "RLE_DICTIONARY",
            Encoding::Rle => "RLE",
            Encoding::BitPacked => "BIT_PACKED",
            Encoding::DeltaBinaryPacked => "DELTA_BINARY_PACKED",
            Encoding::DeltaLengthByteArray => "DELTA_LENGTH_BYTE_ARRAY",
            Encoding::DeltaByteArray => "DELTA_BYTE_ARRAY",
            Encoding::ByteStreamSplit => "BYTE_STREAM_SPLIT",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_format_names() {
        assert_eq!(PhysicalType::FixedLenByteArray.to_string(), "FIXED_LEN_BYTE_ARRAY");
        assert_eq!(Encoding::DeltaBinaryPacked.to_string(), "DELTA_BINARY_PACKED");
    }
}
