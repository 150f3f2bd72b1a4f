//! Type-linking traits shared by the codec kernels.
//!
//! `DeltaInt` links the two signed physical integer types to the unsigned
//! representation their delta arithmetic is performed in. Encoding computes
//! deltas by unsigned subtraction and decoding reverses them by unsigned
//! addition, so the round-trip is exact for the full signed range under
//! two's-complement wraparound.
//!
//! `DictKey` maps a physical value to a hashable key for the dictionary
//! builder. Floating-point values hash by bit pattern.

use bytes::Bytes;
use num_traits::{PrimInt, Signed, WrappingAdd, WrappingSub};

use crate::types::Int96;

/// A signed physical integer (INT32 or INT64) and its unsigned counterpart.
pub trait DeltaInt: PrimInt + Signed + WrappingAdd + WrappingSub {
    type Unsigned: PrimInt + WrappingAdd + WrappingSub;

    /// Worst-case VLQ length for this width, used for encoder size bounds.
    const MAX_VLQ_BYTES: usize;

    fn to_unsigned(self) -> Self::Unsigned;
    fn from_unsigned(v: Self::Unsigned) -> Self;
    /// Truncating conversion; the decoder accumulates in 64 bits and the
    /// result is exact modulo the physical width.
    fn from_u64_lossy(v: u64) -> Self;
    /// Sign-extending conversion for zigzag VLQ headers.
    fn to_i64(self) -> i64;
    /// Zero-extending conversion of the unsigned representation.
    fn unsigned_to_u64(v: Self::Unsigned) -> u64;
}

impl DeltaInt for i32 {
    type Unsigned = u32;
    const MAX_VLQ_BYTES: usize = 5;

    fn to_unsigned(self) -> u32 {
        self as u32
    }
    fn from_unsigned(v: u32) -> i32 {
        v as i32
    }
    fn from_u64_lossy(v: u64) -> i32 {
        v as u32 as i32
    }
    fn to_i64(self) -> i64 {
        self as i64
    }
    fn unsigned_to_u64(v: u32) -> u64 {
        v as u64
    }
}

impl DeltaInt for i64 {
    type Unsigned = u64;
    const MAX_VLQ_BYTES: usize = 10;

    fn to_unsigned(self) -> u64 {
        self as u64
    }
    fn from_unsigned(v: u64) -> i64 {
        v as i64
    }
    fn from_u64_lossy(v: u64) -> i64 {
        v as i64
    }
    fn to_i64(self) -> i64 {
        self
    }
    fn unsigned_to_u64(v: u64) -> u64 {
        v
    }
}

/// Maps a physical value to the key used for dictionary deduplication.
/// Identity is physical-value equality; for BYTE_ARRAY that means
/// byte-sequence equality over an owned (shared) copy of the key.
pub trait DictKey: Clone {
    type Key: Eq + std::hash::Hash + std::fmt::Debug;

    fn dict_key(&self) -> Self::Key;
}

impl DictKey for i32 {
    type Key = i32;
    fn dict_key(&self) -> i32 {
        *self
    }
}

impl DictKey for i64 {
    type Key = i64;
    fn dict_key(&self) -> i64 {
        *self
    }
}

impl DictKey for u8 {
    type Key = u8;
    fn dict_key(&self) -> u8 {
        *self
    }
}

impl DictKey for f32 {
    type Key = u32;
    fn dict_key(&self) -> u32 {
        self.to_bits()
    }
}

impl DictKey for f64 {
    type Key = u64;
    fn dict_key(&self) -> u64 {
        self.to_bits()
    }
}

impl DictKey for Int96 {
    type Key = Int96;
    fn dict_key(&self) -> Int96 {
        *self
    }
}

impl DictKey for Bytes {
    type Key = Bytes;
    fn dict_key(&self) -> Bytes {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_int_roundtrip_at_extremes() {
        for v in [i32::MIN, -1, 0, 1, i32::MAX] {
            assert_eq!(i32::from_unsigned(v.to_unsigned()), v);
        }
        for v in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(i64::from_unsigned(v.to_unsigned()), v);
        }
    }

    #[test]
    fn test_float_keys_distinguish_signed_zero() {
        assert_ne!(0.0f32.dict_key(), (-0.0f32).dict_key());
        assert_eq!(1.5f64.dict_key(), 1.5f64.dict_key());
    }
}
