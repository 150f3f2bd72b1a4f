//! This module contains the RLE/bit-packed hybrid codec used for dictionary
//! indices, boolean value pages and definition/repetition levels.
//!
//! A single logical stream interleaves two kinds of groups, each introduced
//! by a VLQ header `h`:
//!
//! - `h & 1 == 0`: a run of `h >> 1` repetitions of one value, stored once
//!   as ceil(bit_width / 8) little-endian bytes;
//! - `h & 1 == 1`: `(h >> 1) * 8` bit-packed values of `bit_width` bits
//!   each, LSB-first.
//!
//! The encoder accumulates values and emits locally optimal groups on
//! `flush`: a run of at least eight equal values starting on a group
//! boundary becomes an RLE group, everything else is bit-packed in groups
//! of eight (the final group is zero-padded).

use bytes::Bytes;
use num_traits::{FromPrimitive, PrimInt};

use crate::error::{Result, StrataError};
use crate::kernels::bitstream::{BitReader, BitWriter, MAX_VLQ_BYTES};

/// Reserve at least this many bytes for a hybrid stream of any length.
/// Covers the larger of one RLE group and one 8-value bit-packed group.
pub fn min_buffer_size(bit_width: u32) -> usize {
    let packed_group = 1 + bit_width as usize;
    let rle_group = MAX_VLQ_BYTES + (bit_width as usize + 7) / 8;
    packed_group.max(rle_group)
}

/// Upper bound on the encoded size of `num_values` values: every group
/// bit-packed, plus slack for one trailing group of either kind.
pub fn max_buffer_size(bit_width: u32, num_values: usize) -> usize {
    let groups = (num_values + 7) / 8;
    groups * (1 + bit_width as usize) + min_buffer_size(bit_width)
}

/// Decoder for the hybrid stream.
pub struct RleDecoder {
    reader: BitReader,
    bit_width: u32,
    /// Value repeated by the RLE group in progress.
    current_value: u64,
    repeat_count: usize,
    literal_count: usize,
}

impl RleDecoder {
    pub fn new(data: Bytes, bit_width: u32) -> Self {
        RleDecoder {
            reader: BitReader::new(data),
            bit_width,
            current_value: 0,
            repeat_count: 0,
            literal_count: 0,
        }
    }

    /// Reads up to `out.len()` values across successive groups. Returns the
    /// number read; fewer than requested means the stream is exhausted.
    pub fn get_batch<T>(&mut self, out: &mut [T]) -> Result<usize>
    where
        T: PrimInt + FromPrimitive,
    {
        let mut read = 0;
        while read < out.len() {
            if self.repeat_count > 0 {
                let n = self.repeat_count.min(out.len() - read);
                let value = Self::narrow::<T>(self.current_value)?;
                out[read..read + n].fill(value);
                self.repeat_count -= n;
                read += n;
            } else if self.literal_count > 0 {
                let n = self.literal_count.min(out.len() - read);
                for slot in out[read..read + n].iter_mut() {
                    match self.reader.get_value(self.bit_width) {
                        Some(v) => *slot = Self::narrow::<T>(v)?,
                        None => return Ok(read),
                    }
                    self.literal_count -= 1;
                    read += 1;
                }
            } else if !self.next_group() {
                break;
            }
        }
        Ok(read)
    }

    /// Parses the next group header. False when the buffer is exhausted.
    fn next_group(&mut self) -> bool {
        let header = match self.reader.get_vlq() {
            Some(h) => h,
            None => return false,
        };
        if header & 1 == 1 {
            self.literal_count = (header >> 1) as usize * 8;
        } else {
            self.repeat_count = (header >> 1) as usize;
            let value_bytes = (self.bit_width as usize + 7) / 8;
            match self.reader.get_aligned(value_bytes) {
                Some(v) => self.current_value = v,
                None => {
                    self.repeat_count = 0;
                    return false;
                }
            }
        }
        true
    }

    fn narrow<T: PrimInt + FromPrimitive>(value: u64) -> Result<T> {
        T::from_u64(value).ok_or_else(|| {
            StrataError::corrupted(format!("Hybrid-encoded value {} exceeds the output width", value))
        })
    }
}

/// Encoder for the hybrid stream. Values are accumulated with `put` and the
/// byte stream is produced by `flush`, after which the encoder is empty and
/// reusable.
pub struct RleEncoder {
    bit_width: u32,
    values: Vec<u64>,
}

impl RleEncoder {
    pub fn new(bit_width: u32) -> Self {
        RleEncoder { bit_width, values: Vec::new() }
    }

    pub fn put(&mut self, value: u64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Emits the accumulated values and returns the number of bytes written.
    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let mut writer = BitWriter::new();
        let values = &self.values;
        let n = values.len();
        let run_at = |i: usize| {
            let mut r = 1;
            while i + r < n && values[i + r] == values[i] {
                r += 1;
            }
            r
        };

        let mut i = 0;
        while i < n {
            let run = run_at(i);
            if run >= 8 {
                writer.put_vlq((run as u64) << 1);
                writer.put_aligned(values[i], (self.bit_width as usize + 7) / 8);
                i += run;
            } else {
                // Bit-packed span: grows until a run of >= 8 equal values
                // starts on a group boundary, or the input ends.
                let start = i;
                i += 1;
                while i < n {
                    if (i - start) % 8 == 0 && run_at(i) >= 8 {
                        break;
                    }
                    i += 1;
                }
                let groups = (i - start + 7) / 8;
                writer.put_vlq(((groups as u64) << 1) | 1);
                for k in 0..groups * 8 {
                    let v = if start + k < i { values[start + k] } else { 0 };
                    writer.put_value(v, self.bit_width);
                }
            }
        }

        self.values.clear();
        let bytes = writer.into_bytes();
        let written = bytes.len();
        sink.extend_from_slice(&bytes);
        written
    }
}

/// Value decoder for RLE-encoded BOOLEAN pages: the whole page is one
/// hybrid stream of bit width 1, one output byte per value.
pub struct RleBooleanDecoder {
    rle: RleDecoder,
}

impl RleBooleanDecoder {
    pub fn new(page: Bytes) -> Self {
        RleBooleanDecoder { rle: RleDecoder::new(page, 1) }
    }

    pub fn read_batch(&mut self, out: &mut [u8]) -> Result<usize> {
        self.rle.get_batch(out)
    }
}
