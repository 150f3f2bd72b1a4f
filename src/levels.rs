//! This module contains the codec for definition and repetition levels, the
//! integers that drive record shredding for nested schemas.
//!
//! Two level encodings exist: the RLE/bit-packed hybrid, and the legacy
//! BIT_PACKED form that packs levels MSB-first within each byte (the hybrid
//! packs LSB-first; the orderings must not be conflated). On v1 data pages
//! the RLE form is preceded by a four-byte little-endian length; on v2 pages
//! the page header delimits the level region, so there is no prefix. A
//! bit width of zero means every level is zero and no bytes are consumed.

use bytes::Bytes;
use num_traits::{FromPrimitive, PrimInt, ToPrimitive};

use crate::error::{Result, StrataError};
use crate::kernels::bitstream::BitReader;
use crate::kernels::rle::{RleDecoder, RleEncoder};
use crate::types::Encoding;
use crate::utils::bit_width;

enum LevelSource {
    /// Bit width 0: nothing on the wire, every level is 0.
    Zeros,
    Hybrid(RleDecoder),
    BitPacked(BitReader),
    /// No page bound yet.
    Unbound,
}

/// Decoder for one column's definition or repetition levels.
pub struct LevelDecoder {
    level_bit_width: u32,
    num_values: u32,
    values_read: u32,
    source: LevelSource,
}

impl LevelDecoder {
    /// `max_level` is the column's maximum level, from the schema.
    pub fn new(max_level: u16) -> Self {
        LevelDecoder {
            level_bit_width: bit_width(max_level as u64),
            num_values: 0,
            values_read: 0,
            source: LevelSource::Unbound,
        }
    }

    /// Binds the levels of a v1 data page. The page is passed whole because
    /// v1 metadata does not state the level size; returns the number of
    /// bytes consumed so the caller can locate the values region.
    pub fn reset_v1(&mut self, page: Bytes, encoding: Encoding, num_values: u32) -> Result<usize> {
        self.num_values = num_values;
        self.values_read = 0;
        if self.level_bit_width == 0 {
            self.source = LevelSource::Zeros;
            return Ok(0);
        }
        match encoding {
            Encoding::Rle => {
                if page.len() < 4 {
                    return Err(StrataError::corrupted(format!(
                        "End of page while reading levels (needed 4B, got {}B)",
                        page.len()
                    )));
                }
                let len = i32::from_le_bytes([page[0], page[1], page[2], page[3]]);
                if len < 0 {
                    return Err(StrataError::corrupted(format!(
                        "Negative RLE levels length ({})",
                        len
                    )));
                }
                let len = len as usize;
                if len > page.len() - 4 {
                    return Err(StrataError::corrupted(format!(
                        "End of page while reading levels (needed {}B, got {}B)",
                        len,
                        page.len() - 4
                    )));
                }
                self.source =
                    LevelSource::Hybrid(RleDecoder::new(page.slice(4..4 + len), self.level_bit_width));
                Ok(4 + len)
            }
            Encoding::BitPacked => {
                let bit_len = num_values as u64 * self.level_bit_width as u64;
                let byte_len = ((bit_len + 7) >> 3) as usize;
                if byte_len > page.len() {
                    return Err(StrataError::corrupted(format!(
                        "End of page while reading levels (needed {}B, got {}B)",
                        byte_len,
                        page.len()
                    )));
                }
                self.source = LevelSource::BitPacked(BitReader::new(page.slice(..byte_len)));
                Ok(byte_len)
            }
            other => Err(StrataError::corrupted(format!("Unknown level encoding ({})", other))),
        }
    }

    /// Binds the levels of a v2 data page, whose header delimits the level
    /// region: the slice is the hybrid stream with no length prefix.
    pub fn reset_v2(&mut self, encoded_levels: Bytes, num_values: u32) {
        self.num_values = num_values;
        self.values_read = 0;
        self.source = if self.level_bit_width == 0 {
            LevelSource::Zeros
        } else {
            LevelSource::Hybrid(RleDecoder::new(encoded_levels, self.level_bit_width))
        };
    }

    /// Reads a batch of levels; the last batch may be short.
    pub fn read_batch<T>(&mut self, out: &mut [T]) -> Result<usize>
    where
        T: PrimInt + FromPrimitive,
    {
        let n = out.len().min((self.num_values - self.values_read) as usize);
        let n_read = match &mut self.source {
            LevelSource::Zeros => {
                out[..n].fill(T::zero());
                n
            }
            LevelSource::Hybrid(rle) => rle.get_batch(&mut out[..n])?,
            LevelSource::BitPacked(reader) => {
                let mut read = 0;
                for slot in out[..n].iter_mut() {
                    match reader.get_msb_value(self.level_bit_width) {
                        Some(v) => {
                            *slot = T::from_u64(v).ok_or_else(|| {
                                StrataError::corrupted("Level does not fit the output type")
                            })?
                        }
                        None => break,
                    }
                    read += 1;
                }
                read
            }
            LevelSource::Unbound => {
                return Err(StrataError::Internal(
                    "level read_batch called before reset".to_string(),
                ))
            }
        };
        self.values_read += n_read as u32;
        Ok(n_read)
    }
}

/// Encoder for one column's levels, the write-side mirror of
/// `LevelDecoder`. Levels accumulate and are emitted by one of the flush
/// forms; the encoder is empty afterwards.
pub struct LevelEncoder {
    level_bit_width: u32,
    hybrid: RleEncoder,
}

impl LevelEncoder {
    pub fn new(max_level: u16) -> Self {
        let level_bit_width = bit_width(max_level as u64);
        LevelEncoder { level_bit_width, hybrid: RleEncoder::new(level_bit_width) }
    }

    pub fn put_batch<T: PrimInt + ToPrimitive>(&mut self, levels: &[T]) -> Result<()> {
        for level in levels {
            let v = level.to_u64().ok_or_else(|| {
                StrataError::Internal("negative level passed to the level encoder".to_string())
            })?;
            self.hybrid.put(v);
        }
        Ok(())
    }

    /// Emits the v1 form: a u32 little-endian length prefix, then the
    /// hybrid stream. Nothing is written at bit width 0.
    pub fn flush_v1(&mut self, sink: &mut Vec<u8>) -> usize {
        if self.level_bit_width == 0 {
            self.hybrid = RleEncoder::new(0);
            return 0;
        }
        let prefix_at = sink.len();
        sink.extend_from_slice(&[0u8; 4]);
        let written = self.hybrid.flush(sink);
        sink[prefix_at..prefix_at + 4].copy_from_slice(&(written as u32).to_le_bytes());
        4 + written
    }

    /// Emits the v2 form: the bare hybrid stream.
    pub fn flush_v2(&mut self, sink: &mut Vec<u8>) -> usize {
        if self.level_bit_width == 0 {
            self.hybrid = RleEncoder::new(0);
            return 0;
        }
        self.hybrid.flush(sink)
    }
}
