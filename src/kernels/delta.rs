//! This module contains the DELTA_BINARY_PACKED codec for INT32 and INT64.
//!
//! Stream layout:
//!
//! ```text
//! header = block_values_vlq | miniblocks_per_block_vlq |
//!          total_values_vlq | first_value_zigzag_vlq
//! block  = min_delta_zigzag_vlq |
//!          miniblocks_per_block x 1-byte bit widths |
//!          per-miniblock packed deltas of the declared widths
//! ```
//!
//! Deltas are computed by unsigned subtraction and reversed by unsigned
//! addition, so the round-trip is exact for the full signed range under
//! two's-complement wraparound. The decoder accepts any block geometry
//! declared in the header; the encoder emits 256-value blocks of 8
//! miniblocks.

use bytes::Bytes;
use num_traits::{WrappingSub, Zero};

use crate::error::{Result, StrataError};
use crate::kernels::bitstream::{BitReader, BitWriter};
use crate::traits::DeltaInt;
use crate::utils::bit_width;

/// Decoder for DELTA_BINARY_PACKED pages. Arithmetic is carried in 64 bits
/// and truncated to the physical width on output, which is equivalent to
/// arithmetic modulo the physical width.
pub struct DeltaBinaryPackedDecoder<V: DeltaInt> {
    reader: BitReader,
    num_mini_blocks: u64,
    values_remaining: u64,
    last_value: u64,
    min_delta: u64,
    delta_bit_widths: Vec<u8>,
    delta_bit_width: u32,
    mini_block_idx: u64,
    values_current_mini_block: u64,
    values_per_mini_block: u64,
    _marker: std::marker::PhantomData<V>,
}

impl<V: DeltaInt> DeltaBinaryPackedDecoder<V> {
    pub fn new(page: Bytes) -> Result<Self> {
        let mut reader = BitReader::new(page);
        let header_error = || StrataError::corrupted("Unexpected end of DELTA_BINARY_PACKED header");

        let values_per_block = reader.get_vlq().ok_or_else(header_error)?;
        let num_mini_blocks = reader.get_vlq().ok_or_else(header_error)?;
        if num_mini_blocks == 0 {
            return Err(StrataError::corrupted(
                "In DELTA_BINARY_PACKED number of miniblocks per block is 0",
            ));
        }
        let values_per_mini_block = values_per_block / num_mini_blocks;
        let values_remaining = reader.get_vlq().ok_or_else(header_error)?;
        let first_value = reader.get_zigzag_vlq().ok_or_else(header_error)?;

        // A block is only ever parsed when a second value exists; in that
        // case every block header carries one width byte per miniblock, so a
        // count the page cannot hold is corrupt before any allocation.
        if values_remaining > 1 {
            if values_per_mini_block == 0 {
                return Err(StrataError::corrupted(
                    "In DELTA_BINARY_PACKED block is smaller than one value per miniblock",
                ));
            }
            if num_mini_blocks > reader.bytes_left() as u64 {
                return Err(StrataError::corrupted(format!(
                    "DELTA_BINARY_PACKED miniblock count exceeds page ({} miniblocks, {}B left)",
                    num_mini_blocks,
                    reader.bytes_left()
                )));
            }
        }
        let delta_bit_widths =
            if values_remaining > 1 { vec![0; num_mini_blocks as usize] } else { Vec::new() };

        Ok(DeltaBinaryPackedDecoder {
            reader,
            num_mini_blocks,
            values_remaining,
            last_value: first_value as u64,
            min_delta: 0,
            delta_bit_widths,
            delta_bit_width: 0,
            // Forces a block header parse before the first delta is read.
            mini_block_idx: num_mini_blocks,
            values_current_mini_block: 0,
            values_per_mini_block,
            _marker: std::marker::PhantomData,
        })
    }

    /// Whole unread bytes past the end of the consumed stream; used by the
    /// byte-array delta codecs to locate their value region.
    pub fn bytes_left(&self) -> usize {
        self.reader.bytes_left()
    }

    pub fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        if self.values_remaining == 0 {
            return Ok(0);
        }
        let mut i = 0;
        while i < out.len() {
            out[i] = V::from_u64_lossy(self.last_value);
            i += 1;
            self.values_remaining -= 1;
            if self.values_remaining == 0 {
                self.eat_final_padding()?;
                break;
            }
            if self.values_current_mini_block == 0 {
                if self.mini_block_idx == self.num_mini_blocks {
                    self.init_block()?;
                }
                self.delta_bit_width = self.delta_bit_widths[self.mini_block_idx as usize] as u32;
                self.values_current_mini_block = self.values_per_mini_block;
                self.mini_block_idx += 1;
            }
            let delta = self
                .reader
                .get_value(self.delta_bit_width)
                .ok_or_else(|| StrataError::corrupted("Unexpected end of data in DELTA_BINARY_PACKED"))?;
            self.last_value = self
                .last_value
                .wrapping_add(delta)
                .wrapping_add(self.min_delta);
            self.values_current_mini_block -= 1;
        }
        Ok(i)
    }

    fn init_block(&mut self) -> Result<()> {
        let block_error = || StrataError::corrupted("Unexpected end of DELTA_BINARY_PACKED block header");
        self.min_delta = self.reader.get_zigzag_vlq().ok_or_else(block_error)? as u64;
        for i in 0..self.num_mini_blocks as usize {
            let width = self.reader.get_aligned(1).ok_or_else(block_error)? as u8;
            if width > 64 {
                return Err(StrataError::corrupted(format!(
                    "DELTA_BINARY_PACKED miniblock bit width {} exceeds 64",
                    width
                )));
            }
            self.delta_bit_widths[i] = width;
        }
        self.mini_block_idx = 0;
        Ok(())
    }

    /// The stream declares full miniblocks; once the value count is
    /// exhausted the still-declared padding deltas are consumed and
    /// discarded so the cursor lands on the next stream.
    fn eat_final_padding(&mut self) -> Result<()> {
        while self.values_current_mini_block > 0 {
            self.reader
                .get_value(self.delta_bit_width)
                .ok_or_else(|| StrataError::corrupted("Unexpected end of data in DELTA_BINARY_PACKED"))?;
            self.values_current_mini_block -= 1;
        }
        Ok(())
    }
}

const BLOCK_VALUES: usize = 256;
const MINIBLOCKS_PER_BLOCK: usize = 8;
const VALUES_PER_MINIBLOCK: usize = BLOCK_VALUES / MINIBLOCKS_PER_BLOCK;

/// Encoder for DELTA_BINARY_PACKED pages, emitting 256-value blocks of 8
/// miniblocks. `flush` drains all state, so one encoder serves consecutive
/// pages.
#[derive(Debug)]
pub struct DeltaBinaryPackedEncoder<V: DeltaInt> {
    total_values: u64,
    first_value: V,
    last_value: V,
    unencoded_values: Vec<V>,
    encoded_blocks: Vec<u8>,
}

impl<V: DeltaInt> DeltaBinaryPackedEncoder<V> {
    pub fn new() -> Self {
        DeltaBinaryPackedEncoder {
            total_values: 0,
            first_value: V::zero(),
            last_value: V::zero(),
            unencoded_values: Vec::new(),
            encoded_blocks: Vec::new(),
        }
    }

    pub fn put_batch(&mut self, data: &[V]) {
        if data.is_empty() {
            return;
        }
        let mut i = 0;
        if self.total_values == 0 {
            // The first value travels in the page header, not in a block.
            self.first_value = data[0];
            self.last_value = data[0];
            i = 1;
        }
        for &value in &data[i..] {
            self.unencoded_values.push(value);
            if self.unencoded_values.len() == BLOCK_VALUES {
                self.flush_block();
            }
        }
        self.total_values += data.len() as u64;
    }

    pub fn max_encoded_size(&self) -> usize {
        let max_header_size = V::MAX_VLQ_BYTES * 4;
        max_header_size + self.encoded_blocks.len() + self.max_current_block_size()
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        self.flush_block();
        let mut header = BitWriter::new();
        header.put_vlq(BLOCK_VALUES as u64);
        header.put_vlq(MINIBLOCKS_PER_BLOCK as u64);
        header.put_vlq(self.total_values);
        header.put_zigzag_vlq(self.first_value.to_i64());
        let header_bytes = header.into_bytes();

        let written = header_bytes.len() + self.encoded_blocks.len();
        sink.extend_from_slice(&header_bytes);
        sink.extend_from_slice(&self.encoded_blocks);

        self.total_values = 0;
        self.first_value = V::zero();
        self.last_value = V::zero();
        self.encoded_blocks.clear();
        written
    }

    fn max_current_block_size(&self) -> usize {
        let active_miniblocks =
            (self.unencoded_values.len() + VALUES_PER_MINIBLOCK - 1) / VALUES_PER_MINIBLOCK;
        V::MAX_VLQ_BYTES
            + MINIBLOCKS_PER_BLOCK
            + std::mem::size_of::<V>() * VALUES_PER_MINIBLOCK * active_miniblocks
    }

    fn flush_block(&mut self) {
        if self.unencoded_values.is_empty() {
            return;
        }
        let n = self.unencoded_values.len();

        let mut deltas = [V::Unsigned::zero(); BLOCK_VALUES];
        for (i, &value) in self.unencoded_values.iter().enumerate() {
            deltas[i] = value.to_unsigned().wrapping_sub(&self.last_value.to_unsigned());
            self.last_value = value;
        }

        let mut min_delta = V::from_unsigned(deltas[0]);
        for &delta in &deltas[1..n] {
            let signed = V::from_unsigned(delta);
            if signed < min_delta {
                min_delta = signed;
            }
        }
        for delta in deltas[..n].iter_mut() {
            *delta = delta.wrapping_sub(&min_delta.to_unsigned());
        }

        let mut bit_widths = [0u8; MINIBLOCKS_PER_BLOCK];
        for (i, &delta) in deltas[..n].iter().enumerate() {
            let miniblock = i / VALUES_PER_MINIBLOCK;
            let width = bit_width(V::unsigned_to_u64(delta)) as u8;
            bit_widths[miniblock] = bit_widths[miniblock].max(width);
        }

        let mut writer = BitWriter::new();
        writer.put_zigzag_vlq(min_delta.to_i64());
        for &width in &bit_widths {
            writer.put_aligned(width as u64, 1);
        }
        // Trailing unused miniblocks keep width 0 and contribute no packed
        // data; a partially filled miniblock is padded with zero deltas.
        for mb in 0..MINIBLOCKS_PER_BLOCK {
            let start = mb * VALUES_PER_MINIBLOCK;
            if start >= n {
                break;
            }
            for &delta in &deltas[start..start + VALUES_PER_MINIBLOCK] {
                writer.put_value(V::unsigned_to_u64(delta), bit_widths[mb] as u32);
            }
        }

        self.encoded_blocks.extend_from_slice(&writer.into_bytes());
        self.unencoded_values.clear();
    }
}

impl<V: DeltaInt> Default for DeltaBinaryPackedEncoder<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<V: DeltaInt + std::fmt::Debug>(input: &[V]) {
        let mut encoder = DeltaBinaryPackedEncoder::<V>::new();
        let split = input.len() / 3;
        encoder.put_batch(&input[..split]);
        encoder.put_batch(&input[split..]);

        let mut encoded = Vec::new();
        let written = encoder.flush(&mut encoded);
        assert_eq!(written, encoded.len());

        let mut decoder = DeltaBinaryPackedDecoder::<V>::new(Bytes::from(encoded)).unwrap();
        let mut decoded = vec![V::zero(); input.len() + 16];
        let n_read = decoder.read_batch(&mut decoded).unwrap();
        assert_eq!(n_read, input.len());
        assert_eq!(&decoded[..n_read], input);
    }

    #[test]
    fn test_header_layout() {
        let mut encoder = DeltaBinaryPackedEncoder::<i32>::new();
        encoder.put_batch(&[7, 5, 5, 5, 3]);
        let mut encoded = Vec::new();
        encoder.flush(&mut encoded);
        // block 256, 8 miniblocks, 5 values, zigzag(7); then the single
        // block: zigzag(-2) and eight width bytes.
        assert_eq!(&encoded[..5], &[0x80, 0x02, 0x08, 0x05, 0x0E]);
        assert_eq!(encoded[5], 0x03);
        // Deltas [-2,0,0,-2] shift to [0,2,2,0]: miniblock 0 packs 2 bits,
        // trailing miniblocks are empty with width 0.
        assert_eq!(&encoded[6..14], &[2, 0, 0, 0, 0, 0, 0, 0]);
        // One 32-value miniblock at 2 bits: [0,2,2,0] then zero padding.
        assert_eq!(encoded[14], 0b0010_1000);
        assert_eq!(encoded.len(), 22);

        let mut decoder = DeltaBinaryPackedDecoder::<i32>::new(Bytes::from(encoded)).unwrap();
        let mut out = [0i32; 5];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 5);
        assert_eq!(out, [7, 5, 5, 5, 3]);
    }

    #[test]
    fn test_decoding_foreign_block_geometry() {
        // A 128/4 stream as produced by other writers: 66 values starting at
        // 8, stepping by deltas declared across four miniblocks.
        let mut w = BitWriter::new();
        w.put_vlq(128);
        w.put_vlq(4);
        w.put_vlq(66);
        w.put_zigzag_vlq(8);
        w.put_zigzag_vlq(-1);
        for width in [4u64, 3, 2, 1] {
            w.put_aligned(width, 1);
        }
        for i in 0..32u64 {
            // Miniblock 0 (width 4): eight shifted deltas of 1, sixteen of
            // 0, one of 9 to jump back to 0, then 1s to hold there.
            let delta = match i {
                0..=7 => 1,
                8..=23 => 0,
                24 => 9,
                _ => 1,
            };
            w.put_value(delta, 4);
        }
        for _ in 0..32 {
            w.put_value(1, 3);
        }
        for _ in 0..32 {
            w.put_value(1, 2);
        }
        for _ in 0..32 {
            w.put_value(1, 1);
        }
        let mut decoder = DeltaBinaryPackedDecoder::<i32>::new(Bytes::from(w.into_bytes())).unwrap();
        let mut out = vec![0i32; 100];
        let n = decoder.read_batch(&mut out).unwrap();
        assert_eq!(n, 66);
        assert_eq!(out[0], 8);
        assert_eq!(&out[1..9], &[8, 8, 8, 8, 8, 8, 8, 8]);
        assert_eq!(&out[9..25], &[7, 6, 5, 4, 3, 2, 1, 0, -1, -2, -3, -4, -5, -6, -7, -8]);
        assert!(out[25..66].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_roundtrip_i32_with_extremes() {
        let mut input: Vec<i32> = (0..1337).collect();
        input.extend([i32::MIN, i32::MAX, i32::MIN, i32::MAX]);
        input.extend((0..420).map(|i| i * i));
        roundtrip(&input);
    }

    #[test]
    fn test_roundtrip_i64_with_extremes() {
        let mut input: Vec<i64> = (0..1337).collect();
        input.extend([i64::MIN, i64::MAX, i64::MIN, i64::MAX]);
        input.extend((-420..420).map(|i: i64| i * i));
        roundtrip(&input);
    }

    #[test]
    fn test_roundtrip_tiny_inputs() {
        roundtrip::<i32>(&[]);
        roundtrip::<i32>(&[42]);
        roundtrip::<i64>(&[i64::MIN]);
        roundtrip::<i32>(&[-1, 1]);
    }

    #[test]
    fn test_encoder_is_reusable_after_flush() {
        let mut encoder = DeltaBinaryPackedEncoder::<i32>::new();
        encoder.put_batch(&[1, 2, 3]);
        let mut first = Vec::new();
        encoder.flush(&mut first);

        encoder.put_batch(&[1, 2, 3]);
        let mut second = Vec::new();
        encoder.flush(&mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_miniblocks_is_corruption() {
        let mut w = BitWriter::new();
        w.put_vlq(128);
        w.put_vlq(0);
        w.put_vlq(10);
        w.put_zigzag_vlq(0);
        assert!(matches!(
            DeltaBinaryPackedDecoder::<i32>::new(Bytes::from(w.into_bytes())),
            Err(StrataError::CorruptedPage(_))
        ));
    }

    #[test]
    fn test_truncated_header_is_corruption() {
        assert!(matches!(
            DeltaBinaryPackedDecoder::<i32>::new(Bytes::from_static(&[0x80])),
            Err(StrataError::CorruptedPage(_))
        ));
    }

    #[test]
    fn test_truncated_block_data_is_corruption() {
        let mut encoder = DeltaBinaryPackedEncoder::<i64>::new();
        let input: Vec<i64> = (0..300).map(|i| i * 31).collect();
        encoder.put_batch(&input);
        let mut encoded = Vec::new();
        encoder.flush(&mut encoded);
        encoded.truncate(encoded.len() - 10);

        let mut decoder = DeltaBinaryPackedDecoder::<i64>::new(Bytes::from(encoded)).unwrap();
        let mut out = vec![0i64; 300];
        assert!(matches!(
            decoder.read_batch(&mut out),
            Err(StrataError::CorruptedPage(_))
        ));
    }
}
