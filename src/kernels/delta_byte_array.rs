//! This module contains the two delta codecs for BYTE_ARRAY values.
//!
//! DELTA_LENGTH_BYTE_ARRAY is a DELTA_BINARY_PACKED (INT32) stream of value
//! lengths followed by the concatenated value bytes. DELTA_BYTE_ARRAY adds
//! front coding on top: a DELTA_BINARY_PACKED stream of shared-prefix
//! lengths, then a DELTA_LENGTH_BYTE_ARRAY stream of suffixes; each value is
//! the previous value's prefix plus its suffix.

use bytes::{Buf, Bytes};

use crate::error::{Result, StrataError};
use crate::kernels::delta::{DeltaBinaryPackedDecoder, DeltaBinaryPackedEncoder};

/// Lengths are drained from the sub-decoder in batches of this size.
const LENGTH_BATCH: usize = 1000;

/// Drains an entire DELTA_BINARY_PACKED (INT32) stream from the front of
/// `data`, returning the decoded integers and the byte length of the stream.
fn read_delta_prefix(data: &Bytes) -> Result<(Vec<i32>, usize)> {
    let mut decoder = DeltaBinaryPackedDecoder::<i32>::new(data.clone())?;
    let mut values = Vec::new();
    loop {
        let read_so_far = values.len();
        values.resize(read_so_far + LENGTH_BATCH, 0);
        let n_read = decoder.read_batch(&mut values[read_so_far..])?;
        values.truncate(read_so_far + n_read);
        if n_read == 0 {
            break;
        }
    }
    Ok((values, data.len() - decoder.bytes_left()))
}

/// Decoder for DELTA_LENGTH_BYTE_ARRAY pages. Values are shared subranges
/// of the page.
pub struct DeltaLengthByteArrayDecoder {
    values: Bytes,
    lengths: Vec<i32>,
    current_idx: usize,
}

impl DeltaLengthByteArrayDecoder {
    pub fn new(page: Bytes) -> Result<Self> {
        let (lengths, consumed) = read_delta_prefix(&page)?;
        Ok(DeltaLengthByteArrayDecoder {
            values: page.slice(consumed..),
            lengths,
            current_idx: 0,
        })
    }

    pub fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        let n = out.len().min(self.lengths.len() - self.current_idx);
        for slot in out[..n].iter_mut() {
            let len = self.lengths[self.current_idx];
            if len < 0 {
                return Err(StrataError::corrupted(format!(
                    "Negative value length ({}) in DELTA_LENGTH_BYTE_ARRAY",
                    len
                )));
            }
            let len = len as usize;
            if len > self.values.len() {
                return Err(StrataError::corrupted(
                    "Unexpected end of values in DELTA_LENGTH_BYTE_ARRAY",
                ));
            }
            *slot = self.values.slice(..len);
            self.values.advance(len);
            self.current_idx += 1;
        }
        Ok(n)
    }
}

/// Decoder for DELTA_BYTE_ARRAY pages. The previously emitted value is kept
/// as an owned buffer so each value can borrow its prefix from it.
pub struct DeltaByteArrayDecoder {
    prefix_lengths: Vec<i32>,
    suffixes: DeltaLengthByteArrayDecoder,
    last_value: Vec<u8>,
    current_idx: usize,
}

impl DeltaByteArrayDecoder {
    pub fn new(page: Bytes) -> Result<Self> {
        let (prefix_lengths, consumed) = read_delta_prefix(&page)?;
        let suffixes = DeltaLengthByteArrayDecoder::new(page.slice(consumed..))?;
        Ok(DeltaByteArrayDecoder {
            prefix_lengths,
            suffixes,
            last_value: Vec::new(),
            current_idx: 0,
        })
    }

    pub fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        let n = out.len().min(self.prefix_lengths.len() - self.current_idx);
        let mut suffix_buf = vec![Bytes::new(); n];
        let n = self.suffixes.read_batch(&mut suffix_buf)?;
        for (slot, suffix) in out[..n].iter_mut().zip(&suffix_buf[..n]) {
            let prefix_len = self.prefix_lengths[self.current_idx];
            if prefix_len < 0 || prefix_len as usize > self.last_value.len() {
                return Err(StrataError::corrupted(format!(
                    "Invalid prefix length in DELTA_BYTE_ARRAY ({} of {}B)",
                    prefix_len,
                    self.last_value.len()
                )));
            }
            let prefix_len = prefix_len as usize;
            self.last_value.truncate(prefix_len);
            self.last_value.extend_from_slice(suffix);
            *slot = Bytes::copy_from_slice(&self.last_value);
            self.current_idx += 1;
        }
        Ok(n)
    }
}

/// Encoder for DELTA_LENGTH_BYTE_ARRAY pages.
pub struct DeltaLengthByteArrayEncoder {
    lengths: DeltaBinaryPackedEncoder<i32>,
    data: Vec<u8>,
}

impl DeltaLengthByteArrayEncoder {
    pub fn new() -> Self {
        DeltaLengthByteArrayEncoder { lengths: DeltaBinaryPackedEncoder::new(), data: Vec::new() }
    }

    pub fn put_batch(&mut self, values: &[Bytes]) {
        for value in values {
            self.lengths.put_batch(&[value.len() as i32]);
            self.data.extend_from_slice(value);
        }
    }

    pub fn max_encoded_size(&self) -> usize {
        self.lengths.max_encoded_size() + self.data.len()
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let mut written = self.lengths.flush(sink);
        written += self.data.len();
        sink.extend_from_slice(&self.data);
        self.data.clear();
        written
    }
}

impl Default for DeltaLengthByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encoder for DELTA_BYTE_ARRAY pages: front codes each value against the
/// previous one.
pub struct DeltaByteArrayEncoder {
    prefix_lengths: DeltaBinaryPackedEncoder<i32>,
    suffixes: DeltaLengthByteArrayEncoder,
    last_value: Vec<u8>,
}

impl DeltaByteArrayEncoder {
    pub fn new() -> Self {
        DeltaByteArrayEncoder {
            prefix_lengths: DeltaBinaryPackedEncoder::new(),
            suffixes: DeltaLengthByteArrayEncoder::new(),
            last_value: Vec::new(),
        }
    }

    pub fn put_batch(&mut self, values: &[Bytes]) {
        for value in values {
            let prefix_len = self
                .last_value
                .iter()
                .zip(value.iter())
                .take_while(|(a, b)| a == b)
                .count();
            self.prefix_lengths.put_batch(&[prefix_len as i32]);
            self.suffixes.put_batch(&[value.slice(prefix_len..)]);
            self.last_value.clear();
            self.last_value.extend_from_slice(value);
        }
    }

    pub fn max_encoded_size(&self) -> usize {
        self.prefix_lengths.max_encoded_size() + self.suffixes.max_encoded_size()
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let mut written = self.prefix_lengths.flush(sink);
        written += self.suffixes.flush(sink);
        self.last_value.clear();
        written
    }
}

impl Default for DeltaByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}
