//! This module contains the PLAIN codecs for all physical types.
//!
//! Fixed-width values are contiguous little-endian; BOOLEAN is one bit per
//! value, LSB-first; BYTE_ARRAY elements are a four-byte little-endian
//! length followed by that many bytes; FIXED_LEN_BYTE_ARRAY elements are
//! exactly `fixed_len` bytes. Decoded variable-length values are shared
//! subranges of the page buffer and may outlive the decoder.

use bytes::{Buf, Bytes};

use crate::error::{Result, StrataError};
use crate::kernels::bitstream::{BitReader, BitWriter};

/// Decoder for contiguous little-endian fixed-width values (INT32, INT64,
/// INT96, FLOAT, DOUBLE).
pub struct PlainNativeDecoder<V: bytemuck::Pod> {
    buffer: Bytes,
    _marker: std::marker::PhantomData<V>,
}

impl<V: bytemuck::Pod> PlainNativeDecoder<V> {
    pub fn new(page: Bytes) -> Self {
        PlainNativeDecoder { buffer: page, _marker: std::marker::PhantomData }
    }

    pub fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        let size = std::mem::size_of::<V>();
        let n = (self.buffer.len() / size).min(out.len());
        for slot in out[..n].iter_mut() {
            *slot = bytemuck::pod_read_unaligned(&self.buffer[..size]);
            self.buffer.advance(size);
        }
        Ok(n)
    }
}

/// Decoder for PLAIN BOOLEAN pages: one bit per value, one output byte per
/// value.
pub struct PlainBooleanDecoder {
    reader: BitReader,
}

impl PlainBooleanDecoder {
    pub fn new(page: Bytes) -> Self {
        PlainBooleanDecoder { reader: BitReader::new(page) }
    }

    pub fn read_batch(&mut self, out: &mut [u8]) -> Result<usize> {
        for (i, slot) in out.iter_mut().enumerate() {
            match self.reader.get_value(1) {
                Some(bit) => *slot = bit as u8,
                None => return Ok(i),
            }
        }
        Ok(out.len())
    }
}

/// Decoder for PLAIN BYTE_ARRAY pages. Each produced value is a shared
/// subrange of the page.
pub struct PlainByteArrayDecoder {
    buffer: Bytes,
}

impl PlainByteArrayDecoder {
    pub fn new(page: Bytes) -> Self {
        PlainByteArrayDecoder { buffer: page }
    }

    pub fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        for (i, slot) in out.iter_mut().enumerate() {
            if self.buffer.is_empty() {
                return Ok(i);
            }
            if self.buffer.len() < 4 {
                return Err(StrataError::corrupted(format!(
                    "End of page while reading BYTE_ARRAY length (needed 4B, got {}B)",
                    self.buffer.len()
                )));
            }
            let len = u32::from_le_bytes([
                self.buffer[0],
                self.buffer[1],
                self.buffer[2],
                self.buffer[3],
            ]) as usize;
            if len > self.buffer.len() - 4 {
                return Err(StrataError::corrupted(format!(
                    "End of page while reading BYTE_ARRAY (needed {}B, got {}B)",
                    len,
                    self.buffer.len() - 4
                )));
            }
            *slot = self.buffer.slice(4..4 + len);
            self.buffer.advance(4 + len);
        }
        Ok(out.len())
    }
}

/// Decoder for PLAIN FIXED_LEN_BYTE_ARRAY pages.
pub struct PlainFixedLenDecoder {
    fixed_len: usize,
    buffer: Bytes,
}

impl PlainFixedLenDecoder {
    pub fn new(page: Bytes, fixed_len: usize) -> Self {
        PlainFixedLenDecoder { fixed_len, buffer: page }
    }

    pub fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        for (i, slot) in out.iter_mut().enumerate() {
            if self.buffer.is_empty() {
                return Ok(i);
            }
            if self.fixed_len > self.buffer.len() {
                return Err(StrataError::corrupted(format!(
                    "End of page while reading FIXED_LEN_BYTE_ARRAY (needed {}B, got {}B)",
                    self.fixed_len,
                    self.buffer.len()
                )));
            }
            *slot = self.buffer.slice(..self.fixed_len);
            self.buffer.advance(self.fixed_len);
        }
        Ok(out.len())
    }
}

/// Common interface of the PLAIN encoders, shared with the dictionary
/// builder, which reuses a plain encoder to accumulate the dictionary page.
pub trait PlainPageEncoder {
    type Value: Clone;

    fn put(&mut self, value: &Self::Value);
    fn put_batch(&mut self, values: &[Self::Value]);
    /// The accumulated page so far.
    fn view(&self) -> &[u8];
    fn max_encoded_size(&self) -> usize;
    /// Appends the accumulated page to `sink`, returning the byte count.
    /// The encoder is empty afterwards.
    fn flush(&mut self, sink: &mut Vec<u8>) -> usize;
}

/// PLAIN encoder for fixed-width values.
#[derive(Debug)]
pub struct PlainNativeEncoder<V: bytemuck::Pod> {
    buf: Vec<V>,
}

impl<V: bytemuck::Pod> PlainNativeEncoder<V> {
    pub fn new() -> Self {
        PlainNativeEncoder { buf: Vec::new() }
    }
}

impl<V: bytemuck::Pod> Default for PlainNativeEncoder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: bytemuck::Pod> PlainPageEncoder for PlainNativeEncoder<V> {
    type Value = V;

    fn put(&mut self, value: &V) {
        self.buf.push(*value);
    }

    fn put_batch(&mut self, values: &[V]) {
        self.buf.extend_from_slice(values);
    }

    fn view(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf)
    }

    fn max_encoded_size(&self) -> usize {
        self.buf.len() * std::mem::size_of::<V>()
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let written = self.view().len();
        sink.extend_from_slice(self.view());
        self.buf.clear();
        written
    }
}

/// PLAIN encoder for BYTE_ARRAY values: four-byte little-endian length
/// prefix per element.
pub struct PlainByteArrayEncoder {
    buf: Vec<u8>,
}

impl PlainByteArrayEncoder {
    pub fn new() -> Self {
        PlainByteArrayEncoder { buf: Vec::new() }
    }
}

impl Default for PlainByteArrayEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainPageEncoder for PlainByteArrayEncoder {
    type Value = Bytes;

    fn put(&mut self, value: &Bytes) {
        self.buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(value);
    }

    fn put_batch(&mut self, values: &[Bytes]) {
        for value in values {
            self.put(value);
        }
    }

    fn view(&self) -> &[u8] {
        &self.buf
    }

    fn max_encoded_size(&self) -> usize {
        self.buf.len()
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let written = self.buf.len();
        sink.extend_from_slice(&self.buf);
        self.buf.clear();
        written
    }
}

/// PLAIN encoder for FIXED_LEN_BYTE_ARRAY values: raw bytes, no prefix.
/// The caller is responsible for handing in values of the declared length.
pub struct PlainFixedLenEncoder {
    buf: Vec<u8>,
}

impl PlainFixedLenEncoder {
    pub fn new() -> Self {
        PlainFixedLenEncoder { buf: Vec::new() }
    }
}

impl Default for PlainFixedLenEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainPageEncoder for PlainFixedLenEncoder {
    type Value = Bytes;

    fn put(&mut self, value: &Bytes) {
        self.buf.extend_from_slice(value);
    }

    fn put_batch(&mut self, values: &[Bytes]) {
        for value in values {
            self.put(value);
        }
    }

    fn view(&self) -> &[u8] {
        &self.buf
    }

    fn max_encoded_size(&self) -> usize {
        self.buf.len()
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let written = self.buf.len();
        sink.extend_from_slice(&self.buf);
        self.buf.clear();
        written
    }
}

/// PLAIN encoder for BOOLEAN values: one bit per value, LSB-first, the
/// final byte zero-padded.
pub struct PlainBooleanEncoder {
    values: Vec<u8>,
}

impl PlainBooleanEncoder {
    pub fn new() -> Self {
        PlainBooleanEncoder { values: Vec::new() }
    }

    pub fn put_batch(&mut self, values: &[u8]) {
        self.values.extend_from_slice(values);
    }

    pub fn max_encoded_size(&self) -> usize {
        (self.values.len() + 7) / 8
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let mut writer = BitWriter::new();
        for &v in &self.values {
            writer.put_value((v != 0) as u64, 1);
        }
        self.values.clear();
        let bytes = writer.into_bytes();
        sink.extend_from_slice(&bytes);
        bytes.len()
    }
}

impl Default for PlainBooleanEncoder {
    fn default() -> Self {
        Self::new()
    }
}
