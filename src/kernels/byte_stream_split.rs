//! This module contains the BYTE_STREAM_SPLIT codec for FLOAT and DOUBLE.
//!
//! For a type of width W and N values, the page holds W byte-planes of N
//! bytes each: plane k carries byte k of every value. The transpose groups
//! bytes of similar entropy (sign/exponent vs mantissa), which downstream
//! compression exploits. Encoding and decoding are inverse transposes.

use bytes::Bytes;

use crate::error::{Result, StrataError};

/// Decoder for BYTE_STREAM_SPLIT pages.
pub struct ByteStreamSplitDecoder<V: bytemuck::Pod> {
    data: Bytes,
    total_values: usize,
    current_idx: usize,
    _marker: std::marker::PhantomData<V>,
}

impl<V: bytemuck::Pod> ByteStreamSplitDecoder<V> {
    pub fn new(page: Bytes) -> Result<Self> {
        let width = std::mem::size_of::<V>();
        if page.len() % width != 0 {
            return Err(StrataError::corrupted(format!(
                "Page size in BYTE_STREAM_SPLIT ({}B) is not divisible by the type width ({}B)",
                page.len(),
                width
            )));
        }
        Ok(ByteStreamSplitDecoder {
            total_values: page.len() / width,
            data: page,
            current_idx: 0,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        let width = std::mem::size_of::<V>();
        let n = out.len().min(self.total_values - self.current_idx);
        let out_bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut out[..n]);
        for i in 0..n {
            for k in 0..width {
                out_bytes[i * width + k] = self.data[self.current_idx + k * self.total_values];
            }
            self.current_idx += 1;
        }
        Ok(n)
    }
}

/// Encoder for BYTE_STREAM_SPLIT pages: the transpose of the decoder.
pub struct ByteStreamSplitEncoder<V: bytemuck::Pod> {
    values: Vec<V>,
}

impl<V: bytemuck::Pod> ByteStreamSplitEncoder<V> {
    pub fn new() -> Self {
        ByteStreamSplitEncoder { values: Vec::new() }
    }

    pub fn put_batch(&mut self, values: &[V]) {
        self.values.extend_from_slice(values);
    }

    pub fn max_encoded_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<V>()
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> usize {
        let width = std::mem::size_of::<V>();
        let value_bytes: &[u8] = bytemuck::cast_slice(&self.values);
        let n = self.values.len();
        sink.reserve(n * width);
        for k in 0..width {
            for i in 0..n {
                sink.push(value_bytes[i * width + k]);
            }
        }
        self.values.clear();
        n * width
    }
}

impl<V: bytemuck::Pod> Default for ByteStreamSplitEncoder<V> {
    fn default() -> Self {
        Self::new()
    }
}
