//! This module contains the dictionary codec.
//!
//! A dictionary-encoded data page is a one-byte index bit width followed by
//! an RLE/bit-packed hybrid stream of indices into a dictionary page that
//! was decoded earlier by the caller. The dictionary page itself is a PLAIN
//! encoding of the distinct values in insertion order; the builder reuses
//! the matching PLAIN encoder so the page is emitted by a single byte copy.
//!
//! The adaptive `DictOrPlainEncoder` starts out building a dictionary and
//! permanently switches to PLAIN once the accumulated dictionary page
//! crosses the fallback threshold at a `flush` boundary.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, StrataError};
use crate::kernels::plain::PlainPageEncoder;
use crate::kernels::rle::{self, RleDecoder, RleEncoder};
use crate::types::{Encoding, FlushResult};
use crate::traits::DictKey;
use crate::utils::bit_width;

/// Indices are decoded through this scratch buffer before the dictionary
/// lookup, so one pass serves any requested batch size.
const INDEX_BATCH: usize = 256;

/// Decoder for dictionary-encoded data pages. The dictionary is shared with
/// the caller, who decoded it from the chunk's dictionary page.
pub struct DictDecoder<V: Clone> {
    dict: Arc<[V]>,
    indices: RleDecoder,
}

impl<V: Clone> DictDecoder<V> {
    pub fn new(page: Bytes, dict: Arc<[V]>) -> Result<Self> {
        // An empty page holds zero values; there is no bit width byte to
        // read and nothing is consumed.
        if page.is_empty() {
            return Ok(DictDecoder { dict, indices: RleDecoder::new(page, 0) });
        }
        let index_bit_width = page[0];
        if index_bit_width > 32 {
            return Err(StrataError::corrupted(format!(
                "Illegal dictionary index bit width (should be 0 <= bit width <= 32, got {})",
                index_bit_width
            )));
        }
        Ok(DictDecoder {
            dict,
            indices: RleDecoder::new(page.slice(1..), index_bit_width as u32),
        })
    }

    pub fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        let mut index_buf = [0u32; INDEX_BATCH];
        let mut completed = 0;
        while completed < out.len() {
            let n_to_read = (out.len() - completed).min(INDEX_BATCH);
            let n_read = self.indices.get_batch(&mut index_buf[..n_to_read])?;
            for &index in &index_buf[..n_read] {
                if index as usize >= self.dict.len() {
                    return Err(StrataError::corrupted(format!(
                        "Dict index exceeds dict size (dict size = {}, index = {})",
                        self.dict.len(),
                        index
                    )));
                }
                out[completed] = self.dict[index as usize].clone();
                completed += 1;
            }
            if n_read < n_to_read {
                break;
            }
        }
        Ok(completed)
    }
}

/// Maps each distinct value to a dense index in insertion order while the
/// matching PLAIN encoder accumulates the dictionary page.
#[derive(Debug)]
pub struct DictBuilder<V: DictKey, P: PlainPageEncoder<Value = V>> {
    accumulator: HashMap<V::Key, u32>,
    dict_page: P,
}

impl<V: DictKey, P: PlainPageEncoder<Value = V>> DictBuilder<V, P> {
    pub fn new(dict_page: P) -> Self {
        DictBuilder { accumulator: HashMap::new(), dict_page }
    }

    pub fn put(&mut self, value: &V) -> u32 {
        let next_index = self.accumulator.len() as u32;
        match self.accumulator.entry(value.dict_key()) {
            std::collections::hash_map::Entry::Occupied(e) => *e.get(),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(next_index);
                self.dict_page.put(value);
                next_index
            }
        }
    }

    pub fn cardinality(&self) -> usize {
        self.accumulator.len()
    }

    pub fn view(&self) -> &[u8] {
        self.dict_page.view()
    }
}

/// Encoder producing an index stream against the dictionary built by
/// `DictBuilder`.
#[derive(Debug)]
pub struct DictEncoder<V: DictKey, P: PlainPageEncoder<Value = V>> {
    indices: Vec<u32>,
    values: DictBuilder<V, P>,
}

impl<V: DictKey, P: PlainPageEncoder<Value = V>> DictEncoder<V, P> {
    pub fn new(dict_page: P) -> Self {
        DictEncoder { indices: Vec::new(), values: DictBuilder::new(dict_page) }
    }

    fn index_bit_width(&self) -> u32 {
        bit_width(self.values.cardinality() as u64)
    }

    pub fn put_batch(&mut self, data: &[V]) {
        self.indices.reserve(data.len());
        for value in data {
            let index = self.values.put(value);
            self.indices.push(index);
        }
    }

    pub fn max_encoded_size(&self) -> usize {
        1 + rle::min_buffer_size(self.index_bit_width())
            + rle::max_buffer_size(self.index_bit_width(), self.indices.len())
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        let index_bit_width = self.index_bit_width();
        sink.push(index_bit_width as u8);
        let mut encoder = RleEncoder::new(index_bit_width);
        for &index in &self.indices {
            encoder.put(index as u64);
        }
        let written = encoder.flush(sink);
        self.indices.clear();
        FlushResult { bytes_written: 1 + written, encoding: Encoding::RleDictionary }
    }

    pub fn view_dict(&self) -> &[u8] {
        self.values.view()
    }

    pub fn cardinality(&self) -> u64 {
        self.values.cardinality() as u64
    }
}

/// Dictionary page size above which the adaptive encoder stops building the
/// dictionary and encodes subsequent pages PLAIN.
pub const DICT_FALLBACK_THRESHOLD: usize = 16 * 1024;

/// Dictionary encoder that falls back to PLAIN when the dictionary page
/// grows too big. The transition happens at a `flush` boundary, is one-way,
/// and is scoped to one column chunk (one encoder instance).
#[derive(Debug)]
pub struct DictOrPlainEncoder<V: DictKey, P: PlainPageEncoder<Value = V>> {
    dict_encoder: DictEncoder<V, P>,
    plain_encoder: P,
    fallen_back: bool,
    fallback_threshold: usize,
}

impl<V: DictKey, P: PlainPageEncoder<Value = V>> DictOrPlainEncoder<V, P> {
    pub fn new(dict_page: P, plain_encoder: P) -> Self {
        DictOrPlainEncoder {
            dict_encoder: DictEncoder::new(dict_page),
            plain_encoder,
            fallen_back: false,
            fallback_threshold: DICT_FALLBACK_THRESHOLD,
        }
    }

    /// The threshold is a tuning knob, not a format constant; changing it
    /// changes which pages of a chunk come out PLAIN.
    pub fn with_fallback_threshold(mut self, threshold: usize) -> Self {
        self.fallback_threshold = threshold;
        self
    }

    pub fn put_batch(&mut self, data: &[V]) {
        if self.fallen_back {
            self.plain_encoder.put_batch(data);
        } else {
            self.dict_encoder.put_batch(data);
        }
    }

    pub fn max_encoded_size(&self) -> usize {
        if self.fallen_back {
            self.plain_encoder.max_encoded_size()
        } else {
            self.dict_encoder.max_encoded_size()
        }
    }

    pub fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        if self.fallen_back {
            let written = self.plain_encoder.flush(sink);
            FlushResult { bytes_written: written, encoding: Encoding::Plain }
        } else {
            if self.dict_encoder.view_dict().len() > self.fallback_threshold {
                log::debug!(
                    "dictionary page reached {}B (threshold {}B), falling back to PLAIN",
                    self.dict_encoder.view_dict().len(),
                    self.fallback_threshold
                );
                self.fallen_back = true;
            }
            self.dict_encoder.flush(sink)
        }
    }

    /// The dictionary page accumulated so far; still meaningful after the
    /// fallback, since the already-emitted index pages reference it.
    pub fn view_dict(&self) -> &[u8] {
        self.dict_encoder.view_dict()
    }

    pub fn cardinality(&self) -> u64 {
        self.dict_encoder.cardinality()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::plain::{PlainByteArrayEncoder, PlainNativeEncoder};

    #[test]
    fn test_insertion_order_dictionary() {
        let values: Vec<Bytes> = ["a", "b", "a", "c", "b"]
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect();
        let mut encoder = DictEncoder::new(PlainByteArrayEncoder::new());
        encoder.put_batch(&values);

        assert_eq!(encoder.cardinality(), 3);
        let expected_dict: &[u8] = &[
            1, 0, 0, 0, b'a', 1, 0, 0, 0, b'b', 1, 0, 0, 0, b'c',
        ];
        assert_eq!(encoder.view_dict(), expected_dict);

        let mut page = Vec::new();
        let result = encoder.flush(&mut page);
        assert_eq!(result.encoding, Encoding::RleDictionary);
        assert_eq!(result.bytes_written, page.len());
        // Cardinality 3 packs indices at 2 bits.
        assert_eq!(page[0], 2);

        let dict: Arc<[Bytes]> = values[..2]
            .iter()
            .cloned()
            .chain(std::iter::once(Bytes::from_static(b"c")))
            .collect();
        let mut decoder = DictDecoder::new(Bytes::from(page), dict).unwrap();
        let mut out = vec![Bytes::new(); 5];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 5);
        assert_eq!(out, values);
    }

    #[test]
    fn test_numeric_roundtrip() {
        let values: Vec<i64> = (0..500).map(|i| (i % 7) * 1000).collect();
        let mut encoder = DictEncoder::new(PlainNativeEncoder::<i64>::new());
        encoder.put_batch(&values);
        assert_eq!(encoder.cardinality(), 7);

        let max_size = encoder.max_encoded_size();
        let mut page = Vec::new();
        encoder.flush(&mut page);
        assert!(page.len() <= max_size);

        let dict: Arc<[i64]> = (0..7).map(|i| i * 1000).collect();
        let mut decoder = DictDecoder::new(Bytes::from(page), dict).unwrap();
        let mut out = vec![0i64; 500];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 500);
        assert_eq!(out, values);
    }

    #[test]
    fn test_index_out_of_range_is_corruption() {
        let values = vec![5i32, 5, 5, 5, 5, 5, 5, 5];
        let mut encoder = DictEncoder::new(PlainNativeEncoder::<i32>::new());
        encoder.put_batch(&values);
        let mut page = Vec::new();
        encoder.flush(&mut page);

        // Bind an empty dictionary: every index is out of range.
        let dict: Arc<[i32]> = Arc::from(vec![].into_boxed_slice());
        let mut decoder = DictDecoder::new(Bytes::from(page), dict).unwrap();
        let mut out = vec![0i32; 8];
        assert!(matches!(
            decoder.read_batch(&mut out),
            Err(StrataError::CorruptedPage(_))
        ));
    }

    #[test]
    fn test_illegal_bit_width_is_corruption() {
        let dict: Arc<[i32]> = Arc::from(vec![1].into_boxed_slice());
        let page = Bytes::from_static(&[33, 0, 0]);
        assert!(matches!(
            DictDecoder::new(page, dict),
            Err(StrataError::CorruptedPage(_))
        ));
    }

    #[test]
    fn test_empty_page_yields_zero_values() {
        let dict: Arc<[i32]> = Arc::from(vec![1].into_boxed_slice());
        let mut decoder = DictDecoder::new(Bytes::new(), dict).unwrap();
        let mut out = vec![0i32; 4];
        assert_eq!(decoder.read_batch(&mut out).unwrap(), 0);
    }

    #[test]
    fn test_fallback_after_threshold_crossing_flush() {
        let mut encoder =
            DictOrPlainEncoder::new(PlainNativeEncoder::<i32>::new(), PlainNativeEncoder::new())
                .with_fallback_threshold(64);

        // 32 distinct i32 values fill the dictionary page to 128 bytes.
        let first: Vec<i32> = (0..32).collect();
        encoder.put_batch(&first);
        let mut page = Vec::new();
        let result = encoder.flush(&mut page);
        assert_eq!(result.encoding, Encoding::RleDictionary);
        assert_eq!(encoder.cardinality(), 32);

        // The threshold was crossed at flush time: later pages are PLAIN.
        let second: Vec<i32> = vec![7, 8, 9];
        encoder.put_batch(&second);
        let mut page2 = Vec::new();
        let result2 = encoder.flush(&mut page2);
        assert_eq!(result2.encoding, Encoding::Plain);
        assert_eq!(page2.len(), 12);
        // The dictionary emitted for the first page stays visible.
        assert_eq!(encoder.view_dict().len(), 128);
        assert_eq!(encoder.cardinality(), 32);
    }

    #[test]
    fn test_below_threshold_stays_dictionary() {
        let mut encoder =
            DictOrPlainEncoder::new(PlainNativeEncoder::<i32>::new(), PlainNativeEncoder::new());
        for _ in 0..3 {
            encoder.put_batch(&[1, 2, 3, 2, 1]);
            let mut page = Vec::new();
            let result = encoder.flush(&mut page);
            assert_eq!(result.encoding, Encoding::RleDictionary);
        }
        assert_eq!(encoder.cardinality(), 3);
    }
}
