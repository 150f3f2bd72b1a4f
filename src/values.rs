//! This module is the polymorphic facade over the codec kernels: a value
//! decoder and a value encoder factory for each physical type.
//!
//! Each physical type is a marker type implementing `ColumnType`, the
//! type-indexed table linking it to its element representation and to the
//! tagged codec enums holding the concrete kernels. Constructing a codec
//! selects the kernel from the declared encoding, centrally rejecting
//! invalid (type, encoding) pairs; `read_batch`/`put_batch` then dispatch
//! statically over the variant.
//!
//! Decoded BYTE_ARRAY and FIXED_LEN_BYTE_ARRAY values are shared subranges
//! of the page buffer. The dictionary bound to a `ValueDecoder` is shared
//! with its owner and must cover every index the pages reference.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Result, StrataError};
use crate::kernels::byte_stream_split::{ByteStreamSplitDecoder, ByteStreamSplitEncoder};
use crate::kernels::delta::{DeltaBinaryPackedDecoder, DeltaBinaryPackedEncoder};
use crate::kernels::delta_byte_array::{
    DeltaByteArrayDecoder, DeltaByteArrayEncoder, DeltaLengthByteArrayDecoder,
    DeltaLengthByteArrayEncoder,
};
use crate::kernels::dictionary::{DictDecoder, DictOrPlainEncoder};
use crate::kernels::plain::{
    PlainBooleanDecoder, PlainBooleanEncoder, PlainByteArrayDecoder, PlainByteArrayEncoder,
    PlainFixedLenDecoder, PlainFixedLenEncoder, PlainNativeDecoder, PlainNativeEncoder,
    PlainPageEncoder,
};
use crate::kernels::rle::RleBooleanDecoder;
use crate::traits::{DeltaInt, DictKey};
use crate::types::{Encoding, FlushResult, Int96, PhysicalType};

/// Batched read access to one bound page.
pub trait PageDecoder {
    type Value;

    /// Reads up to `out.len()` values; fewer means the page is exhausted.
    fn read_batch(&mut self, out: &mut [Self::Value]) -> Result<usize>;
}

/// Batched accumulation of one page's values.
pub trait PageEncoder {
    type Value;

    fn put_batch(&mut self, values: &[Self::Value]);
    /// Upper bound on the bytes the next `flush` appends.
    fn max_encoded_size(&self) -> usize;
    /// Emits the accumulated page and reports the realized encoding. The
    /// encoder is drained and ready for the next page.
    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult;
    /// The accumulated dictionary page, for dictionary encoders.
    fn view_dict(&self) -> Option<&[u8]>;
    /// Dictionary cardinality; zero for non-dictionary encoders.
    fn cardinality(&self) -> u64;
}

/// The type-indexed table: one implementation per physical type, naming the
/// element representation and the concrete codec enums, and centralizing
/// which encodings the type supports.
pub trait ColumnType {
    type Value: Clone + PartialEq + std::fmt::Debug;
    type Decoder: PageDecoder<Value = Self::Value>;
    type Encoder: PageEncoder<Value = Self::Value>;

    const PHYSICAL_TYPE: PhysicalType;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        type_length: Option<u32>,
        dict: Option<&Arc<[Self::Value]>>,
    ) -> Result<Self::Decoder>;

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder>;
}

pub struct BooleanType;
pub struct Int32Type;
pub struct Int64Type;
pub struct Int96Type;
pub struct FloatType;
pub struct DoubleType;
pub struct ByteArrayType;
pub struct FixedLenByteArrayType;

fn bound_dict<V: Clone>(dict: Option<&Arc<[V]>>) -> Result<Arc<[V]>> {
    dict.cloned().ok_or_else(|| {
        StrataError::corrupted("No dictionary page found before a dictionary-encoded page")
    })
}

/// Read-side rejections, enumerated in one place. An encoding restricted to
/// other types is a corrupt page header; anything else is unimplemented.
fn reject_read(encoding: Encoding, physical: PhysicalType) -> StrataError {
    match encoding {
        Encoding::Rle => StrataError::corrupted("RLE encoding is valid only for BOOLEAN values"),
        Encoding::DeltaBinaryPacked => {
            StrataError::corrupted("DELTA_BINARY_PACKED is valid only for INT32 and INT64")
        }
        Encoding::DeltaLengthByteArray => {
            StrataError::corrupted("DELTA_LENGTH_BYTE_ARRAY is valid only for BYTE_ARRAY")
        }
        Encoding::DeltaByteArray => {
            StrataError::corrupted("DELTA_BYTE_ARRAY is valid only for BYTE_ARRAY")
        }
        Encoding::ByteStreamSplit => {
            StrataError::corrupted("BYTE_STREAM_SPLIT is valid only for FLOAT and DOUBLE")
        }
        other => StrataError::NotImplemented(other, physical),
    }
}

/// Write-side rejections: encodings no writer may request for the type.
fn reject_write(encoding: Encoding, physical: PhysicalType) -> StrataError {
    match encoding {
        Encoding::PlainDictionary => {
            StrataError::corrupted("PLAIN_DICTIONARY is deprecated. Use RLE_DICTIONARY instead")
        }
        other => StrataError::InvalidEncoding(other, physical),
    }
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Decoder variants for INT32 and INT64 pages.
pub enum IntDecoder<V: DeltaInt + bytemuck::Pod> {
    Plain(PlainNativeDecoder<V>),
    Dict(DictDecoder<V>),
    Delta(DeltaBinaryPackedDecoder<V>),
}

impl<V: DeltaInt + bytemuck::Pod> IntDecoder<V> {
    fn select(
        page: Bytes,
        encoding: Encoding,
        dict: Option<&Arc<[V]>>,
        physical: PhysicalType,
    ) -> Result<Self> {
        match encoding {
            Encoding::Plain => Ok(IntDecoder::Plain(PlainNativeDecoder::new(page))),
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(IntDecoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            Encoding::DeltaBinaryPacked => {
                Ok(IntDecoder::Delta(DeltaBinaryPackedDecoder::new(page)?))
            }
            other => Err(reject_read(other, physical)),
        }
    }
}

impl<V: DeltaInt + bytemuck::Pod> PageDecoder for IntDecoder<V> {
    type Value = V;

    fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        match self {
            IntDecoder::Plain(d) => d.read_batch(out),
            IntDecoder::Dict(d) => d.read_batch(out),
            IntDecoder::Delta(d) => d.read_batch(out),
        }
    }
}

/// Decoder variants for FLOAT and DOUBLE pages.
pub enum RealDecoder<V: bytemuck::Pod> {
    Plain(PlainNativeDecoder<V>),
    Dict(DictDecoder<V>),
    Split(ByteStreamSplitDecoder<V>),
}

impl<V: bytemuck::Pod> RealDecoder<V> {
    fn select(
        page: Bytes,
        encoding: Encoding,
        dict: Option<&Arc<[V]>>,
        physical: PhysicalType,
    ) -> Result<Self> {
        match encoding {
            Encoding::Plain => Ok(RealDecoder::Plain(PlainNativeDecoder::new(page))),
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(RealDecoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            Encoding::ByteStreamSplit => {
                Ok(RealDecoder::Split(ByteStreamSplitDecoder::new(page)?))
            }
            other => Err(reject_read(other, physical)),
        }
    }
}

impl<V: bytemuck::Pod> PageDecoder for RealDecoder<V> {
    type Value = V;

    fn read_batch(&mut self, out: &mut [V]) -> Result<usize> {
        match self {
            RealDecoder::Plain(d) => d.read_batch(out),
            RealDecoder::Dict(d) => d.read_batch(out),
            RealDecoder::Split(d) => d.read_batch(out),
        }
    }
}

/// Decoder variants for the decode-only INT96 pages.
pub enum Int96Decoder {
    Plain(PlainNativeDecoder<Int96>),
    Dict(DictDecoder<Int96>),
}

impl PageDecoder for Int96Decoder {
    type Value = Int96;

    fn read_batch(&mut self, out: &mut [Int96]) -> Result<usize> {
        match self {
            Int96Decoder::Plain(d) => d.read_batch(out),
            Int96Decoder::Dict(d) => d.read_batch(out),
        }
    }
}

/// Decoder variants for BOOLEAN pages; values are one byte each.
pub enum BooleanDecoder {
    Plain(PlainBooleanDecoder),
    Rle(RleBooleanDecoder),
    Dict(DictDecoder<u8>),
}

impl PageDecoder for BooleanDecoder {
    type Value = u8;

    fn read_batch(&mut self, out: &mut [u8]) -> Result<usize> {
        match self {
            BooleanDecoder::Plain(d) => d.read_batch(out),
            BooleanDecoder::Rle(d) => d.read_batch(out),
            BooleanDecoder::Dict(d) => d.read_batch(out),
        }
    }
}

/// Decoder variants for BYTE_ARRAY pages.
pub enum ByteArrayDecoder {
    Plain(PlainByteArrayDecoder),
    Dict(DictDecoder<Bytes>),
    DeltaLength(DeltaLengthByteArrayDecoder),
    DeltaFull(DeltaByteArrayDecoder),
}

impl PageDecoder for ByteArrayDecoder {
    type Value = Bytes;

    fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        match self {
            ByteArrayDecoder::Plain(d) => d.read_batch(out),
            ByteArrayDecoder::Dict(d) => d.read_batch(out),
            ByteArrayDecoder::DeltaLength(d) => d.read_batch(out),
            ByteArrayDecoder::DeltaFull(d) => d.read_batch(out),
        }
    }
}

/// Decoder variants for FIXED_LEN_BYTE_ARRAY pages.
pub enum FixedLenDecoder {
    Plain(PlainFixedLenDecoder),
    Dict(DictDecoder<Bytes>),
}

impl PageDecoder for FixedLenDecoder {
    type Value = Bytes;

    fn read_batch(&mut self, out: &mut [Bytes]) -> Result<usize> {
        match self {
            FixedLenDecoder::Plain(d) => d.read_batch(out),
            FixedLenDecoder::Dict(d) => d.read_batch(out),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// Encoder variants for INT32 and INT64 pages.
#[derive(Debug)]
pub enum IntEncoder<V: DeltaInt + DictKey + bytemuck::Pod> {
    Plain(PlainNativeEncoder<V>),
    Dict(DictOrPlainEncoder<V, PlainNativeEncoder<V>>),
    Delta(DeltaBinaryPackedEncoder<V>),
}

impl<V: DeltaInt + DictKey + bytemuck::Pod> PageEncoder for IntEncoder<V> {
    type Value = V;

    fn put_batch(&mut self, values: &[V]) {
        match self {
            IntEncoder::Plain(e) => e.put_batch(values),
            IntEncoder::Dict(e) => e.put_batch(values),
            IntEncoder::Delta(e) => e.put_batch(values),
        }
    }

    fn max_encoded_size(&self) -> usize {
        match self {
            IntEncoder::Plain(e) => e.max_encoded_size(),
            IntEncoder::Dict(e) => e.max_encoded_size(),
            IntEncoder::Delta(e) => e.max_encoded_size(),
        }
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        match self {
            IntEncoder::Plain(e) => {
                FlushResult { bytes_written: e.flush(sink), encoding: Encoding::Plain }
            }
            IntEncoder::Dict(e) => e.flush(sink),
            IntEncoder::Delta(e) => FlushResult {
                bytes_written: e.flush(sink),
                encoding: Encoding::DeltaBinaryPacked,
            },
        }
    }

    fn view_dict(&self) -> Option<&[u8]> {
        match self {
            IntEncoder::Dict(e) => Some(e.view_dict()),
            _ => None,
        }
    }

    fn cardinality(&self) -> u64 {
        match self {
            IntEncoder::Dict(e) => e.cardinality(),
            _ => 0,
        }
    }
}

/// Encoder variants for FLOAT and DOUBLE pages.
pub enum RealEncoder<V: DictKey + bytemuck::Pod> {
    Plain(PlainNativeEncoder<V>),
    Dict(DictOrPlainEncoder<V, PlainNativeEncoder<V>>),
    Split(ByteStreamSplitEncoder<V>),
}

impl<V: DictKey + bytemuck::Pod> PageEncoder for RealEncoder<V> {
    type Value = V;

    fn put_batch(&mut self, values: &[V]) {
        match self {
            RealEncoder::Plain(e) => e.put_batch(values),
            RealEncoder::Dict(e) => e.put_batch(values),
            RealEncoder::Split(e) => e.put_batch(values),
        }
    }

    fn max_encoded_size(&self) -> usize {
        match self {
            RealEncoder::Plain(e) => e.max_encoded_size(),
            RealEncoder::Dict(e) => e.max_encoded_size(),
            RealEncoder::Split(e) => e.max_encoded_size(),
        }
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        match self {
            RealEncoder::Plain(e) => {
                FlushResult { bytes_written: e.flush(sink), encoding: Encoding::Plain }
            }
            RealEncoder::Dict(e) => e.flush(sink),
            RealEncoder::Split(e) => FlushResult {
                bytes_written: e.flush(sink),
                encoding: Encoding::ByteStreamSplit,
            },
        }
    }

    fn view_dict(&self) -> Option<&[u8]> {
        match self {
            RealEncoder::Dict(e) => Some(e.view_dict()),
            _ => None,
        }
    }

    fn cardinality(&self) -> u64 {
        match self {
            RealEncoder::Dict(e) => e.cardinality(),
            _ => 0,
        }
    }
}

/// Encoder variants for BOOLEAN pages.
pub enum BooleanEncoder {
    Plain(PlainBooleanEncoder),
}

impl PageEncoder for BooleanEncoder {
    type Value = u8;

    fn put_batch(&mut self, values: &[u8]) {
        match self {
            BooleanEncoder::Plain(e) => e.put_batch(values),
        }
    }

    fn max_encoded_size(&self) -> usize {
        match self {
            BooleanEncoder::Plain(e) => e.max_encoded_size(),
        }
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        match self {
            BooleanEncoder::Plain(e) => {
                FlushResult { bytes_written: e.flush(sink), encoding: Encoding::Plain }
            }
        }
    }

    fn view_dict(&self) -> Option<&[u8]> {
        None
    }

    fn cardinality(&self) -> u64 {
        0
    }
}

/// INT96 writes are rejected by the factory, so this encoder has no
/// inhabitants.
#[derive(Debug)]
pub enum Int96Encoder {}

impl PageEncoder for Int96Encoder {
    type Value = Int96;

    fn put_batch(&mut self, _values: &[Int96]) {
        match *self {}
    }

    fn max_encoded_size(&self) -> usize {
        match *self {}
    }

    fn flush(&mut self, _sink: &mut Vec<u8>) -> FlushResult {
        match *self {}
    }

    fn view_dict(&self) -> Option<&[u8]> {
        match *self {}
    }

    fn cardinality(&self) -> u64 {
        match *self {}
    }
}

/// Encoder variants for BYTE_ARRAY pages.
pub enum ByteArrayEncoder {
    Plain(PlainByteArrayEncoder),
    Dict(DictOrPlainEncoder<Bytes, PlainByteArrayEncoder>),
    DeltaLength(DeltaLengthByteArrayEncoder),
    DeltaFull(DeltaByteArrayEncoder),
}

impl PageEncoder for ByteArrayEncoder {
    type Value = Bytes;

    fn put_batch(&mut self, values: &[Bytes]) {
        match self {
            ByteArrayEncoder::Plain(e) => e.put_batch(values),
            ByteArrayEncoder::Dict(e) => e.put_batch(values),
            ByteArrayEncoder::DeltaLength(e) => e.put_batch(values),
            ByteArrayEncoder::DeltaFull(e) => e.put_batch(values),
        }
    }

    fn max_encoded_size(&self) -> usize {
        match self {
            ByteArrayEncoder::Plain(e) => e.max_encoded_size(),
            ByteArrayEncoder::Dict(e) => e.max_encoded_size(),
            ByteArrayEncoder::DeltaLength(e) => e.max_encoded_size(),
            ByteArrayEncoder::DeltaFull(e) => e.max_encoded_size(),
        }
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        match self {
            ByteArrayEncoder::Plain(e) => {
                FlushResult { bytes_written: e.flush(sink), encoding: Encoding::Plain }
            }
            ByteArrayEncoder::Dict(e) => e.flush(sink),
            ByteArrayEncoder::DeltaLength(e) => FlushResult {
                bytes_written: e.flush(sink),
                encoding: Encoding::DeltaLengthByteArray,
            },
            ByteArrayEncoder::DeltaFull(e) => FlushResult {
                bytes_written: e.flush(sink),
                encoding: Encoding::DeltaByteArray,
            },
        }
    }

    fn view_dict(&self) -> Option<&[u8]> {
        match self {
            ByteArrayEncoder::Dict(e) => Some(e.view_dict()),
            _ => None,
        }
    }

    fn cardinality(&self) -> u64 {
        match self {
            ByteArrayEncoder::Dict(e) => e.cardinality(),
            _ => 0,
        }
    }
}

/// Encoder variants for FIXED_LEN_BYTE_ARRAY pages.
pub enum FixedLenEncoder {
    Plain(PlainFixedLenEncoder),
    Dict(DictOrPlainEncoder<Bytes, PlainFixedLenEncoder>),
}

impl PageEncoder for FixedLenEncoder {
    type Value = Bytes;

    fn put_batch(&mut self, values: &[Bytes]) {
        match self {
            FixedLenEncoder::Plain(e) => e.put_batch(values),
            FixedLenEncoder::Dict(e) => e.put_batch(values),
        }
    }

    fn max_encoded_size(&self) -> usize {
        match self {
            FixedLenEncoder::Plain(e) => e.max_encoded_size(),
            FixedLenEncoder::Dict(e) => e.max_encoded_size(),
        }
    }

    fn flush(&mut self, sink: &mut Vec<u8>) -> FlushResult {
        match self {
            FixedLenEncoder::Plain(e) => {
                FlushResult { bytes_written: e.flush(sink), encoding: Encoding::Plain }
            }
            FixedLenEncoder::Dict(e) => e.flush(sink),
        }
    }

    fn view_dict(&self) -> Option<&[u8]> {
        match self {
            FixedLenEncoder::Dict(e) => Some(e.view_dict()),
            _ => None,
        }
    }

    fn cardinality(&self) -> u64 {
        match self {
            FixedLenEncoder::Dict(e) => e.cardinality(),
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// The per-type table
// ---------------------------------------------------------------------------

impl ColumnType for Int32Type {
    type Value = i32;
    type Decoder = IntDecoder<i32>;
    type Encoder = IntEncoder<i32>;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int32;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[i32]>>,
    ) -> Result<Self::Decoder> {
        IntDecoder::select(page, encoding, dict, Self::PHYSICAL_TYPE)
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        new_int_encoder(encoding, Self::PHYSICAL_TYPE)
    }
}

impl ColumnType for Int64Type {
    type Value = i64;
    type Decoder = IntDecoder<i64>;
    type Encoder = IntEncoder<i64>;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int64;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[i64]>>,
    ) -> Result<Self::Decoder> {
        IntDecoder::select(page, encoding, dict, Self::PHYSICAL_TYPE)
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        new_int_encoder(encoding, Self::PHYSICAL_TYPE)
    }
}

fn new_int_encoder<V: DeltaInt + DictKey + bytemuck::Pod>(
    encoding: Encoding,
    physical: PhysicalType,
) -> Result<IntEncoder<V>> {
    match encoding {
        Encoding::Plain => Ok(IntEncoder::Plain(PlainNativeEncoder::new())),
        Encoding::RleDictionary => Ok(IntEncoder::Dict(DictOrPlainEncoder::new(
            PlainNativeEncoder::new(),
            PlainNativeEncoder::new(),
        ))),
        Encoding::DeltaBinaryPacked => Ok(IntEncoder::Delta(DeltaBinaryPackedEncoder::new())),
        other => Err(reject_write(other, physical)),
    }
}

impl ColumnType for FloatType {
    type Value = f32;
    type Decoder = RealDecoder<f32>;
    type Encoder = RealEncoder<f32>;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Float;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[f32]>>,
    ) -> Result<Self::Decoder> {
        RealDecoder::select(page, encoding, dict, Self::PHYSICAL_TYPE)
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        new_real_encoder(encoding, Self::PHYSICAL_TYPE)
    }
}

impl ColumnType for DoubleType {
    type Value = f64;
    type Decoder = RealDecoder<f64>;
    type Encoder = RealEncoder<f64>;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Double;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[f64]>>,
    ) -> Result<Self::Decoder> {
        RealDecoder::select(page, encoding, dict, Self::PHYSICAL_TYPE)
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        new_real_encoder(encoding, Self::PHYSICAL_TYPE)
    }
}

fn new_real_encoder<V: DictKey + bytemuck::Pod>(
    encoding: Encoding,
    physical: PhysicalType,
) -> Result<RealEncoder<V>> {
    match encoding {
        Encoding::Plain => Ok(RealEncoder::Plain(PlainNativeEncoder::new())),
        Encoding::RleDictionary => Ok(RealEncoder::Dict(DictOrPlainEncoder::new(
            PlainNativeEncoder::new(),
            PlainNativeEncoder::new(),
        ))),
        Encoding::ByteStreamSplit => Ok(RealEncoder::Split(ByteStreamSplitEncoder::new())),
        other => Err(reject_write(other, physical)),
    }
}

impl ColumnType for BooleanType {
    type Value = u8;
    type Decoder = BooleanDecoder;
    type Encoder = BooleanEncoder;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Boolean;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[u8]>>,
    ) -> Result<Self::Decoder> {
        match encoding {
            Encoding::Plain => Ok(BooleanDecoder::Plain(PlainBooleanDecoder::new(page))),
            Encoding::Rle => Ok(BooleanDecoder::Rle(RleBooleanDecoder::new(page))),
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(BooleanDecoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            other => Err(reject_read(other, Self::PHYSICAL_TYPE)),
        }
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        match encoding {
            Encoding::Plain => Ok(BooleanEncoder::Plain(PlainBooleanEncoder::new())),
            Encoding::Rle => {
                Err(StrataError::NotImplemented(Encoding::Rle, Self::PHYSICAL_TYPE))
            }
            other => Err(reject_write(other, Self::PHYSICAL_TYPE)),
        }
    }
}

impl ColumnType for Int96Type {
    type Value = Int96;
    type Decoder = Int96Decoder;
    type Encoder = Int96Encoder;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Int96;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[Int96]>>,
    ) -> Result<Self::Decoder> {
        match encoding {
            Encoding::Plain => Ok(Int96Decoder::Plain(PlainNativeDecoder::new(page))),
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(Int96Decoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            other => Err(reject_read(other, Self::PHYSICAL_TYPE)),
        }
    }

    fn new_encoder(_encoding: Encoding) -> Result<Self::Encoder> {
        Err(StrataError::corrupted(
            "INT96 is deprecated and writes of this type are unsupported",
        ))
    }
}

impl ColumnType for ByteArrayType {
    type Value = Bytes;
    type Decoder = ByteArrayDecoder;
    type Encoder = ByteArrayEncoder;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::ByteArray;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        _type_length: Option<u32>,
        dict: Option<&Arc<[Bytes]>>,
    ) -> Result<Self::Decoder> {
        match encoding {
            Encoding::Plain => Ok(ByteArrayDecoder::Plain(PlainByteArrayDecoder::new(page))),
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(ByteArrayDecoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            Encoding::DeltaLengthByteArray => Ok(ByteArrayDecoder::DeltaLength(
                DeltaLengthByteArrayDecoder::new(page)?,
            )),
            Encoding::DeltaByteArray => {
                Ok(ByteArrayDecoder::DeltaFull(DeltaByteArrayDecoder::new(page)?))
            }
            other => Err(reject_read(other, Self::PHYSICAL_TYPE)),
        }
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        match encoding {
            Encoding::Plain => Ok(ByteArrayEncoder::Plain(PlainByteArrayEncoder::new())),
            Encoding::RleDictionary => Ok(ByteArrayEncoder::Dict(DictOrPlainEncoder::new(
                PlainByteArrayEncoder::new(),
                PlainByteArrayEncoder::new(),
            ))),
            Encoding::DeltaLengthByteArray => {
                Ok(ByteArrayEncoder::DeltaLength(DeltaLengthByteArrayEncoder::new()))
            }
            Encoding::DeltaByteArray => {
                Ok(ByteArrayEncoder::DeltaFull(DeltaByteArrayEncoder::new()))
            }
            other => Err(reject_write(other, Self::PHYSICAL_TYPE)),
        }
    }
}

impl ColumnType for FixedLenByteArrayType {
    type Value = Bytes;
    type Decoder = FixedLenDecoder;
    type Encoder = FixedLenEncoder;

    const PHYSICAL_TYPE: PhysicalType = PhysicalType::FixedLenByteArray;

    fn new_decoder(
        page: Bytes,
        encoding: Encoding,
        type_length: Option<u32>,
        dict: Option<&Arc<[Bytes]>>,
    ) -> Result<Self::Decoder> {
        match encoding {
            Encoding::Plain => {
                let fixed_len = type_length.ok_or_else(|| {
                    StrataError::corrupted("type_length not set for FIXED_LEN_BYTE_ARRAY")
                })?;
                Ok(FixedLenDecoder::Plain(PlainFixedLenDecoder::new(page, fixed_len as usize)))
            }
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                Ok(FixedLenDecoder::Dict(DictDecoder::new(page, bound_dict(dict)?)?))
            }
            other => Err(reject_read(other, Self::PHYSICAL_TYPE)),
        }
    }

    fn new_encoder(encoding: Encoding) -> Result<Self::Encoder> {
        match encoding {
            Encoding::Plain => Ok(FixedLenEncoder::Plain(PlainFixedLenEncoder::new())),
            Encoding::RleDictionary => Ok(FixedLenEncoder::Dict(DictOrPlainEncoder::new(
                PlainFixedLenEncoder::new(),
                PlainFixedLenEncoder::new(),
            ))),
            other => Err(reject_write(other, Self::PHYSICAL_TYPE)),
        }
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// A uniform interface to all the value decoders of one column: binds pages
/// and an optional dictionary, selects the kernel per page, and reads
/// batches.
pub struct ValueDecoder<T: ColumnType> {
    type_length: Option<u32>,
    dict: Option<Arc<[T::Value]>>,
    codec: Option<T::Decoder>,
}

impl<T: ColumnType> ValueDecoder<T> {
    pub fn new(type_length: Option<u32>) -> Result<Self> {
        if T::PHYSICAL_TYPE == PhysicalType::FixedLenByteArray && type_length.is_none() {
            return Err(StrataError::corrupted("type_length not set for FIXED_LEN_BYTE_ARRAY"));
        }
        Ok(ValueDecoder { type_length, dict: None, codec: None })
    }

    /// Binds the dictionary decoded from this chunk's dictionary page. Must
    /// happen before the first dictionary-encoded data page is bound.
    pub fn reset_dict(&mut self, dict: Arc<[T::Value]>) {
        self.dict = Some(dict);
    }

    /// Binds a new data page, selecting the kernel for its encoding.
    pub fn reset(&mut self, page: Bytes, encoding: Encoding) -> Result<()> {
        log::trace!("binding {} page of {}B as {}", T::PHYSICAL_TYPE, page.len(), encoding);
        self.codec = Some(T::new_decoder(page, encoding, self.type_length, self.dict.as_ref())?);
        Ok(())
    }

    /// Reads up to `out.len()` values from the bound page; fewer means the
    /// page is exhausted.
    pub fn read_batch(&mut self, out: &mut [T::Value]) -> Result<usize> {
        match &mut self.codec {
            Some(codec) => codec.read_batch(out),
            None => Err(StrataError::Internal("read_batch called before reset".to_string())),
        }
    }
}

/// Builds a fresh encoder for one column chunk's pages, or rejects the
/// (type, encoding) pair.
pub fn make_value_encoder<T: ColumnType>(encoding: Encoding) -> Result<T::Encoder> {
    T::new_encoder(encoding)
}
