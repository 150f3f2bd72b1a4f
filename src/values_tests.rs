//! End-to-end tests of the codec facade: encoder factory -> flush ->
//! decoder, across the supported (type, encoding) matrix, plus the
//! rejection paths a page reader relies on.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::StrataError;
use crate::types::{Encoding, FlushResult, PhysicalType};
use crate::values::{
    make_value_encoder, BooleanType, ByteArrayType, ColumnType, DoubleType, FixedLenByteArrayType,
    FloatType, Int32Type, Int64Type, Int96Type, PageEncoder, ValueDecoder,
};

/// Encodes `values` under `encoding`, decodes the page under the realized
/// encoding, and asserts the round-trip, the size bound, and the realized
/// encoding itself.
fn roundtrip<T: ColumnType>(
    values: &[T::Value],
    encoding: Encoding,
    type_length: Option<u32>,
) -> FlushResult {
    let mut encoder = make_value_encoder::<T>(encoding).unwrap();
    encoder.put_batch(values);
    let max_size = encoder.max_encoded_size();
    let mut page = Vec::new();
    let result = encoder.flush(&mut page);
    assert_eq!(result.bytes_written, page.len());
    assert!(page.len() <= max_size, "{} > bound {}", page.len(), max_size);

    let mut decoder = ValueDecoder::<T>::new(type_length).unwrap();
    if encoder.cardinality() > 0 {
        // Decode the dictionary page the encoder accumulated, then bind it.
        let dict_page = Bytes::copy_from_slice(encoder.view_dict().unwrap());
        let mut dict_decoder = ValueDecoder::<T>::new(type_length).unwrap();
        dict_decoder.reset(dict_page, Encoding::Plain).unwrap();
        let mut dict = vec![values[0].clone(); encoder.cardinality() as usize];
        assert_eq!(dict_decoder.read_batch(&mut dict).unwrap(), dict.len());
        decoder.reset_dict(Arc::from(dict.into_boxed_slice()));
    }
    decoder.reset(Bytes::from(page), result.encoding).unwrap();

    // A page reader asks for exactly the declared value count; bit-packed
    // groups may carry padding past it.
    let mut out = vec![values[0].clone(); values.len()];
    let n_read = decoder.read_batch(&mut out).unwrap();
    assert_eq!(n_read, values.len());
    assert_eq!(&out[..], values);
    result
}

#[test]
fn test_plain_int32_wire_layout() {
    let mut encoder = make_value_encoder::<Int32Type>(Encoding::Plain).unwrap();
    encoder.put_batch(&[1, -1, 0]);
    let mut page = Vec::new();
    let result = encoder.flush(&mut page);
    assert_eq!(result, FlushResult { bytes_written: 12, encoding: Encoding::Plain });
    assert_eq!(
        page,
        vec![0x01, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_plain_roundtrips_all_types() {
    roundtrip::<Int32Type>(&[i32::MIN, -1, 0, 1, i32::MAX], Encoding::Plain, None);
    roundtrip::<Int64Type>(&[i64::MIN, -1, 0, 1, i64::MAX], Encoding::Plain, None);
    roundtrip::<FloatType>(&[0.0, -1.5, f32::MAX], Encoding::Plain, None);
    roundtrip::<DoubleType>(&[0.0, -1.5, f64::MIN_POSITIVE], Encoding::Plain, None);
    roundtrip::<BooleanType>(&[1, 0, 0, 1, 1, 1, 0, 1, 0], Encoding::Plain, None);
    let strings: Vec<Bytes> =
        ["", "a", "bc", "a value long enough to be interesting"]
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect();
    roundtrip::<ByteArrayType>(&strings, Encoding::Plain, None);
    let fixed: Vec<Bytes> = [b"abcd", b"efgh", b"ijkl"]
        .iter()
        .map(|s| Bytes::copy_from_slice(&s[..]))
        .collect();
    roundtrip::<FixedLenByteArrayType>(&fixed, Encoding::Plain, Some(4));
}

#[test]
fn test_dictionary_roundtrips() {
    let values: Vec<i32> = (0..1000).map(|i| i % 17).collect();
    let result = roundtrip::<Int32Type>(&values, Encoding::RleDictionary, None);
    assert_eq!(result.encoding, Encoding::RleDictionary);

    let strings: Vec<Bytes> = (0..300)
        .map(|i| Bytes::copy_from_slice(format!("key-{}", i % 5).as_bytes()))
        .collect();
    roundtrip::<ByteArrayType>(&strings, Encoding::RleDictionary, None);

    let reals: Vec<f64> = (0..64).map(|i| (i % 3) as f64 * 0.5).collect();
    roundtrip::<DoubleType>(&reals, Encoding::RleDictionary, None);

    let fixed: Vec<Bytes> = (0..40)
        .map(|i| Bytes::copy_from_slice(if i % 2 == 0 { b"aaaa" } else { b"bbbb" }))
        .collect();
    roundtrip::<FixedLenByteArrayType>(&fixed, Encoding::RleDictionary, Some(4));
}

#[test]
fn test_dictionary_page_wire_layout() {
    let values: Vec<Bytes> = ["a", "b", "a", "c", "b"]
        .iter()
        .map(|s| Bytes::copy_from_slice(s.as_bytes()))
        .collect();
    let mut encoder = make_value_encoder::<ByteArrayType>(Encoding::RleDictionary).unwrap();
    encoder.put_batch(&values);

    assert_eq!(
        encoder.view_dict().unwrap(),
        &[1, 0, 0, 0, b'a', 1, 0, 0, 0, b'b', 1, 0, 0, 0, b'c'][..]
    );
    let mut page = Vec::new();
    let result = encoder.flush(&mut page);
    assert_eq!(result.encoding, Encoding::RleDictionary);
    assert_eq!(page[0], 2); // index bit width for cardinality 3
}

#[test]
fn test_delta_binary_packed_roundtrips() {
    let mut values: Vec<i32> = (0..700).map(|i| i * 3 - 1000).collect();
    values.extend([i32::MIN, i32::MAX, 0]);
    roundtrip::<Int32Type>(&values, Encoding::DeltaBinaryPacked, None);

    let mut values64: Vec<i64> = (0..700).map(|i| (i as i64).pow(2) - 9000).collect();
    values64.extend([i64::MIN, i64::MAX, 0]);
    roundtrip::<Int64Type>(&values64, Encoding::DeltaBinaryPacked, None);

    roundtrip::<Int32Type>(&[42], Encoding::DeltaBinaryPacked, None);
}

#[test]
fn test_delta_byte_array_roundtrips() {
    let values: Vec<Bytes> = [
        "alfa", "alfalfa", "alfred", "beta", "", "betamax", "gamma", "gamma",
    ]
    .iter()
    .map(|s| Bytes::copy_from_slice(s.as_bytes()))
    .collect();
    roundtrip::<ByteArrayType>(&values, Encoding::DeltaLengthByteArray, None);
    roundtrip::<ByteArrayType>(&values, Encoding::DeltaByteArray, None);
}

#[test]
fn test_byte_stream_split_roundtrips() {
    let floats: Vec<f32> = (0..33).map(|i| i as f32 * 1.25 - 8.0).collect();
    let result = roundtrip::<FloatType>(&floats, Encoding::ByteStreamSplit, None);
    assert_eq!(result.encoding, Encoding::ByteStreamSplit);

    let doubles: Vec<f64> = (0..17).map(|i| f64::powi(-1.1, i)).collect();
    roundtrip::<DoubleType>(&doubles, Encoding::ByteStreamSplit, None);
}

#[test]
fn test_adaptive_fallback_realized_encoding() {
    // 8 KiB of distinct i64 values crosses the 16 KiB dictionary threshold
    // on the second page.
    let mut encoder = make_value_encoder::<Int64Type>(Encoding::RleDictionary).unwrap();
    let first: Vec<i64> = (0..1500).collect();
    encoder.put_batch(&first);
    let mut page1 = Vec::new();
    assert_eq!(encoder.flush(&mut page1).encoding, Encoding::RleDictionary);

    let second: Vec<i64> = (1500..3000).collect();
    encoder.put_batch(&second);
    let mut page2 = Vec::new();
    assert_eq!(encoder.flush(&mut page2).encoding, Encoding::RleDictionary);

    // 3000 * 8B of dictionary > 16 KiB: the next page is PLAIN.
    let third: Vec<i64> = vec![1, 2, 3];
    encoder.put_batch(&third);
    let mut page3 = Vec::new();
    let result = encoder.flush(&mut page3);
    assert_eq!(result.encoding, Encoding::Plain);
    assert_eq!(page3.len(), 24);
    assert_eq!(encoder.cardinality(), 3000);

    // Earlier dictionary pages still decode against the emitted dictionary.
    let dict: Arc<[i64]> = (0..3000).collect();
    let mut decoder = ValueDecoder::<Int64Type>::new(None).unwrap();
    decoder.reset_dict(dict);
    decoder.reset(Bytes::from(page2), Encoding::RleDictionary).unwrap();
    let mut out = vec![0i64; 1500];
    assert_eq!(decoder.read_batch(&mut out).unwrap(), 1500);
    assert_eq!(out, second);
}

#[test]
fn test_plain_dictionary_reads_as_rle_dictionary() {
    let values: Vec<i32> = vec![3, 1, 3, 3, 1];
    let mut encoder = make_value_encoder::<Int32Type>(Encoding::RleDictionary).unwrap();
    encoder.put_batch(&values);
    let mut page = Vec::new();
    encoder.flush(&mut page);

    let dict: Arc<[i32]> = Arc::from(vec![3, 1].into_boxed_slice());
    let mut decoder = ValueDecoder::<Int32Type>::new(None).unwrap();
    decoder.reset_dict(dict);
    decoder.reset(Bytes::from(page), Encoding::PlainDictionary).unwrap();
    let mut out = vec![0i32; 5];
    assert_eq!(decoder.read_batch(&mut out).unwrap(), 5);
    assert_eq!(out, values);
}

#[test]
fn test_dictionary_page_without_bound_dict_is_corruption() {
    let mut decoder = ValueDecoder::<Int32Type>::new(None).unwrap();
    let err = decoder
        .reset(Bytes::from_static(&[2, 0]), Encoding::RleDictionary)
        .unwrap_err();
    assert!(matches!(err, StrataError::CorruptedPage(_)));
    assert!(err.to_string().contains("No dictionary page"));
}

#[test]
fn test_int96_decodes_plain_but_never_encodes() {
    let page: Vec<u8> = (0..24).collect();
    let mut decoder = ValueDecoder::<Int96Type>::new(None).unwrap();
    decoder.reset(Bytes::from(page), Encoding::Plain).unwrap();
    let mut out = [[0i32; 3]; 2];
    assert_eq!(decoder.read_batch(&mut out).unwrap(), 2);

    for encoding in [Encoding::Plain, Encoding::RleDictionary, Encoding::DeltaBinaryPacked] {
        let err = make_value_encoder::<Int96Type>(encoding).unwrap_err();
        assert!(matches!(err, StrataError::CorruptedPage(_)));
        assert!(err.to_string().contains("INT96"));
    }
}

#[test]
fn test_plain_dictionary_writes_are_rejected() {
    let err = make_value_encoder::<Int32Type>(Encoding::PlainDictionary).unwrap_err();
    assert!(matches!(err, StrataError::CorruptedPage(_)));
    assert!(err.to_string().contains("PLAIN_DICTIONARY"));
}

#[test]
fn test_invalid_read_pairings() {
    let page = Bytes::from_static(&[0x00, 0x00, 0x00, 0x00]);

    let mut decoder = ValueDecoder::<Int32Type>::new(None).unwrap();
    assert!(matches!(
        decoder.reset(page.clone(), Encoding::Rle),
        Err(StrataError::CorruptedPage(_))
    ));
    assert!(matches!(
        decoder.reset(page.clone(), Encoding::ByteStreamSplit),
        Err(StrataError::CorruptedPage(_))
    ));
    assert!(matches!(
        decoder.reset(page.clone(), Encoding::BitPacked),
        Err(StrataError::NotImplemented(Encoding::BitPacked, PhysicalType::Int32))
    ));

    let mut real = ValueDecoder::<DoubleType>::new(None).unwrap();
    assert!(matches!(
        real.reset(page.clone(), Encoding::DeltaBinaryPacked),
        Err(StrataError::CorruptedPage(_))
    ));

    let mut flba = ValueDecoder::<FixedLenByteArrayType>::new(Some(2)).unwrap();
    assert!(matches!(
        flba.reset(page, Encoding::DeltaByteArray),
        Err(StrataError::CorruptedPage(_))
    ));
}

#[test]
fn test_invalid_write_pairings() {
    assert!(matches!(
        make_value_encoder::<Int32Type>(Encoding::ByteStreamSplit),
        Err(StrataError::InvalidEncoding(Encoding::ByteStreamSplit, PhysicalType::Int32))
    ));
    assert!(matches!(
        make_value_encoder::<FloatType>(Encoding::DeltaBinaryPacked),
        Err(StrataError::InvalidEncoding(_, PhysicalType::Float))
    ));
    assert!(matches!(
        make_value_encoder::<Int64Type>(Encoding::Rle),
        Err(StrataError::InvalidEncoding(Encoding::Rle, PhysicalType::Int64))
    ));
    assert!(matches!(
        make_value_encoder::<BooleanType>(Encoding::Rle),
        Err(StrataError::NotImplemented(Encoding::Rle, PhysicalType::Boolean))
    ));
    assert!(matches!(
        make_value_encoder::<FixedLenByteArrayType>(Encoding::DeltaLengthByteArray),
        Err(StrataError::InvalidEncoding(_, PhysicalType::FixedLenByteArray))
    ));
}

#[test]
fn test_flba_requires_type_length() {
    assert!(matches!(
        ValueDecoder::<FixedLenByteArrayType>::new(None),
        Err(StrataError::CorruptedPage(_))
    ));
}

#[test]
fn test_rle_boolean_value_page() {
    // A boolean value page may be one hybrid stream: run of four 1s, run of
    // three 0s.
    let page = Bytes::from_static(&[0x08, 0x01, 0x06, 0x00]);
    let mut decoder = ValueDecoder::<BooleanType>::new(None).unwrap();
    decoder.reset(page, Encoding::Rle).unwrap();
    let mut out = [9u8; 7];
    assert_eq!(decoder.read_batch(&mut out).unwrap(), 7);
    assert_eq!(out, [1, 1, 1, 1, 0, 0, 0]);
}

#[test]
fn test_decoder_values_outlive_page_and_decoder() {
    let values: Vec<Bytes> = vec![Bytes::from_static(b"persistent")];
    let mut encoder = make_value_encoder::<ByteArrayType>(Encoding::Plain).unwrap();
    encoder.put_batch(&values);
    let mut page = Vec::new();
    encoder.flush(&mut page);

    let mut out = vec![Bytes::new(); 1];
    {
        let mut decoder = ValueDecoder::<ByteArrayType>::new(None).unwrap();
        decoder.reset(Bytes::from(page), Encoding::Plain).unwrap();
        decoder.read_batch(&mut out).unwrap();
    }
    assert_eq!(&out[0][..], b"persistent");
}
