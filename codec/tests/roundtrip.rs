//! Round-trip properties of the codec: every scalar decodes back to the value
//! that was encoded, leaving whatever followed it untouched.

use polyglot_codec::*;
use proptest::prelude::*;

const TRAILER: [u8; 3] = [0xde, 0xad, 0x00];

fn with_trailer(buf: Vec<u8>) -> Vec<u8> {
    let mut buf = buf;
    buf.extend_from_slice(&TRAILER);
    buf
}

proptest! {
    #[test]
    fn bool_round_trips(v in any::<bool>()) {
        let buf = with_trailer(encode_bool(Vec::new(), v));
        let decoded = decode_bool(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn u8_round_trips(v in any::<u8>()) {
        let buf = with_trailer(encode_u8(Vec::new(), v));
        let decoded = decode_u8(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn u16_round_trips(v in any::<u16>()) {
        let buf = with_trailer(encode_u16(Vec::new(), v));
        let decoded = decode_u16(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn u32_round_trips(v in any::<u32>()) {
        let buf = with_trailer(encode_u32(Vec::new(), v));
        let decoded = decode_u32(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn u64_round_trips(v in any::<u64>()) {
        let buf = with_trailer(encode_u64(Vec::new(), v));
        let decoded = decode_u64(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn i32_round_trips(v in any::<i32>()) {
        let buf = with_trailer(encode_i32(Vec::new(), v));
        let decoded = decode_i32(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn i64_round_trips(v in any::<i64>()) {
        let buf = with_trailer(encode_i64(Vec::new(), v));
        let decoded = decode_i64(&buf).unwrap();
        prop_assert_eq!(decoded.value, v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn f32_round_trips_bit_exact(v in any::<f32>()) {
        let buf = with_trailer(encode_f32(Vec::new(), v));
        let decoded = decode_f32(&buf).unwrap();
        prop_assert_eq!(decoded.value.to_bits(), v.to_bits());
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn f64_round_trips_bit_exact(v in any::<f64>()) {
        let buf = with_trailer(encode_f64(Vec::new(), v));
        let decoded = decode_f64(&buf).unwrap();
        prop_assert_eq!(decoded.value.to_bits(), v.to_bits());
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn string_round_trips(v in ".*") {
        let buf = with_trailer(encode_string(Vec::new(), &v));
        let decoded = decode_string(&buf).unwrap();
        prop_assert_eq!(&decoded.value, &v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn bytes_round_trip(v in proptest::collection::vec(any::<u8>(), 0..256)) {
        let buf = with_trailer(encode_bytes(Vec::new(), &v));
        let decoded = decode_bytes(&buf).unwrap();
        prop_assert_eq!(&decoded.value, &v);
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn error_keeps_only_the_message(v in ".*") {
        let buf = with_trailer(encode_error(Vec::new(), &RemoteError::new(v.clone())));
        let decoded = decode_error(&buf).unwrap();
        prop_assert_eq!(decoded.value.message(), v.as_str());
        prop_assert_eq!(decoded.remainder, &TRAILER[..]);
    }

    #[test]
    fn encoding_preserves_the_prefix(prefix in proptest::collection::vec(any::<u8>(), 0..32), v in any::<u32>()) {
        let buf = encode_u32(prefix.clone(), v);
        prop_assert_eq!(&buf[..prefix.len()], prefix.as_slice());
        prop_assert_eq!(decode_u32(&buf[prefix.len()..]).unwrap().value, v);
    }

    #[test]
    fn unregistered_tags_are_rejected(tag in 0x10u8..=0xff) {
        let number = [tag, 0, 0, 0, 0];
        let array = [0x01, tag, 0x0a, 0, 0, 0, 0];
        let map = [0x02, 0x05, tag, 0x0a, 0, 0, 0, 0];
        prop_assert_eq!(decode_u32(&number), Err(DecodeError::InvalidU32));
        prop_assert_eq!(decode_array(&array), Err(DecodeError::InvalidArray));
        prop_assert_eq!(decode_map(&map), Err(DecodeError::InvalidMap));
    }
}

#[test]
fn map_round_trip() {
    let entries = [("a", 1u64), ("b", u64::MAX), ("c", 0)];
    let mut buf = encode_map(Vec::new(), entries.len() as u32, Kind::String, Kind::U64);
    for (key, value) in entries {
        buf = encode_string(buf, key);
        buf = encode_u64(buf, value);
    }

    let header = decode_map(&buf).unwrap();
    assert_eq!(header.value, entries.len() as u32);

    let mut remainder = header.remainder;
    for (key, value) in entries {
        let k = decode_string(remainder).unwrap();
        let v = decode_u64(k.remainder).unwrap();
        assert_eq!((k.value.as_str(), v.value), (key, value));
        remainder = v.remainder;
    }
    assert!(remainder.is_empty());
}

#[test]
fn nested_array_headers() {
    let mut buf = encode_array(Vec::new(), 2, Kind::Array);
    buf = encode_array(buf, 1, Kind::Bool);
    buf = encode_bool(buf, true);
    buf = encode_array(buf, 0, Kind::Bool);

    let outer = decode_array_header(&buf).unwrap();
    assert_eq!(outer.value.element, Kind::Array);
    assert_eq!(outer.value.size, 2);

    let first = decode_array(outer.remainder).unwrap();
    assert_eq!(first.value, 1);
    let flag = decode_bool(first.remainder).unwrap();
    assert!(flag.value);
    let second = decode_array(flag.remainder).unwrap();
    assert_eq!(second.value, 0);
    assert!(second.remainder.is_empty());
}

#[test]
fn none_marks_an_absent_value() {
    let buf = encode_none(Vec::new());
    let buf = encode_string(buf, "after");

    let probe = decode_none(&buf);
    assert!(probe.value);
    assert_eq!(decode_string(probe.remainder).unwrap().value, "after");

    let again = decode_none(probe.remainder);
    assert!(!again.value);
    assert_eq!(again.remainder, probe.remainder);
}
