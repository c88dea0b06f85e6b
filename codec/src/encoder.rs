//! Encoders. Each one appends a tag byte and its payload to `buf` and returns
//! the grown buffer; the bytes already in `buf` are left untouched.

use crate::kind::Kind;

pub const BOOL_FALSE: u8 = 0x00;
pub const BOOL_TRUE: u8 = 0x01;

fn append(mut buf: Vec<u8>, kind: Kind, payload: &[u8]) -> Vec<u8> {
    buf.reserve(1 + payload.len());
    buf.push(kind.as_byte());
    buf.extend_from_slice(payload);
    buf
}

/// The `U32` a body, array or map of `len` items is written with.
///
/// # Panics
///
/// If `len` does not fit in a `u32`. Such a value has no encoding, and
/// truncating the length would corrupt the rest of the stream.
pub fn wire_len(len: usize) -> u32 {
    match u32::try_from(len) {
        Ok(len) => len,
        Err(_) => panic!("length {} exceeds the u32 limit of the wire format", len),
    }
}

/// Write a length-prefixed body: the tag, a `U32` length, then the raw bytes.
fn append_sized(buf: Vec<u8>, kind: Kind, body: &[u8]) -> Vec<u8> {
    let mut buf = encode_u32(append(buf, kind, &[]), wire_len(body.len()));
    buf.extend_from_slice(body);
    buf
}

/// Write the `None` sentinel. It has no payload.
pub fn encode_none(buf: Vec<u8>) -> Vec<u8> {
    append(buf, Kind::None, &[])
}

/// Write the `Any` sentinel. It has no payload.
pub fn encode_any(buf: Vec<u8>) -> Vec<u8> {
    append(buf, Kind::Any, &[])
}

pub fn encode_bool(buf: Vec<u8>, value: bool) -> Vec<u8> {
    append(buf, Kind::Bool, &[if value { BOOL_TRUE } else { BOOL_FALSE }])
}

pub fn encode_u8(buf: Vec<u8>, value: u8) -> Vec<u8> {
    append(buf, Kind::U8, &[value])
}

pub fn encode_u16(buf: Vec<u8>, value: u16) -> Vec<u8> {
    append(buf, Kind::U16, &value.to_be_bytes())
}

pub fn encode_u32(buf: Vec<u8>, value: u32) -> Vec<u8> {
    append(buf, Kind::U32, &value.to_be_bytes())
}

pub fn encode_u64(buf: Vec<u8>, value: u64) -> Vec<u8> {
    append(buf, Kind::U64, &value.to_be_bytes())
}

/// Signed integers are plain two's complement, no zig-zag.
pub fn encode_i32(buf: Vec<u8>, value: i32) -> Vec<u8> {
    append(buf, Kind::I32, &value.to_be_bytes())
}

pub fn encode_i64(buf: Vec<u8>, value: i64) -> Vec<u8> {
    append(buf, Kind::I64, &value.to_be_bytes())
}

/// Floats are written as their IEEE-754 bit pattern, big-endian.
pub fn encode_f32(buf: Vec<u8>, value: f32) -> Vec<u8> {
    append(buf, Kind::F32, &value.to_bits().to_be_bytes())
}

pub fn encode_f64(buf: Vec<u8>, value: f64) -> Vec<u8> {
    append(buf, Kind::F64, &value.to_bits().to_be_bytes())
}

/// Write an opaque byte sequence. Panics on bodies of 4 GiB or more.
pub fn encode_bytes(buf: Vec<u8>, value: &[u8]) -> Vec<u8> {
    append_sized(buf, Kind::Bytes, value)
}

/// Write a UTF-8 string. Panics on bodies of 4 GiB or more.
pub fn encode_string(buf: Vec<u8>, value: &str) -> Vec<u8> {
    append_sized(buf, Kind::String, value.as_bytes())
}

/// Write an error as the `Error` tag followed by its message encoded as a
/// `String`. Only the `Display` text is kept.
pub fn encode_error<E>(buf: Vec<u8>, value: &E) -> Vec<u8>
where
    E: std::error::Error + ?Sized,
{
    encode_string(append(buf, Kind::Error, &[]), &value.to_string())
}

/// Write an array header. The `size` elements must follow, each written with
/// the encoder for `element` (or with their own `encode` for `Any`).
pub fn encode_array(buf: Vec<u8>, size: u32, element: Kind) -> Vec<u8> {
    encode_u32(append(buf, Kind::Array, &[element.as_byte()]), size)
}

/// Write a map header. The `size` entries must follow as key, value pairs.
pub fn encode_map(buf: Vec<u8>, size: u32, key: Kind, value: Kind) -> Vec<u8> {
    encode_u32(append(buf, Kind::Map, &[key.as_byte(), value.as_byte()]), size)
}

#[cfg(test)]
fn encode_once(cb: impl FnOnce(Vec<u8>) -> Vec<u8>) -> Vec<u8> {
    cb(Vec::new())
}

#[test]
fn encode_sentinels() {
    assert_eq!(encode_once(encode_none), [0x00]);
    assert_eq!(encode_once(encode_any), [0x03]);
}

#[test]
fn encode_bool_payload() {
    assert_eq!(encode_once(|b| encode_bool(b, true)), [0x07, 0x01]);
    assert_eq!(encode_once(|b| encode_bool(b, false)), [0x07, 0x00]);
}

#[test]
fn encode_unsigned() {
    assert_eq!(encode_once(|b| encode_u8(b, 32)), [0x08, 32]);
    assert_eq!(encode_once(|b| encode_u16(b, 1024)), [0x09, 0x04, 0x00]);
    assert_eq!(
        encode_once(|b| encode_u32(b, 4294967290)),
        [0x0a, 0xff, 0xff, 0xff, 0xfa]
    );
    assert_eq!(
        encode_once(|b| encode_u64(b, 18446744073709551610)),
        [0x0b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfa]
    );
}

#[test]
fn encode_signed_is_twos_complement() {
    assert_eq!(encode_once(|b| encode_i32(b, -1)), [0x0c, 0xff, 0xff, 0xff, 0xff]);
    assert_eq!(
        encode_once(|b| encode_i32(b, i32::MIN)),
        [0x0c, 0x80, 0x00, 0x00, 0x00]
    );
    assert_eq!(
        encode_once(|b| encode_i64(b, i64::MIN)),
        [0x0d, 0x80, 0, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(encode_once(|b| encode_i64(b, 1)), [0x0d, 0, 0, 0, 0, 0, 0, 0, 1]);
}

#[test]
fn encode_floats() {
    assert_eq!(encode_once(|b| encode_f32(b, 1.0)), [0x0e, 0x3f, 0x80, 0x00, 0x00]);
    assert_eq!(
        encode_once(|b| encode_f64(b, -2.5)),
        [0x0f, 0xc0, 0x04, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn encode_length_prefixed() {
    assert_eq!(
        encode_once(|b| encode_string(b, "hi")),
        [0x05, 0x0a, 0, 0, 0, 2, b'h', b'i']
    );
    assert_eq!(
        encode_once(|b| encode_bytes(b, &[1, 2, 3])),
        [0x04, 0x0a, 0, 0, 0, 3, 1, 2, 3]
    );
    assert_eq!(encode_once(|b| encode_string(b, "")), [0x05, 0x0a, 0, 0, 0, 0]);
}

#[test]
fn encode_error_nests_a_string() {
    let err = crate::RemoteError::new("boom");
    assert_eq!(
        encode_once(|b| encode_error(b, &err)),
        [0x06, 0x05, 0x0a, 0, 0, 0, 4, b'b', b'o', b'o', b'm']
    );
}

#[test]
fn encode_composite_headers() {
    assert_eq!(
        encode_once(|b| encode_array(b, 3, Kind::String)),
        [0x01, 0x05, 0x0a, 0, 0, 0, 3]
    );
    assert_eq!(
        encode_once(|b| encode_map(b, 2, Kind::String, Kind::Any)),
        [0x02, 0x05, 0x03, 0x0a, 0, 0, 0, 2]
    );
}

#[test]
fn encode_appends_to_existing_bytes() {
    let prefix = vec![0xaa, 0xbb];
    let buf = encode_u16(prefix.clone(), 7);
    assert_eq!(&buf[..2], prefix.as_slice());
    assert_eq!(&buf[2..], &[0x09, 0x00, 0x07]);
}

#[test]
fn wire_len_accepts_u32_range() {
    assert_eq!(wire_len(0), 0);
    assert_eq!(wire_len(3), 3);
    assert_eq!(wire_len(u32::MAX as usize), u32::MAX);
}

#[cfg(target_pointer_width = "64")]
#[test]
#[should_panic(expected = "exceeds the u32 limit")]
fn wire_len_refuses_to_truncate() {
    wire_len(u32::MAX as usize + 1);
}
