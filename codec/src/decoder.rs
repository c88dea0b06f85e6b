//! Decoders. Each one checks the leading tag, reads the payload and returns
//! the value with the unread remainder. The input slice is never modified, so
//! a failed decode leaves the caller's view of the buffer intact.

use crate::{
    encoder::{BOOL_FALSE, BOOL_TRUE},
    error::{DecodeError, RemoteError},
    kind::Kind,
    Decoded,
};

/// Header of an array: the element kind and the number of elements that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayHeader {
    pub element: Kind,
    pub size:    u32,
}

/// Header of a map: the key and value kinds and the number of entries that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub key:   Kind,
    pub value: Kind,
    pub size:  u32,
}

fn expect_tag(buf: &[u8], kind: Kind, err: DecodeError) -> Result<&[u8], DecodeError> {
    match buf.split_first() {
        Some((&tag, rest)) if tag == kind.as_byte() => Ok(rest),
        _ => Err(err),
    }
}

fn fixed<const N: usize>(
    buf: &[u8],
    kind: Kind,
    err: DecodeError,
) -> Result<([u8; N], &[u8]), DecodeError> {
    let rest = expect_tag(buf, kind, err)?;
    match rest.split_first_chunk::<N>() {
        Some((payload, remainder)) => Ok((*payload, remainder)),
        None => Err(err),
    }
}

/// Reads a `U32` length followed by that many bytes.
fn sized(buf: &[u8], kind: Kind, err: DecodeError) -> Result<Decoded<'_, &[u8]>, DecodeError> {
    let rest = expect_tag(buf, kind, err)?;
    let len = decode_u32(rest).map_err(|_| err)?;
    let len_usize = usize::try_from(len.value).map_err(|_| err)?;
    if len.remainder.len() < len_usize {
        return Err(err);
    }
    let (body, remainder) = len.remainder.split_at(len_usize);
    Ok(Decoded::new(body, remainder))
}

/// Probe for the `None` sentinel. Never fails: returns `true` with the tag
/// consumed when the buffer starts with `None`, otherwise `false` with the
/// buffer unchanged.
pub fn decode_none(buf: &[u8]) -> Decoded<'_, bool> {
    match buf.split_first() {
        Some((&tag, rest)) if tag == Kind::None.as_byte() => Decoded::new(true, rest),
        _ => Decoded::new(false, buf),
    }
}

/// Probe for the `Any` sentinel, with the same contract as [decode_none].
pub fn decode_any(buf: &[u8]) -> Decoded<'_, bool> {
    match buf.split_first() {
        Some((&tag, rest)) if tag == Kind::Any.as_byte() => Decoded::new(true, rest),
        _ => Decoded::new(false, buf),
    }
}

pub fn decode_bool(buf: &[u8]) -> Result<Decoded<'_, bool>, DecodeError> {
    let ([byte], remainder) = fixed::<1>(buf, Kind::Bool, DecodeError::InvalidBool)?;
    match byte {
        BOOL_TRUE => Ok(Decoded::new(true, remainder)),
        BOOL_FALSE => Ok(Decoded::new(false, remainder)),
        _ => Err(DecodeError::InvalidBool),
    }
}

pub fn decode_u8(buf: &[u8]) -> Result<Decoded<'_, u8>, DecodeError> {
    let ([byte], remainder) = fixed::<1>(buf, Kind::U8, DecodeError::InvalidU8)?;
    Ok(Decoded::new(byte, remainder))
}

pub fn decode_u16(buf: &[u8]) -> Result<Decoded<'_, u16>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::U16, DecodeError::InvalidU16)?;
    Ok(Decoded::new(u16::from_be_bytes(payload), remainder))
}

pub fn decode_u32(buf: &[u8]) -> Result<Decoded<'_, u32>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::U32, DecodeError::InvalidU32)?;
    Ok(Decoded::new(u32::from_be_bytes(payload), remainder))
}

pub fn decode_u64(buf: &[u8]) -> Result<Decoded<'_, u64>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::U64, DecodeError::InvalidU64)?;
    Ok(Decoded::new(u64::from_be_bytes(payload), remainder))
}

pub fn decode_i32(buf: &[u8]) -> Result<Decoded<'_, i32>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::I32, DecodeError::InvalidI32)?;
    Ok(Decoded::new(i32::from_be_bytes(payload), remainder))
}

pub fn decode_i64(buf: &[u8]) -> Result<Decoded<'_, i64>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::I64, DecodeError::InvalidI64)?;
    Ok(Decoded::new(i64::from_be_bytes(payload), remainder))
}

pub fn decode_f32(buf: &[u8]) -> Result<Decoded<'_, f32>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::F32, DecodeError::InvalidF32)?;
    Ok(Decoded::new(f32::from_bits(u32::from_be_bytes(payload)), remainder))
}

pub fn decode_f64(buf: &[u8]) -> Result<Decoded<'_, f64>, DecodeError> {
    let (payload, remainder) = fixed(buf, Kind::F64, DecodeError::InvalidF64)?;
    Ok(Decoded::new(f64::from_bits(u64::from_be_bytes(payload)), remainder))
}

pub fn decode_bytes(buf: &[u8]) -> Result<Decoded<'_, Vec<u8>>, DecodeError> {
    Ok(sized(buf, Kind::Bytes, DecodeError::InvalidBytes)?.map(<[u8]>::to_vec))
}

/// Read a string. The body must be valid UTF-8.
pub fn decode_string(buf: &[u8]) -> Result<Decoded<'_, String>, DecodeError> {
    let body = sized(buf, Kind::String, DecodeError::InvalidString)?;
    let text = std::str::from_utf8(body.value).map_err(|_| DecodeError::InvalidString)?;
    Ok(Decoded::new(text.to_owned(), body.remainder))
}

/// Read an error value: the `Error` tag followed by a `String`. Any problem
/// with the nested string is reported as [DecodeError::InvalidError].
pub fn decode_error(buf: &[u8]) -> Result<Decoded<'_, RemoteError>, DecodeError> {
    let rest = expect_tag(buf, Kind::Error, DecodeError::InvalidError)?;
    let message = decode_string(rest).map_err(|_| DecodeError::InvalidError)?;
    Ok(message.map(RemoteError::new))
}

/// Read an array header, validating the element kind against the registry.
pub fn decode_array_header(buf: &[u8]) -> Result<Decoded<'_, ArrayHeader>, DecodeError> {
    let err = DecodeError::InvalidArray;
    let rest = expect_tag(buf, Kind::Array, err)?;
    let (&element, rest) = rest.split_first().ok_or(err)?;
    let element = Kind::from_byte(element).ok_or(err)?;
    let size = decode_u32(rest).map_err(|_| err)?;
    Ok(size.map(|size| ArrayHeader { element, size }))
}

/// Read an array header and return the element count. The caller decodes
/// exactly that many elements next.
pub fn decode_array(buf: &[u8]) -> Result<Decoded<'_, u32>, DecodeError> {
    Ok(decode_array_header(buf)?.map(|header| header.size))
}

/// Read a map header, validating both the key and the value kind.
pub fn decode_map_header(buf: &[u8]) -> Result<Decoded<'_, MapHeader>, DecodeError> {
    let err = DecodeError::InvalidMap;
    let rest = expect_tag(buf, Kind::Map, err)?;
    let ([key, value], rest) = match rest.split_first_chunk::<2>() {
        Some((descriptors, rest)) => (*descriptors, rest),
        None => return Err(err),
    };
    let key = Kind::from_byte(key).ok_or(err)?;
    let value = Kind::from_byte(value).ok_or(err)?;
    let size = decode_u32(rest).map_err(|_| err)?;
    Ok(size.map(|size| MapHeader { key, value, size }))
}

/// Read a map header and return the entry count. The caller decodes exactly
/// that many key, value pairs next.
pub fn decode_map(buf: &[u8]) -> Result<Decoded<'_, u32>, DecodeError> {
    Ok(decode_map_header(buf)?.map(|header| header.size))
}

#[cfg(test)]
use crate::encoder::*;

#[test]
fn decode_none_probe() {
    assert_eq!(decode_none(&[]), Decoded::new(false, &[][..]));
    assert_eq!(decode_none(&[0x07, 1]), Decoded::new(false, &[0x07, 1][..]));
    assert_eq!(decode_none(&[0x00, 0x07]), Decoded::new(true, &[0x07][..]));
    assert_eq!(decode_any(&[0x03]), Decoded::new(true, &[][..]));
    assert_eq!(decode_any(&[0x00]), Decoded::new(false, &[0x00][..]));
}

#[test]
fn decode_bool_values() {
    assert_eq!(decode_bool(&[0x07, 1]), Ok(Decoded::new(true, &[][..])));
    assert_eq!(decode_bool(&[0x07, 0]), Ok(Decoded::new(false, &[][..])));
    assert_eq!(decode_bool(&[0x07, 2]), Err(DecodeError::InvalidBool));
    assert_eq!(decode_bool(&[0x07]), Err(DecodeError::InvalidBool));
    assert_eq!(decode_bool(&[]), Err(DecodeError::InvalidBool));
    assert_eq!(decode_bool(&[0x08, 1]), Err(DecodeError::InvalidBool));
}

#[test]
fn decode_numbers() {
    let buf = encode_u16(Vec::new(), 1024);
    assert_eq!(decode_u16(&buf), Ok(Decoded::new(1024, &[][..])));

    let buf = encode_u64(Vec::new(), u64::MAX);
    assert_eq!(decode_u64(&buf).map(|d| d.value), Ok(u64::MAX));

    let buf = encode_i64(Vec::new(), i64::MIN);
    assert_eq!(decode_i64(&buf).map(|d| d.value), Ok(i64::MIN));

    let buf = encode_f64(Vec::new(), -922337203685.2345);
    assert_eq!(decode_f64(&buf).map(|d| d.value), Ok(-922337203685.2345));

    let buf = encode_f32(Vec::new(), f32::NAN);
    assert!(decode_f32(&buf).map(|d| d.value.is_nan()).unwrap_or(false));
}

#[test]
fn decode_wrong_tag_is_kind_specific() {
    let buf = encode_string(Vec::new(), "x");
    assert_eq!(decode_u8(&buf), Err(DecodeError::InvalidU8));
    assert_eq!(decode_u16(&buf), Err(DecodeError::InvalidU16));
    assert_eq!(decode_u32(&buf), Err(DecodeError::InvalidU32));
    assert_eq!(decode_u64(&buf), Err(DecodeError::InvalidU64));
    assert_eq!(decode_i32(&buf), Err(DecodeError::InvalidI32));
    assert_eq!(decode_i64(&buf), Err(DecodeError::InvalidI64));
    assert_eq!(decode_f32(&buf), Err(DecodeError::InvalidF32));
    assert_eq!(decode_f64(&buf), Err(DecodeError::InvalidF64));
    assert_eq!(decode_bytes(&buf), Err(DecodeError::InvalidBytes));
    assert_eq!(decode_error(&buf), Err(DecodeError::InvalidError));
    assert_eq!(decode_array(&buf), Err(DecodeError::InvalidArray));
    assert_eq!(decode_map(&buf), Err(DecodeError::InvalidMap));

    let buf = encode_bytes(Vec::new(), b"x");
    assert_eq!(decode_string(&buf), Err(DecodeError::InvalidString));
}

#[test]
fn decode_truncated_payloads() {
    assert_eq!(decode_u32(&[0x0a, 0, 0, 0]), Err(DecodeError::InvalidU32));
    assert_eq!(decode_i64(&[0x0d, 0xff]), Err(DecodeError::InvalidI64));
    assert_eq!(
        decode_string(&[0x05, 0x0a, 0, 0, 0, 4, b'a']),
        Err(DecodeError::InvalidString)
    );
    assert_eq!(decode_bytes(&[0x04, 0x0a, 0, 0]), Err(DecodeError::InvalidBytes));
}

#[test]
fn decode_string_and_bytes() {
    let buf = encode_string(Vec::new(), "🍕");
    let buf = encode_bytes(buf, &[0, 255]);
    let text = decode_string(&buf).unwrap();
    assert_eq!(text.value, "🍕");
    let bytes = decode_bytes(text.remainder).unwrap();
    assert_eq!(bytes.value, vec![0, 255]);
    assert!(bytes.remainder.is_empty());

    assert_eq!(
        decode_string(&[0x05, 0x0a, 0, 0, 0, 2, 0xc3, 0x28]),
        Err(DecodeError::InvalidString)
    );
}

#[test]
fn decode_error_message_only() {
    let source = std::io::Error::new(std::io::ErrorKind::Other, "Test String");
    let buf = encode_error(Vec::new(), &source);
    let decoded = decode_error(&buf).unwrap();
    assert_eq!(decoded.value, RemoteError::new("Test String"));
    assert!(decoded.remainder.is_empty());

    let mut missing_string_kind = buf.clone();
    missing_string_kind[1] = 0xee;
    assert_eq!(decode_error(&missing_string_kind), Err(DecodeError::InvalidError));
}

#[test]
fn decode_array_of_strings() {
    let expected = ["1", "2", "3"];
    let mut buf = encode_array(Vec::new(), expected.len() as u32, Kind::String);
    for element in expected {
        buf = encode_string(buf, element);
    }

    let header = decode_array(&buf).unwrap();
    assert_eq!(header.value, 3);
    let mut remainder = header.remainder;
    for element in expected {
        let decoded = decode_string(remainder).unwrap();
        assert_eq!(decoded.value, element);
        remainder = decoded.remainder;
    }
    assert!(remainder.is_empty());
    assert_eq!(decode_array(remainder), Err(DecodeError::InvalidArray));
}

#[test]
fn decode_array_rejects_unknown_element_kind() {
    assert_eq!(
        decode_array(&[0x01, 0x42, 0x0a, 0, 0, 0, 0]),
        Err(DecodeError::InvalidArray)
    );
    assert_eq!(decode_array(&[0x01, 0x05, 0x09, 0, 0]), Err(DecodeError::InvalidArray));
    assert_eq!(
        decode_array_header(&encode_array(Vec::new(), 7, Kind::Any)),
        Ok(Decoded::new(
            ArrayHeader {
                element: Kind::Any,
                size:    7,
            },
            &[][..]
        ))
    );
}

#[test]
fn decode_map_validates_both_descriptors() {
    let mut buf = encode_map(Vec::new(), 1, Kind::String, Kind::U32);
    buf = encode_string(buf, "a");
    buf = encode_u32(buf, 1);

    let header = decode_map_header(&buf).unwrap();
    assert_eq!(header.value.key, Kind::String);
    assert_eq!(header.value.value, Kind::U32);
    assert_eq!(header.value.size, 1);

    assert_eq!(
        decode_map(&[0x02, 0x42, 0x0a, 0x0a, 0, 0, 0, 0]),
        Err(DecodeError::InvalidMap)
    );
    assert_eq!(
        decode_map(&[0x02, 0x05, 0x42, 0x0a, 0, 0, 0, 0]),
        Err(DecodeError::InvalidMap)
    );
    assert_eq!(decode_map(&[0x02, 0x05]), Err(DecodeError::InvalidMap));
}
