use polyglot_codec::{
    decode_array_header, decode_bool, decode_bytes, decode_error, decode_f32, decode_f64,
    decode_i32, decode_i64, decode_map_header, decode_string, decode_u16, decode_u32, decode_u64,
    decode_u8, encode_any, encode_array, encode_bool, encode_bytes, encode_error, encode_f32,
    encode_f64, encode_i32, encode_i64, encode_map, encode_none, encode_string, encode_u16,
    encode_u32, encode_u64, encode_u8, wire_len, DecodeError, Decoded, Kind, RemoteError,
};
use serde_json::{Map as JsonMap, Number, Value as Json};

/// Nesting limit for arrays and maps read without a schema.
pub const MAX_DEPTH: usize = 64;

/// This type holds dynamic Polyglot data.
///
/// Every value on the wire carries its own tag, so a stream of scalars, arrays
/// of scalars and maps of scalars can be read back without knowing the schema
/// that produced it. Arrays and maps of messages (element kind `Any`) cannot:
/// a message is a run of several values and nothing on the wire says how many.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Any,
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    String(String),
    Error(RemoteError),
    Array {
        element: Kind,
        items:   Vec<Value>,
    },
    Map {
        key:     Kind,
        value:   Kind,
        entries: Vec<(Value, Value)>,
    },
}

impl Value {
    /// The wire kind this value is written as.
    pub fn kind(&self) -> Kind {
        match self {
            Value::None => Kind::None,
            Value::Any => Kind::Any,
            Value::Bool(_) => Kind::Bool,
            Value::U8(_) => Kind::U8,
            Value::U16(_) => Kind::U16,
            Value::U32(_) => Kind::U32,
            Value::U64(_) => Kind::U64,
            Value::I32(_) => Kind::I32,
            Value::I64(_) => Kind::I64,
            Value::F32(_) => Kind::F32,
            Value::F64(_) => Kind::F64,
            Value::Bytes(_) => Kind::Bytes,
            Value::String(_) => Kind::String,
            Value::Error(_) => Kind::Error,
            Value::Array { .. } => Kind::Array,
            Value::Map { .. } => Kind::Map,
        }
    }

    /// Decodes one tagged value from the front of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Decoded<'_, Value>, DecodeError> {
        Value::decode_nested(buf, 0)
    }

    fn decode_nested(buf: &[u8], depth: usize) -> Result<Decoded<'_, Value>, DecodeError> {
        let tag = *buf.first().ok_or(DecodeError::UnexpectedEnd)?;
        let kind = Kind::from_byte(tag).ok_or(DecodeError::UnknownKind(tag))?;

        match kind {
            Kind::None => Ok(Decoded::new(Value::None, &buf[1..])),
            Kind::Any => Ok(Decoded::new(Value::Any, &buf[1..])),
            Kind::Bool => Ok(decode_bool(buf)?.map(Value::Bool)),
            Kind::U8 => Ok(decode_u8(buf)?.map(Value::U8)),
            Kind::U16 => Ok(decode_u16(buf)?.map(Value::U16)),
            Kind::U32 => Ok(decode_u32(buf)?.map(Value::U32)),
            Kind::U64 => Ok(decode_u64(buf)?.map(Value::U64)),
            Kind::I32 => Ok(decode_i32(buf)?.map(Value::I32)),
            Kind::I64 => Ok(decode_i64(buf)?.map(Value::I64)),
            Kind::F32 => Ok(decode_f32(buf)?.map(Value::F32)),
            Kind::F64 => Ok(decode_f64(buf)?.map(Value::F64)),
            Kind::Bytes => Ok(decode_bytes(buf)?.map(Value::Bytes)),
            Kind::String => Ok(decode_string(buf)?.map(Value::String)),
            Kind::Error => Ok(decode_error(buf)?.map(Value::Error)),
            Kind::Array => {
                let err = DecodeError::InvalidArray;
                if depth >= MAX_DEPTH {
                    return Err(err);
                }
                let header = decode_array_header(buf)?;
                let element = header.value.element;
                if element == Kind::Any {
                    return Err(DecodeError::SchemaRequired(Kind::Any));
                }

                let mut items = Vec::new();
                let mut remainder = header.remainder;
                for _ in 0..header.value.size {
                    let item = Value::decode_expecting(remainder, element, depth + 1, err)?;
                    remainder = item.remainder;
                    items.push(item.value);
                }
                Ok(Decoded::new(Value::Array { element, items }, remainder))
            }
            Kind::Map => {
                let err = DecodeError::InvalidMap;
                if depth >= MAX_DEPTH {
                    return Err(err);
                }
                let header = decode_map_header(buf)?;
                let (key, value) = (header.value.key, header.value.value);
                if key == Kind::Any || value == Kind::Any {
                    return Err(DecodeError::SchemaRequired(Kind::Any));
                }

                let mut entries = Vec::new();
                let mut remainder = header.remainder;
                for _ in 0..header.value.size {
                    let k = Value::decode_expecting(remainder, key, depth + 1, err)?;
                    let v = Value::decode_expecting(k.remainder, value, depth + 1, err)?;
                    remainder = v.remainder;
                    entries.push((k.value, v.value));
                }
                Ok(Decoded::new(Value::Map { key, value, entries }, remainder))
            }
        }
    }

    /// Decodes a composite element, which must carry the kind announced by
    /// the composite's header.
    fn decode_expecting(
        buf: &[u8],
        kind: Kind,
        depth: usize,
        err: DecodeError,
    ) -> Result<Decoded<'_, Value>, DecodeError> {
        if buf.first() != Some(&kind.as_byte()) {
            return Err(err);
        }
        Value::decode_nested(buf, depth)
    }

    /// Encodes this value onto the end of `buf`.
    pub fn encode(&self, buf: Vec<u8>) -> Vec<u8> {
        match self {
            Value::None => encode_none(buf),
            Value::Any => encode_any(buf),
            Value::Bool(v) => encode_bool(buf, *v),
            Value::U8(v) => encode_u8(buf, *v),
            Value::U16(v) => encode_u16(buf, *v),
            Value::U32(v) => encode_u32(buf, *v),
            Value::U64(v) => encode_u64(buf, *v),
            Value::I32(v) => encode_i32(buf, *v),
            Value::I64(v) => encode_i64(buf, *v),
            Value::F32(v) => encode_f32(buf, *v),
            Value::F64(v) => encode_f64(buf, *v),
            Value::Bytes(v) => encode_bytes(buf, v),
            Value::String(v) => encode_string(buf, v),
            Value::Error(v) => encode_error(buf, v),
            Value::Array { element, items } => items.iter().fold(
                encode_array(buf, wire_len(items.len()), *element),
                |buf, item| item.encode(buf),
            ),
            Value::Map {
                key,
                value,
                entries,
            } => entries.iter().fold(
                encode_map(buf, wire_len(entries.len()), *key, *value),
                |buf, (k, v)| v.encode(k.encode(buf)),
            ),
        }
    }

    /// Renders this value as JSON. Maps keyed by strings become objects, any
    /// other map becomes a list of `[key, value]` pairs. Non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::None | Value::Any => Json::Null,
            Value::Bool(v) => Json::Bool(*v),
            Value::U8(v) => Json::from(*v),
            Value::U16(v) => Json::from(*v),
            Value::U32(v) => Json::from(*v),
            Value::U64(v) => Json::from(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::F32(v) => Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
            Value::F64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Value::Bytes(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
            Value::String(v) => Json::String(v.clone()),
            Value::Error(v) => {
                let mut object = JsonMap::new();
                object.insert("error".to_owned(), Json::String(v.message.clone()));
                Json::Object(object)
            }
            Value::Array { items, .. } => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map { key, entries, .. } if *key == Kind::String => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| match k {
                        Value::String(k) => (k.clone(), v.to_json()),
                        other => (other.to_json().to_string(), v.to_json()),
                    })
                    .collect(),
            ),
            Value::Map { entries, .. } => Json::Array(
                entries
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect(),
            ),
        }
    }
}

/// Decodes tagged values until `buf` is exhausted.
pub fn decode_all(buf: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let mut values = Vec::new();
    let mut remainder = buf;
    while !remainder.is_empty() {
        let decoded = Value::decode(remainder)?;
        values.push(decoded.value);
        remainder = decoded.remainder;
    }
    Ok(values)
}

#[test]
fn decode_mixed_stream() {
    let buf = encode_string(Vec::new(), "Ann");
    let buf = encode_u32(buf, 30);
    let buf = encode_none(buf);
    let buf = encode_array(buf, 2, Kind::I64);
    let buf = encode_i64(buf, -1);
    let buf = encode_i64(buf, 1);

    assert_eq!(
        decode_all(&buf),
        Ok(vec![
            Value::String("Ann".to_owned()),
            Value::U32(30),
            Value::None,
            Value::Array {
                element: Kind::I64,
                items:   vec![Value::I64(-1), Value::I64(1)],
            },
        ])
    );
}

#[test]
fn value_encode_is_inverse_of_decode() {
    let value = Value::Map {
        key:     Kind::String,
        value:   Kind::Array,
        entries: vec![(
            Value::String("flags".to_owned()),
            Value::Array {
                element: Kind::Bool,
                items:   vec![Value::Bool(true), Value::Bool(false)],
            },
        )],
    };
    let buf = value.encode(Vec::new());
    let decoded = Value::decode(&buf).unwrap();
    assert_eq!(decoded.value, value);
    assert!(decoded.remainder.is_empty());
}

#[test]
fn composites_of_messages_need_a_schema() {
    let buf = encode_array(Vec::new(), 1, Kind::Any);
    assert_eq!(
        Value::decode(&buf),
        Err(DecodeError::SchemaRequired(Kind::Any))
    );
}

#[test]
fn element_kind_must_match_header() {
    let buf = encode_array(Vec::new(), 1, Kind::U32);
    let buf = encode_u8(buf, 1);
    assert_eq!(Value::decode(&buf), Err(DecodeError::InvalidArray));

    let buf = encode_map(Vec::new(), 1, Kind::String, Kind::U32);
    let buf = encode_string(buf, "k");
    let buf = encode_u16(buf, 1);
    assert_eq!(Value::decode(&buf), Err(DecodeError::InvalidMap));
}

#[test]
fn unknown_and_missing_tags() {
    assert_eq!(Value::decode(&[]), Err(DecodeError::UnexpectedEnd));
    assert_eq!(Value::decode(&[0x77]), Err(DecodeError::UnknownKind(0x77)));
}

#[test]
fn nesting_is_bounded() {
    let mut buf = Vec::new();
    for _ in 0..=MAX_DEPTH {
        buf = encode_array(buf, 1, Kind::Array);
    }
    assert_eq!(Value::decode(&buf), Err(DecodeError::InvalidArray));
}

#[test]
fn json_rendering() {
    let value = Value::Map {
        key:     Kind::String,
        value:   Kind::F64,
        entries: vec![
            (Value::String("pi".to_owned()), Value::F64(3.5)),
            (Value::String("nan".to_owned()), Value::F64(f64::NAN)),
        ],
    };
    assert_eq!(value.to_json().to_string(), r#"{"pi":3.5,"nan":null}"#);
    assert_eq!(
        Value::Error(RemoteError::new("boom")).to_json().to_string(),
        r#"{"error":"boom"}"#
    );
    assert_eq!(Value::Bytes(vec![1, 2]).to_json().to_string(), "[1,2]");
}
