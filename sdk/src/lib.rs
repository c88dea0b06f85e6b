//! polyglot
//!
//! This crate is the runtime that generated code links against.
//!
//! - the codec (`encode_*` / `decode_*`, `Kind`, `Decoded`) re-exported from
//!   `polyglot-codec`
//! - the `Message` trait implemented by generated types
//! - a schema-less `Value` reader, and `decode_to_json` for inspecting streams

pub mod value;

pub use polyglot_codec::*;
pub use value::{decode_all, Value};

/// Decode a stream of tagged values into a pretty-printed JSON array.
pub fn decode_to_json(buffer: &[u8]) -> Result<String, DecodeError> {
    let values = decode_all(buffer)?;
    let json = serde_json::Value::Array(values.iter().map(Value::to_json).collect());
    Ok(format!("{:#}", json))
}

pub mod traits {
    pub use polyglot_codec::traits::Message;
}

pub mod error {
    pub use polyglot_codec::error::{DecodeError, RemoteError, UnknownKind};
}

#[test]
fn decode_to_json_renders_every_value() {
    let buf = encode_string(Vec::new(), "Ann");
    let buf = encode_u32(buf, 30);
    let json = decode_to_json(&buf).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, serde_json::json!(["Ann", 30]));
}
