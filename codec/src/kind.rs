use std::fmt;

use crate::error::UnknownKind;

/// The closed set of wire-format type tags.
///
/// Byte values are part of the wire contract and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    None   = 0x00,
    Array  = 0x01,
    Map    = 0x02,
    Any    = 0x03,
    Bytes  = 0x04,
    String = 0x05,
    Error  = 0x06,
    Bool   = 0x07,
    U8     = 0x08,
    U16    = 0x09,
    U32    = 0x0a,
    U64    = 0x0b,
    I32    = 0x0c,
    I64    = 0x0d,
    F32    = 0x0e,
    F64    = 0x0f,
}

impl Kind {
    /// Every kind, in tag order.
    pub const ALL: [Kind; 16] = [
        Kind::None,
        Kind::Array,
        Kind::Map,
        Kind::Any,
        Kind::Bytes,
        Kind::String,
        Kind::Error,
        Kind::Bool,
        Kind::U8,
        Kind::U16,
        Kind::U32,
        Kind::U64,
        Kind::I32,
        Kind::I64,
        Kind::F32,
        Kind::F64,
    ];

    /// Looks up the kind carried by a tag byte.
    pub fn from_byte(byte: u8) -> Option<Kind> {
        match byte {
            0x00 => Some(Kind::None),
            0x01 => Some(Kind::Array),
            0x02 => Some(Kind::Map),
            0x03 => Some(Kind::Any),
            0x04 => Some(Kind::Bytes),
            0x05 => Some(Kind::String),
            0x06 => Some(Kind::Error),
            0x07 => Some(Kind::Bool),
            0x08 => Some(Kind::U8),
            0x09 => Some(Kind::U16),
            0x0a => Some(Kind::U32),
            0x0b => Some(Kind::U64),
            0x0c => Some(Kind::I32),
            0x0d => Some(Kind::I64),
            0x0e => Some(Kind::F32),
            0x0f => Some(Kind::F64),
            _ => None,
        }
    }

    /// Membership test used by every composite decoder to reject malformed
    /// headers.
    pub fn is_valid(byte: u8) -> bool {
        Kind::from_byte(byte).is_some()
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// The registry name of this kind. It matches the variant identifier, so
    /// generated code can spell `Kind::<name>` directly.
    pub fn name(self) -> &'static str {
        match self {
            Kind::None => "None",
            Kind::Array => "Array",
            Kind::Map => "Map",
            Kind::Any => "Any",
            Kind::Bytes => "Bytes",
            Kind::String => "String",
            Kind::Error => "Error",
            Kind::Bool => "Bool",
            Kind::U8 => "U8",
            Kind::U16 => "U16",
            Kind::U32 => "U32",
            Kind::U64 => "U64",
            Kind::I32 => "I32",
            Kind::I64 => "I64",
            Kind::F32 => "F32",
            Kind::F64 => "F64",
        }
    }

    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for Kind {
    type Error = UnknownKind;

    fn try_from(byte: u8) -> Result<Self, UnknownKind> {
        Kind::from_byte(byte).ok_or(UnknownKind(byte))
    }
}

#[test]
fn tags_are_distinct_and_round_trip() {
    for (index, kind) in Kind::ALL.into_iter().enumerate() {
        assert_eq!(kind.as_byte() as usize, index);
        assert_eq!(Kind::from_byte(kind.as_byte()), Some(kind));
        assert_eq!(Kind::try_from(kind.as_byte()), Ok(kind));
    }
}

#[test]
fn rejects_unregistered_bytes() {
    assert!(Kind::is_valid(0x00));
    assert!(Kind::is_valid(0x0f));
    assert!(!Kind::is_valid(0x10));
    assert!(!Kind::is_valid(0xff));
    assert_eq!(Kind::try_from(0x42), Err(UnknownKind(0x42)));
}

#[test]
fn names_round_trip() {
    for kind in Kind::ALL {
        assert_eq!(Kind::from_name(kind.name()), Some(kind));
        assert_eq!(kind.to_string(), kind.name());
    }
    assert_eq!(Kind::from_name("u32"), None);
    assert_eq!(Kind::from_name("Uint32"), None);
}
