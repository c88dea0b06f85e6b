use thiserror::Error;

use crate::kind::Kind;

/// Raised when a decode call finds a tag, descriptor or payload that does not
/// match the kind it was asked to read. Each kind has its own variant so that
/// callers can match on what they expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid bool")]
    InvalidBool,

    #[error("invalid u8")]
    InvalidU8,

    #[error("invalid u16")]
    InvalidU16,

    #[error("invalid u32")]
    InvalidU32,

    #[error("invalid u64")]
    InvalidU64,

    #[error("invalid i32")]
    InvalidI32,

    #[error("invalid i64")]
    InvalidI64,

    #[error("invalid f32")]
    InvalidF32,

    #[error("invalid f64")]
    InvalidF64,

    #[error("invalid bytes")]
    InvalidBytes,

    #[error("invalid string")]
    InvalidString,

    #[error("invalid error")]
    InvalidError,

    #[error("invalid array")]
    InvalidArray,

    #[error("invalid map")]
    InvalidMap,

    /// A `U8` enum index with no matching member.
    #[error("invalid enum index {0}")]
    InvalidEnum(u8),

    /// The buffer ended where a tagged value was expected.
    #[error("unexpected end of buffer")]
    UnexpectedEnd,

    /// A leading tag outside the kind registry, found by a reader that
    /// dispatches on the tag instead of expecting one kind.
    #[error("unknown kind tag {0:#04x}")]
    UnknownKind(u8),

    /// A composite whose elements are `Any` can only be read with a schema.
    #[error("values of kind {0} cannot be decoded without a schema")]
    SchemaRequired(Kind),
}

/// A tag byte outside the kind registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown kind tag {0:#04x}")]
pub struct UnknownKind(pub u8);

/// The decoded form of an `Error` value. Only the message text crosses the
/// wire; the original error type and any backtrace are gone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        RemoteError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
