//! This is the runtime half of Polyglot: a self-describing binary format in
//! which every value is prefixed by a one-byte [Kind] tag followed by a
//! fixed-width, big-endian payload.
//!
//! Encoders take a buffer by value and hand back the longer buffer. Decoders
//! borrow their input and return the decoded value together with the bytes
//! that were not consumed.
//!
//! ```
//! use polyglot_codec::*;
//!
//! let buf = encode_string(Vec::new(), "Ann");
//! let buf = encode_u32(buf, 30);
//! assert_eq!(buf, [0x05, 0x0a, 0, 0, 0, 3, b'A', b'n', b'n', 0x0a, 0, 0, 0, 30]);
//!
//! let name = decode_string(&buf).unwrap();
//! let age = decode_u32(name.remainder).unwrap();
//! assert_eq!((name.value.as_str(), age.value), ("Ann", 30));
//! assert!(age.remainder.is_empty());
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod kind;
pub mod traits;

pub use decoder::*;
pub use encoder::*;
pub use error::{DecodeError, RemoteError, UnknownKind};
pub use kind::Kind;
pub use traits::Message;

/// The result of a successful decode: the value plus the unconsumed suffix of
/// the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded<'a, T> {
    pub value:     T,
    pub remainder: &'a [u8],
}

impl<'a, T> Decoded<'a, T> {
    pub fn new(value: T, remainder: &'a [u8]) -> Self {
        Decoded { value, remainder }
    }

    /// Transforms the decoded value, keeping the remainder.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<'a, U> {
        Decoded {
            value:     f(self.value),
            remainder: self.remainder,
        }
    }
}
