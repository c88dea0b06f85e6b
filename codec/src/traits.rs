use crate::{error::DecodeError, Decoded};

/// Implemented by every generated message type.
///
/// The wire form of a message is just its fields, in ascending field-id order,
/// each written with its own tag. There is no message header, so `decode` must
/// read the fields back in exactly the order `encode` wrote them.
pub trait Message: Sized {
    fn encode(&self, buf: Vec<u8>) -> Vec<u8>;

    fn decode(buf: &[u8]) -> Result<Decoded<'_, Self>, DecodeError>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        self.encode(Vec::new())
    }
}
