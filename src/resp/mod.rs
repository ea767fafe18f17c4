/**
 * RESP - Redis Serialisation Protocol
 * https://redis.io/docs/reference/protocol-spec/
 */

pub mod value;
pub mod encoder;
pub mod decoder;
pub mod error;

pub use decoder::RESPDecoder;
pub use encoder::{encode, encode_into, RESPEncoder};
pub use error::{InvalidText, ProtocolError, RESPError};
pub use value::{RESPValue, SimpleText};
