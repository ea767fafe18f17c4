//! Streaming codec for the Redis Serialisation Protocol (RESP2),
//! with a small tokio server that drives one decoder/encoder pair per connection

pub mod config;
pub mod resp;
pub mod server;

pub use config::{AcceptedTypes, Config, DecoderConfig};
pub use resp::{encode, ProtocolError, RESPDecoder, RESPEncoder, RESPError, RESPValue, SimpleText};
