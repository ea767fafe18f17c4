use std::io::Result;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::value::RESPValue;

pub const CRLF: &[u8] = b"\r\n";

/**
 * Serialises a value into a fresh buffer
 */
pub fn encode(value: &RESPValue) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(value));
    encode_into(value, &mut buf);
    buf.freeze()
}

/**
 * Appends the wire form of a value to `buf`
 */
pub fn encode_into(value: &RESPValue, buf: &mut BytesMut) {
    match value {
        RESPValue::SimpleString(s) => put_line(buf, b'+', s.as_str().as_bytes()),
        RESPValue::Error(s) => put_line(buf, b'-', s.as_str().as_bytes()),
        RESPValue::Integer(n) => put_line(buf, b':', n.to_string().as_bytes()),
        RESPValue::BulkString(None) => buf.put_slice(b"$-1\r\n"),
        RESPValue::BulkString(Some(payload)) => {
            put_line(buf, b'$', payload.len().to_string().as_bytes());
            buf.put_slice(payload);
            buf.put_slice(CRLF);
        },
        RESPValue::Array(None) => buf.put_slice(b"*-1\r\n"),
        RESPValue::Array(Some(elements)) => {
            put_line(buf, b'*', elements.len().to_string().as_bytes());
            for element in elements {
                encode_into(element, buf);
            }
        }
    }
}

fn put_line(buf: &mut BytesMut, prefix: u8, line: &[u8]) {
    buf.put_u8(prefix);
    buf.put_slice(line);
    buf.put_slice(CRLF);
}

/**
 * Exact number of bytes `encode` produces, used to size the output buffer
 */
pub fn encoded_len(value: &RESPValue) -> usize {
    match value {
        RESPValue::SimpleString(s) | RESPValue::Error(s) => 1 + s.as_str().len() + 2,
        RESPValue::Integer(n) => 1 + n.to_string().len() + 2,
        RESPValue::BulkString(None) | RESPValue::Array(None) => 5,
        RESPValue::BulkString(Some(payload)) => {
            1 + decimal_len(payload.len()) + 2 + payload.len() + 2
        },
        RESPValue::Array(Some(elements)) => {
            1 + decimal_len(elements.len()) + 2 + elements.iter().map(encoded_len).sum::<usize>()
        }
    }
}

fn decimal_len(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/**
 * Writes whole encoded values to a stream owned by the caller
 */
pub struct RESPEncoder<W> {
    writer: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> RESPEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, buf: BytesMut::new() }
    }

    pub async fn write(&mut self, value: &RESPValue) -> Result<()> {
        self.buf.clear();
        encode_into(value, &mut self.buf);
        tracing::trace!(bytes = self.buf.len(), "Sending: {}", value);

        self.writer.write_all(&self.buf).await?;
        self.writer.flush().await
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
