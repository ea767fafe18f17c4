use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::{
    encoder::CRLF,
    error::{ProtocolError, RESPError},
    value::{RESPValue, SimpleText},
};
use crate::config::{AcceptedTypes, DecoderConfig};

/// Upper bound on up-front allocation for declared lengths, the rest grows as bytes arrive
const PREALLOC_LIMIT: usize = 64 * 1024;

/**
 * An array whose header has been read but whose elements are still arriving
 */
struct PendingArray {
    elements: Vec<RESPValue>,
    expected: usize,
}

/**
 * Reads one RESP value at a time from a buffered stream
 */
pub struct RESPDecoder<R> {
    reader: R,
    config: DecoderConfig,
    /// Longest wait for more bytes during the current read, set per call
    stall_limit: Option<Duration>,
}

impl<R: AsyncBufRead + Unpin> RESPDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self { reader, config, stall_limit: None }
    }

    /**
     * Reads exactly one top-level value.
     * `Ok(None)` means the stream closed cleanly before the first byte of a value,
     * a close anywhere later is `ProtocolError::Truncated`.
     */
    pub async fn read(&mut self) -> Result<Option<RESPValue>, RESPError> {
        self.stall_limit = None;
        self.read_unit().await
    }

    /**
     * Like `read`, but fails with `RESPError::TimedOut` once the stream goes `limit` without
     * delivering a byte. The limit restarts whenever bytes arrive, so slow but steady senders
     * are not cut off. `mid_unit` tells an idle connection apart from one that stalled
     * partway through a value; in the latter case the consumed bytes are gone and the stream
     * should be dropped.
     */
    pub async fn read_timeout(&mut self, limit: Duration) -> Result<Option<RESPValue>, RESPError> {
        self.stall_limit = Some(limit);
        self.read_unit().await
    }

    async fn read_unit(&mut self) -> Result<Option<RESPValue>, RESPError> {
        // Arrays nest by pushing onto this stack instead of recursing
        let mut stack: Vec<PendingArray> = vec![];

        'unit: loop {
            let type_byte = match self.read_byte(!stack.is_empty()).await? {
                Some(byte) => byte,
                None if stack.is_empty() => return Ok(None),
                None => return Err(ProtocolError::Truncated.into()),
            };

            let mut value = match type_byte {
                b'*' => {
                    if stack.len() >= self.config.max_depth {
                        return Err(ProtocolError::TooDeep(self.config.max_depth).into())
                    }
                    match self.read_length(self.config.max_array_len).await? {
                        None => RESPValue::Array(None),
                        Some(0) => RESPValue::Array(Some(vec![])),
                        Some(expected) => {
                            stack.push(PendingArray {
                                elements: Vec::with_capacity(expected.min(PREALLOC_LIMIT)),
                                expected,
                            });
                            continue 'unit
                        }
                    }
                },
                b'$' => self.read_bulk().await?,
                b'+' | b'-' | b':' if self.config.accepted == AcceptedTypes::Any => {
                    self.read_simple(type_byte).await?
                },
                _ => return Err(ProtocolError::UnknownType(type_byte).into()),
            };

            // Hand the finished value to its parent, closing every array it completes
            while let Some(mut parent) = stack.pop() {
                parent.elements.push(value);
                if parent.elements.len() < parent.expected {
                    stack.push(parent);
                    continue 'unit
                }
                value = RESPValue::Array(Some(parent.elements));
            }

            tracing::trace!("Read value: {}", value);
            return Ok(Some(value))
        }
    }

    /**
     * Waits for buffered bytes, an empty slice is EOF
     */
    async fn fill(&mut self, mid_unit: bool) -> Result<&[u8], RESPError> {
        let filled = match self.stall_limit {
            Some(limit) => tokio::time::timeout(limit, self.reader.fill_buf())
                .await
                .map_err(|_| RESPError::TimedOut { mid_unit })?,
            None => self.reader.fill_buf().await,
        };
        filled.map_err(|err| RESPError::from_io(err, mid_unit))
    }

    async fn read_byte(&mut self, mid_unit: bool) -> Result<Option<u8>, RESPError> {
        let byte = self.fill(mid_unit).await?.first().copied();
        if byte.is_some() {
            self.reader.consume(1);
        }
        Ok(byte)
    }

    /**
     * Reads through the next CRLF pair and returns the line without it.
     * A bare LF does not end the line.
     */
    async fn read_line(&mut self) -> Result<Vec<u8>, RESPError> {
        let max = self.config.max_line_len;
        let mut line = vec![];

        loop {
            let buf = self.fill(true).await?;
            if buf.is_empty() {
                return Err(ProtocolError::Truncated.into())
            }

            let available = &buf[..buf.len().min(max - line.len())];
            let used = match available.iter().position(|&b| b == b'\n') {
                Some(at) => at + 1,
                None => available.len(),
            };
            line.extend_from_slice(&available[..used]);
            self.reader.consume(used);

            if line.ends_with(CRLF) {
                line.truncate(line.len() - CRLF.len());
                return Ok(line)
            }
            if line.len() >= max {
                return Err(ProtocolError::LineTooLong(max).into())
            }
        }
    }

    /**
     * Reads exactly `len` bytes, however many reads the stream needs to deliver them
     */
    async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, RESPError> {
        let mut bytes = Vec::with_capacity(len.min(PREALLOC_LIMIT));

        while bytes.len() < len {
            let buf = self.fill(true).await?;
            if buf.is_empty() {
                return Err(ProtocolError::Truncated.into())
            }

            let used = buf.len().min(len - bytes.len());
            bytes.extend_from_slice(&buf[..used]);
            self.reader.consume(used);
        }
        Ok(bytes)
    }

    /**
     * Parses a length line, negative lengths are the null forms
     */
    async fn read_length(&mut self, max: usize) -> Result<Option<usize>, RESPError> {
        let line = self.read_line().await?;
        let len = parse_decimal(&line)
            .ok_or_else(|| ProtocolError::MalformedLength(lossy(&line)))?;

        if len < 0 {
            return Ok(None)
        }
        match usize::try_from(len) {
            Ok(len) if len <= max => Ok(Some(len)),
            _ => Err(ProtocolError::TooLarge { len, max }.into()),
        }
    }

    async fn read_bulk(&mut self) -> Result<RESPValue, RESPError> {
        let len = match self.read_length(self.config.max_bulk_len).await? {
            Some(len) => len,
            None => return Ok(RESPValue::BulkString(None)),
        };

        let payload = self.read_exact(len).await?;
        if self.read_exact(CRLF.len()).await? != CRLF {
            return Err(ProtocolError::MissingTerminator.into())
        }

        Ok(RESPValue::BulkString(Some(Bytes::from(payload))))
    }

    async fn read_simple(&mut self, type_byte: u8) -> Result<RESPValue, RESPError> {
        let line = self.read_line().await?;

        if type_byte == b':' {
            let n = parse_decimal(&line)
                .ok_or_else(|| ProtocolError::MalformedInteger(lossy(&line)))?;
            return Ok(RESPValue::Integer(n))
        }

        let text = String::from_utf8(line)
            .ok()
            .and_then(|text| SimpleText::new(text).ok())
            .ok_or(ProtocolError::InvalidText)?;

        Ok(match type_byte {
            b'+' => RESPValue::SimpleString(text),
            _ => RESPValue::Error(text),
        })
    }
}

fn parse_decimal(line: &[u8]) -> Option<i64> {
    std::str::from_utf8(line).ok()?.parse().ok()
}

fn lossy(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}
