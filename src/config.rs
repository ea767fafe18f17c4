use std::time::Duration;

/**
 * Which leading type bytes the decoder accepts
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedTypes {
    /// Requests: arrays and bulk strings only
    Requests,
    /// Every RESP2 type, e.g. when decoding replies
    Any,
}

/**
 * Limits applied while decoding untrusted input
 */
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub accepted: AcceptedTypes,
    /// Maximum number of nested arrays, the outermost counts as one
    pub max_depth: usize,
    pub max_bulk_len: usize,
    pub max_array_len: usize,
    /// Longest structural line (type byte excluded, CRLF included)
    pub max_line_len: usize,
}

impl DecoderConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 32;
    pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;
    pub const DEFAULT_MAX_ARRAY_LEN: usize = 1024 * 1024;
    pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

    pub fn any_type() -> Self {
        Self { accepted: AcceptedTypes::Any, ..Self::default() }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            accepted: AcceptedTypes::Requests,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_bulk_len: Self::DEFAULT_MAX_BULK_LEN,
            max_array_len: Self::DEFAULT_MAX_ARRAY_LEN,
            max_line_len: Self::DEFAULT_MAX_LINE_LEN,
        }
    }
}

/**
 * Server settings
 */
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Longest wait for the next byte from a client, `None` waits forever.
    /// Expiring between requests closes the connection quietly, expiring mid-request is an error.
    pub idle_timeout: Option<Duration>,
    pub decoder: DecoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:6379".to_owned(),
            idle_timeout: None,
            decoder: DecoderConfig::default(),
        }
    }
}
