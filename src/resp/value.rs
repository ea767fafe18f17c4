use std::fmt;

use bytes::Bytes;

use super::{encoder, error::InvalidText};

/**
 * Line text for simple strings and errors, guaranteed free of CR and LF
 */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleText(String);

impl SimpleText {
    pub fn new(text: impl Into<String>) -> Result<Self, InvalidText> {
        let text = text.into();
        if text.contains(['\r', '\n']) {
            return Err(InvalidText(text))
        }
        Ok(Self(text))
    }

    /**
     * Replaces CR and LF with spaces, for turning arbitrary messages into error replies
     */
    pub fn lossy(text: &str) -> Self {
        Self(text.replace(['\r', '\n'], " "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SimpleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/**
 * A single RESP value
 * `None` payloads are the null forms: "$-1\r\n" and "*-1\r\n"
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RESPValue {
    SimpleString(SimpleText),       // "+<STRING>\r\n"
    Error(SimpleText),              // "-<STRING>\r\n"
    Integer(i64),                   // ":<INT>\r\n"
    BulkString(Option<Bytes>),      // "$<SIZE>\r\n<BYTES>\r\n"
    Array(Option<Vec<RESPValue>>),  // "*<SIZE>\r\n<VALUE>..."
}

impl RESPValue {
    pub fn simple(text: impl Into<String>) -> Result<Self, InvalidText> {
        SimpleText::new(text).map(Self::SimpleString)
    }

    pub fn error(text: impl Into<String>) -> Result<Self, InvalidText> {
        SimpleText::new(text).map(Self::Error)
    }

    pub fn error_lossy(text: &str) -> Self {
        Self::Error(SimpleText::lossy(text))
    }

    pub fn ok() -> Self {
        Self::SimpleString(SimpleText("OK".to_owned()))
    }

    pub fn integer(n: i64) -> Self {
        Self::Integer(n)
    }

    pub fn bulk(payload: impl Into<Bytes>) -> Self {
        Self::BulkString(Some(payload.into()))
    }

    pub fn null_bulk() -> Self {
        Self::BulkString(None)
    }

    pub fn array(elements: impl IntoIterator<Item = RESPValue>) -> Self {
        Self::Array(Some(elements.into_iter().collect()))
    }

    pub fn null_array() -> Self {
        Self::Array(None)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::BulkString(None) | Self::Array(None))
    }

    /**
     * Canonical wire encoding of this value
     */
    pub fn to_bytes(&self) -> Bytes {
        encoder::encode(self)
    }

    /**
     * Splits a request of the form `*N $name $arg...` into its command name and arguments.
     * Returns None for anything that isn't a non-empty array of bulk strings.
     */
    pub fn into_command(self) -> Option<(Bytes, Vec<Bytes>)> {
        let elements = match self {
            Self::Array(Some(elements)) => elements,
            _ => return None,
        };

        let mut parts = elements.into_iter().map(|element| match element {
            Self::BulkString(Some(payload)) => Some(payload),
            _ => None,
        });

        let name = parts.next()??;
        let args = parts.collect::<Option<Vec<_>>>()?;
        Some((name, args))
    }
}

impl From<i64> for RESPValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<Bytes> for RESPValue {
    fn from(payload: Bytes) -> Self {
        Self::BulkString(Some(payload))
    }
}

impl From<Vec<RESPValue>> for RESPValue {
    fn from(elements: Vec<RESPValue>) -> Self {
        Self::Array(Some(elements))
    }
}

impl fmt::Display for RESPValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimpleString(s) => write!(f, "{}", s),
            Self::Error(s) => write!(f, "(error) {}", s),
            Self::Integer(n) => write!(f, "(integer) {}", n),
            Self::BulkString(None) | Self::Array(None) => f.write_str("(nil)"),
            Self::BulkString(Some(payload)) => {
                write!(f, "{:?}", String::from_utf8_lossy(payload))
            },
            Self::Array(Some(elements)) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("OK")]
    #[case("")]
    #[case("ERR unknown command 'FOO'")]
    fn should_accept_single_line_text(#[case] text: &str) {
        assert_eq!(text, SimpleText::new(text).unwrap().as_str())
    }

    #[rstest]
    #[case("line\r\nbreak")]
    #[case("\r")]
    #[case("trailing\n")]
    fn should_reject_text_with_line_breaks(#[case] text: &str) {
        assert_eq!(Err(InvalidText(text.to_owned())), SimpleText::new(text))
    }

    #[test]
    fn should_replace_line_breaks_in_lossy_text() {
        assert_eq!("bad  input ", SimpleText::lossy("bad\r\ninput\n").as_str())
    }

    #[test]
    fn should_distinguish_null_from_empty() {
        assert_ne!(RESPValue::null_bulk(), RESPValue::bulk(Bytes::new()));
        assert_ne!(RESPValue::null_array(), RESPValue::array(vec![]));
        assert!(RESPValue::null_bulk().is_null());
        assert!(!RESPValue::array(vec![]).is_null());
    }

    #[test]
    fn should_split_command_and_args() {
        let request = RESPValue::array(vec![
            RESPValue::bulk("SET"),
            RESPValue::bulk("key"),
            RESPValue::bulk("value"),
        ]);

        let (name, args) = request.into_command().unwrap();
        assert_eq!(Bytes::from("SET"), name);
        assert_eq!(vec![Bytes::from("key"), Bytes::from("value")], args);
    }

    #[rstest]
    #[case(RESPValue::array(vec![]))]
    #[case(RESPValue::null_array())]
    #[case(RESPValue::bulk("PING"))]
    #[case(RESPValue::array(vec![RESPValue::bulk("GET"), RESPValue::integer(1)]))]
    #[case(RESPValue::array(vec![RESPValue::null_bulk()]))]
    fn should_not_split_non_command(#[case] value: RESPValue) {
        assert_eq!(None, value.into_command())
    }

    #[test]
    fn should_render_through_encoder() {
        let value = RESPValue::from(vec![RESPValue::from(7), RESPValue::from(Bytes::from("x"))]);
        assert_eq!(&b"*2\r\n:7\r\n$1\r\nx\r\n"[..], &value.to_bytes()[..])
    }

    #[test]
    fn should_display_nested_values() {
        let value = RESPValue::array(vec![
            RESPValue::bulk("GET"),
            RESPValue::integer(3),
            RESPValue::null_bulk(),
        ]);
        assert_eq!("[\"GET\", (integer) 3, (nil)]", value.to_string())
    }
}
