use std::{fmt, str::FromStr, string::FromUtf8Error};

/// How raw text bytes coming from the database are turned into strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextDecoding {
    /// The session is switched to `LATIN1` and byte `b` becomes code point
    /// `U+00bb`.
    ///
    /// Decoding never fails. The server converts stored text to Latin-1, and
    /// characters it cannot represent fail the query on the server side.
    #[default]
    Latin1,
    /// Strict UTF-8, invalid sequences are rejected.
    Utf8,
}

impl TextDecoding {
    /// Name of the PostgreSQL `client_encoding` matching this decoding.
    pub fn client_encoding(&self) -> &'static str {
        match self {
            TextDecoding::Latin1 => "LATIN1",
            TextDecoding::Utf8 => "UTF8",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, FromUtf8Error> {
        match self {
            TextDecoding::Latin1 => Ok(decode_latin1(bytes)),
            TextDecoding::Utf8 => String::from_utf8(bytes.to_vec()),
        }
    }
}

impl FromStr for TextDecoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(TextDecoding::Latin1),
            "utf8" | "utf-8" => Ok(TextDecoding::Utf8),
            other => Err(format!("Unknown text decoding: {other}")),
        }
    }
}

impl fmt::Display for TextDecoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextDecoding::Latin1 => write!(f, "latin1"),
            TextDecoding::Utf8 => write!(f, "utf8"),
        }
    }
}

pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
