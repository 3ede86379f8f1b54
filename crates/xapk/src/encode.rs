//! Output representations.
//!
//! A request asks for one of four shapes. Mode codes are the host bridge's
//! message type numbers, and any code the bridge does not define selects a
//! base64 data URI.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Bridge message type for strings.
pub const MESSAGE_TYPE_STRING: i32 = 1;
/// Bridge message type for array buffers.
pub const MESSAGE_TYPE_ARRAYBUFFER: i32 = 6;
/// Bridge message type for binary strings.
pub const MESSAGE_TYPE_BINARYSTRING: i32 = 7;

/// The output shape a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentationMode {
    /// UTF-8 text.
    Text,
    /// Bytes as an opaque buffer.
    #[default]
    RawBuffer,
    /// Bytes flagged as a binary string.
    BinaryString,
    /// `data:<mime>;base64,<payload>`.
    DataUri,
}

impl RepresentationMode {
    /// Map a bridge message type to a mode. Unknown codes select `DataUri`.
    pub fn from_code(code: i32) -> Self {
        match code {
            MESSAGE_TYPE_STRING => Self::Text,
            MESSAGE_TYPE_ARRAYBUFFER => Self::RawBuffer,
            MESSAGE_TYPE_BINARYSTRING => Self::BinaryString,
            _ => Self::DataUri,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::RawBuffer => "raw-buffer",
            Self::BinaryString => "binary-string",
            Self::DataUri => "data-uri",
        }
    }
}

impl FromStr for RepresentationMode {
    type Err = Infallible;

    /// Parse a mode name. Unrecognized names select `DataUri`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "text" | "string" => Self::Text,
            "raw" | "raw-buffer" | "arraybuffer" => Self::RawBuffer,
            "binary" | "binary-string" | "binarystring" => Self::BinaryString,
            _ => Self::DataUri,
        })
    }
}

/// Accepts a mode name or a bridge message type. Anything unrecognized
/// selects `DataUri`, the same as [`from_code`](RepresentationMode::from_code)
/// and [`FromStr`].
impl<'de> Deserialize<'de> for RepresentationMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ModeVisitor;

        impl Visitor<'_> for ModeVisitor {
            type Value = RepresentationMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a representation mode name or message type code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                match v.parse::<RepresentationMode>() {
                    Ok(mode) => Ok(mode),
                    Err(never) => match never {},
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(i32::try_from(v).map_or(RepresentationMode::DataUri, RepresentationMode::from_code))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(i32::try_from(v).map_or(RepresentationMode::DataUri, RepresentationMode::from_code))
            }
        }

        deserializer.deserialize_any(ModeVisitor)
    }
}

impl fmt::Display for RepresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded entry content. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Text(String),
    RawBuffer(Vec<u8>),
    /// Bytes the transport must treat as binary rather than text.
    BinaryString(Vec<u8>),
    DataUri(String),
}

/// Payload in the shape a host bridge sends back to its web view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    String(String),
    ArrayBuffer(Vec<u8>),
    BinaryString(Vec<u8>),
}

impl Representation {
    pub fn mode(&self) -> RepresentationMode {
        match self {
            Self::Text(_) => RepresentationMode::Text,
            Self::RawBuffer(_) => RepresentationMode::RawBuffer,
            Self::BinaryString(_) => RepresentationMode::BinaryString,
            Self::DataUri(_) => RepresentationMode::DataUri,
        }
    }

    /// Byte view of the content, e.g. for writing it to a file.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) | Self::DataUri(s) => s.as_bytes(),
            Self::RawBuffer(b) | Self::BinaryString(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Convert into the message a host bridge transports.
    pub fn into_message(self) -> Message {
        match self {
            Self::Text(s) | Self::DataUri(s) => Message::String(s),
            Self::RawBuffer(b) => Message::ArrayBuffer(b),
            Self::BinaryString(b) => Message::BinaryString(b),
        }
    }
}

/// Encode fully buffered bytes into the requested representation.
///
/// `mime` is only used by `DataUri`. Text decoding is strict: invalid UTF-8
/// is an error, never replaced.
pub fn encode(bytes: Vec<u8>, mime: &str, mode: RepresentationMode) -> Result<Representation> {
    Ok(match mode {
        RepresentationMode::Text => Representation::Text(String::from_utf8(bytes)?),
        RepresentationMode::RawBuffer => Representation::RawBuffer(bytes),
        RepresentationMode::BinaryString => Representation::BinaryString(bytes),
        RepresentationMode::DataUri => Representation::DataUri(data_uri(&bytes, mime)),
    })
}

/// `data:<mime>;base64,<payload>` with unwrapped standard base64.
pub fn data_uri(bytes: &[u8], mime: &str) -> String {
    let mut uri = String::with_capacity(13 + mime.len() + bytes.len().div_ceil(3) * 4);
    uri.push_str("data:");
    uri.push_str(mime);
    uri.push_str(";base64,");
    STANDARD.encode_string(bytes, &mut uri);
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const MODES: [RepresentationMode; 4] = [
        RepresentationMode::Text,
        RepresentationMode::RawBuffer,
        RepresentationMode::BinaryString,
        RepresentationMode::DataUri,
    ];

    #[test]
    fn test_text_mode() {
        let out = encode(b"{\"a\":1}".to_vec(), "application/json", RepresentationMode::Text).unwrap();
        assert_eq!(out, Representation::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_text_mode_rejects_invalid_utf8() {
        let err = encode(vec![0x66, 0xFF, 0x6F], "text/plain", RepresentationMode::Text).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_buffer_modes_pass_bytes_through() {
        let bytes = vec![0x00, 0xFF, 0x10, 0x80];
        assert_eq!(
            encode(bytes.clone(), "x/y", RepresentationMode::RawBuffer).unwrap(),
            Representation::RawBuffer(bytes.clone())
        );
        assert_eq!(
            encode(bytes.clone(), "x/y", RepresentationMode::BinaryString).unwrap(),
            Representation::BinaryString(bytes)
        );
    }

    #[test]
    fn test_data_uri_decodes_back() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let out = encode(bytes.clone(), "image/png", RepresentationMode::DataUri).unwrap();

        let Representation::DataUri(uri) = out else {
            panic!("expected data uri");
        };
        let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
        assert!(!payload.contains('\n'));
        assert_eq!(STANDARD.decode(payload).unwrap(), bytes);
    }

    #[test]
    fn test_data_uri_format() {
        assert_eq!(data_uri(b"hi", "text/plain"), "data:text/plain;base64,aGk=");
        assert_eq!(data_uri(b"", "application/octet-stream"), "data:application/octet-stream;base64,");
    }

    #[test]
    fn test_empty_input_in_every_mode() {
        for mode in MODES {
            let out = encode(Vec::new(), "application/octet-stream", mode).unwrap();
            match out {
                Representation::Text(s) => assert!(s.is_empty()),
                Representation::RawBuffer(b) | Representation::BinaryString(b) => assert!(b.is_empty()),
                Representation::DataUri(s) => assert_eq!(s, "data:application/octet-stream;base64,"),
            }
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let bytes = b"same input".to_vec();
        for mode in MODES {
            let a = encode(bytes.clone(), "text/plain", mode).unwrap();
            let b = encode(bytes.clone(), "text/plain", mode).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.mode(), mode);
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_data_uri() {
        assert_eq!(RepresentationMode::from_code(1), RepresentationMode::Text);
        assert_eq!(RepresentationMode::from_code(6), RepresentationMode::RawBuffer);
        assert_eq!(RepresentationMode::from_code(7), RepresentationMode::BinaryString);
        for code in [0, 2, 5, 8, -1, 42] {
            assert_eq!(RepresentationMode::from_code(code), RepresentationMode::DataUri);
        }
        assert_eq!("nonsense".parse::<RepresentationMode>().unwrap(), RepresentationMode::DataUri);
        assert_eq!("RAW".parse::<RepresentationMode>().unwrap(), RepresentationMode::RawBuffer);
    }

    #[test]
    fn test_into_message() {
        assert_eq!(
            Representation::DataUri("data:a/b;base64,".into()).into_message(),
            Message::String("data:a/b;base64,".into())
        );
        assert_eq!(
            Representation::BinaryString(vec![1]).into_message(),
            Message::BinaryString(vec![1])
        );
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&RepresentationMode::DataUri).unwrap();
        assert_eq!(json, "\"data-uri\"");
        let mode: RepresentationMode = serde_json::from_str("\"binary-string\"").unwrap();
        assert_eq!(mode, RepresentationMode::BinaryString);
    }

    #[test]
    fn test_mode_deserializes_unknown_as_data_uri() {
        let parse = |json: &str| serde_json::from_str::<RepresentationMode>(json).unwrap();
        assert_eq!(parse("\"base64\""), RepresentationMode::DataUri);
        assert_eq!(parse("\"TEXT\""), RepresentationMode::Text);
        assert_eq!(parse("6"), RepresentationMode::RawBuffer);
        assert_eq!(parse("7"), RepresentationMode::BinaryString);
        assert_eq!(parse("3"), RepresentationMode::DataUri);
        assert_eq!(parse("-2"), RepresentationMode::DataUri);
        assert_eq!(parse("99999999999"), RepresentationMode::DataUri);
    }
}
