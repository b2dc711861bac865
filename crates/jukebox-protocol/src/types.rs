//! Request and response types for the jukebox wire protocol.
//!
//! Requests are plain UTF-8 text; responses are either the literal
//! bytes `READY` or a JSON object carrying a `status` field:
//!
//! ```text
//! request  := "LIST" | "PLAY:" <filename>
//! response := "READY"
//!           | {"status":"OK","files":[...]}       catalog
//!           | {"status":"OK","message":"..."}     greeting
//!           | {"status":"ERROR","message":"..."}  error
//! ```
//!
//! Filename validation lives here too so both ends of the wire apply
//! the same rules: the server before touching its music directory, the
//! client before a request is ever sent.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Wire form of the `Ready` response.
const READY: &[u8] = b"READY";

/// Prefix of the error message a server sends for a missing file.
///
/// Clients match on this prefix to distinguish "file not found" from
/// other server-side rejections.
pub const FILE_NOT_FOUND_PREFIX: &str = "File not found: ";

/// A request sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask for the list of available files.
    List,
    /// Ask the server to stream the named file.
    Play { filename: String },
}

impl Request {
    /// Creates a `Play` request for the given filename.
    pub fn play(filename: impl Into<String>) -> Self {
        Self::Play {
            filename: filename.into(),
        }
    }

    /// Encodes the request into a frame payload.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::List => b"LIST".to_vec(),
            Self::Play { filename } => format!("PLAY:{filename}").into_bytes(),
        }
    }

    /// Parses a frame payload into a request.
    ///
    /// Only the first colon of a `PLAY:` request is a separator, so
    /// filenames containing colons survive the round trip.
    pub fn parse(payload: &[u8]) -> ProtocolResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        if text == "LIST" {
            return Ok(Self::List);
        }
        if let Some(filename) = text.strip_prefix("PLAY:") {
            return Ok(Self::play(filename));
        }
        Err(ProtocolError::UnknownRequest {
            request: preview(text),
        })
    }
}

/// Truncates request text for error messages and logs.
fn preview(text: &str) -> String {
    const MAX: usize = 64;
    if text.len() <= MAX {
        return text.to_string();
    }
    let mut cut = MAX;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

/// A response sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A file transfer follows immediately on the same stream.
    Ready,
    /// The catalog of available files.
    Catalog { files: Vec<String> },
    /// The greeting sent once when a connection is accepted.
    Welcome { message: String },
    /// A server-reported error; the session stays open.
    Error { message: String },
}

/// JSON body shared by every non-`READY` response.
#[derive(Debug, Serialize, Deserialize)]
struct WireBody {
    status: WireStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum WireStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

impl Response {
    /// Creates the error response for a file missing from the catalog.
    pub fn file_not_found(filename: &str) -> Self {
        Self::Error {
            message: format!("{FILE_NOT_FOUND_PREFIX}{filename}"),
        }
    }

    /// Short label for log and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Catalog { .. } => "catalog",
            Self::Welcome { .. } => "greeting",
            Self::Error { .. } => "error",
        }
    }

    /// Encodes the response into a frame payload.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let body = match self {
            Self::Ready => return Ok(READY.to_vec()),
            Self::Catalog { files } => WireBody {
                status: WireStatus::Ok,
                files: Some(files.clone()),
                message: None,
            },
            Self::Welcome { message } => WireBody {
                status: WireStatus::Ok,
                files: None,
                message: Some(message.clone()),
            },
            Self::Error { message } => WireBody {
                status: WireStatus::Error,
                files: None,
                message: Some(message.clone()),
            },
        };
        Ok(serde_json::to_vec(&body)?)
    }

    /// Parses a frame payload into a response.
    pub fn parse(payload: &[u8]) -> ProtocolResult<Self> {
        if payload == READY {
            return Ok(Self::Ready);
        }
        let body: WireBody = serde_json::from_slice(payload)?;
        match body {
            WireBody {
                status: WireStatus::Ok,
                files: Some(files),
                ..
            } => Ok(Self::Catalog { files }),
            WireBody {
                status: WireStatus::Ok,
                files: None,
                message: Some(message),
            } => Ok(Self::Welcome { message }),
            WireBody {
                status: WireStatus::Error,
                message: Some(message),
                ..
            } => Ok(Self::Error { message }),
            _ => Err(ProtocolError::malformed_response(
                "response carries neither files nor a message",
            )),
        }
    }
}

/// Checks that `name` is a bare filename safe to resolve inside the
/// music directory.
///
/// Rejects, before any filesystem access: empty names, `.`, path
/// separators, `..` anywhere in the name, and NUL bytes.
pub fn validate_filename(name: &str) -> ProtocolResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name == "." {
        "name does not denote a file"
    } else if name.contains(['/', '\\']) {
        "path separators are not allowed"
    } else if name.contains("..") {
        "parent directory references are not allowed"
    } else if name.contains('\0') {
        "NUL bytes are not allowed"
    } else {
        return Ok(());
    };
    Err(ProtocolError::InvalidFilename {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_encode_to_exact_wire_strings() {
        assert_eq!(Request::List.encode(), b"LIST");
        assert_eq!(Request::play("song.mp3").encode(), b"PLAY:song.mp3");
    }

    #[test]
    fn requests_parse_back() {
        assert_eq!(Request::parse(b"LIST").unwrap(), Request::List);
        assert_eq!(
            Request::parse(b"PLAY:song.mp3").unwrap(),
            Request::play("song.mp3")
        );
    }

    #[test]
    fn play_splits_on_first_colon_only() {
        assert_eq!(
            Request::parse(b"PLAY:we:ird.mp3").unwrap(),
            Request::play("we:ird.mp3")
        );
    }

    #[test]
    fn play_with_empty_filename_parses() {
        // Validation is a separate step; the parser itself is lenient.
        assert_eq!(Request::parse(b"PLAY:").unwrap(), Request::play(""));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let err = Request::parse(b"NOPE").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnknownRequest { ref request } if request == "NOPE"
        ));
    }

    #[test]
    fn long_unknown_requests_are_truncated_in_errors() {
        let payload = vec![b'x'; 500];
        let err = Request::parse(&payload).unwrap_err();
        match err {
            ProtocolError::UnknownRequest { request } => {
                assert!(request.len() < 80, "got {} bytes", request.len());
                assert!(request.ends_with("..."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_utf8_request_is_rejected() {
        let err = Request::parse(&[0x4c, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8));
    }

    #[test]
    fn responses_encode_to_exact_wire_bytes() {
        assert_eq!(Response::Ready.encode().unwrap(), b"READY");
        assert_eq!(
            Response::Catalog {
                files: vec!["a.mp3".into(), "b.wav".into()],
            }
            .encode()
            .unwrap(),
            br#"{"status":"OK","files":["a.mp3","b.wav"]}"#
        );
        assert_eq!(
            Response::Welcome {
                message: "hi".into(),
            }
            .encode()
            .unwrap(),
            br#"{"status":"OK","message":"hi"}"#
        );
        assert_eq!(
            Response::Error {
                message: "boom".into(),
            }
            .encode()
            .unwrap(),
            br#"{"status":"ERROR","message":"boom"}"#
        );
    }

    #[test]
    fn responses_parse_back() {
        for response in [
            Response::Ready,
            Response::Catalog { files: vec![] },
            Response::Catalog {
                files: vec!["a.mp3".into()],
            },
            Response::Welcome {
                message: "hello".into(),
            },
            Response::Error {
                message: "boom".into(),
            },
        ] {
            let encoded = response.encode().unwrap();
            assert_eq!(Response::parse(&encoded).unwrap(), response);
        }
    }

    #[test]
    fn response_with_no_content_is_malformed() {
        let err = Response::parse(br#"{"status":"OK"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedResponse { .. }));
    }

    #[test]
    fn response_that_is_not_json_is_rejected() {
        let err = Response::parse(b"not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Serialization(_)));
    }

    #[test]
    fn file_not_found_uses_the_shared_prefix() {
        let response = Response::file_not_found("missing.mp3");
        match &response {
            Response::Error { message } => {
                assert_eq!(message, "File not found: missing.mp3");
                assert_eq!(
                    message.strip_prefix(FILE_NOT_FOUND_PREFIX),
                    Some("missing.mp3")
                );
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn valid_filenames_pass() {
        for name in ["a.mp3", "Song Title.wav", "we:ird.mp3", "x", ".hidden.mp3"] {
            assert!(validate_filename(name).is_ok(), "rejected {name:?}");
        }
    }

    #[test]
    fn hostile_filenames_are_rejected() {
        for name in [
            "",
            ".",
            "..",
            "../secret.mp3",
            "a/b.mp3",
            "a\\b.mp3",
            "a..b.mp3",
            "nul\0byte.mp3",
        ] {
            let err = validate_filename(name).unwrap_err();
            assert!(
                matches!(err, ProtocolError::InvalidFilename { .. }),
                "accepted {name:?}"
            );
        }
    }
}
