//! Controller reply parsing
//!
//! After receiving a frame the controller answers with a two-digit result
//! code followed by `\n` or `\r\n`. Replies are not otherwise framed, so the
//! code is searched for anywhere in the received bytes.

use ncsend_core::ConnectionError;
use regex::bytes::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Result code for a stored program
pub const CODE_OK: u8 = 0;
/// Result code when the machine is in edit or operation mode
pub const CODE_MACHINE_BUSY: u8 = 5;
/// Result code for a generic device error
pub const CODE_DEVICE_ERROR: u8 = 9;

static RESULT_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2})\r?\n").expect("result code pattern is a valid regex")
});

/// The reply held no two-digit result code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no result code in reply {reply:?}")]
pub struct ParseFailure {
    /// The reply as received, lossily decoded
    pub reply: String,
}

impl From<ParseFailure> for ConnectionError {
    fn from(failure: ParseFailure) -> Self {
        ConnectionError::ResponseParse {
            reply: failure.reply,
        }
    }
}

/// Extract the result code from a raw reply.
///
/// The first two-digit run followed by a line terminator wins. The match is
/// not anchored on the left, so `"123\n"` yields 23.
pub fn interpret(raw: &[u8]) -> Result<u8, ParseFailure> {
    RESULT_CODE_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|digits| (digits.as_bytes()[0] - b'0') * 10 + (digits.as_bytes()[1] - b'0'))
        .ok_or_else(|| ParseFailure {
            reply: String::from_utf8_lossy(raw).into_owned(),
        })
}
