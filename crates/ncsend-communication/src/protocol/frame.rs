//! CSAV frame builder
//!
//! Assembles the exact byte sequence sent to the controller:
//! `%` + header + program body + footer. The checksum in the footer covers
//! the header, the body and the line ending that opens the footer, but not
//! the leading `%`.

use super::checksum::checksum;
use super::filename::{ProgramName, MAX_PROGRAM_NAME_LEN};
use std::fmt;

/// Start-of-frame marker, also used to terminate the footer
pub const FRAME_MARKER: char = '%';

/// Save command token that opens the header
pub const SAVE_COMMAND: &str = "CSAV";

/// Controller variant that expects bare LF line endings
pub const LF_CONTROLLER_VARIANT: &str = "A00";

/// Line terminator used inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    #[default]
    CrLf,
}

impl LineEnding {
    /// Select the line ending for a controller variant.
    ///
    /// `A00` controllers take LF; every other variant, and an unset one,
    /// takes CRLF.
    pub fn for_controller(variant: Option<&str>) -> Self {
        match variant {
            Some(LF_CONTROLLER_VARIANT) => Self::Lf,
            _ => Self::CrLf,
        }
    }

    /// The terminator as text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => write!(f, "LF"),
            Self::CrLf => write!(f, "CRLF"),
        }
    }
}

/// A complete frame ready to be written to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: String,
    program_name: ProgramName,
    line_ending: LineEnding,
    checksum: u8,
}

impl Frame {
    /// Bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Program name carried in the header
    pub fn program_name(&self) -> &ProgramName {
        &self.program_name
    }

    /// Line ending used throughout the frame
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Checksum written into the footer
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Frame size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; even an empty program produces header and footer
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// Render the header line: `CSAV`, four spaces, the name padded to eight
/// characters, two spaces, then the line ending.
fn header(name: &ProgramName, line_ending: LineEnding) -> String {
    format!(
        "{}    {:<width$}  {}",
        SAVE_COMMAND,
        name.as_str(),
        line_ending.as_str(),
        width = MAX_PROGRAM_NAME_LEN
    )
}

/// Build the frame for `body` under the program name `name`.
///
/// The body is sent verbatim and may be empty.
pub fn build(name: &ProgramName, body: &str, line_ending: LineEnding) -> Frame {
    let eol = line_ending.as_str();
    let header = header(name, line_ending);

    let mut checked = String::with_capacity(header.len() + body.len() + eol.len());
    checked.push_str(&header);
    checked.push_str(body);
    checked.push_str(eol);
    let sum = checksum(checked.as_bytes());

    let mut data = String::with_capacity(checked.len() + 4);
    data.push(FRAME_MARKER);
    data.push_str(&checked);
    data.push_str(&format!("{:02x}", sum));
    data.push(FRAME_MARKER);

    Frame {
        data,
        program_name: name.clone(),
        line_ending,
        checksum: sum,
    }
}
