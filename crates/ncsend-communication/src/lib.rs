//! # ncsend Communication
//!
//! The CSAV file transfer protocol used to upload NC programs to a CNC
//! controller over raw TCP.
//!
//! - [`protocol`]: checksum, program name validation, frame building and
//!   reply interpretation. Pure, no I/O.
//! - [`communication`]: the TCP transport and the transfer session that
//!   races the reply against the timeout and user cancellation.

pub mod communication;
pub mod protocol;

pub use communication::{
    session::{ProgramSender, SessionState, TransferOutcome, TransferRequest, TransferSession},
    tcp::TcpConnectionInfo,
};

pub use protocol::{
    checksum::checksum,
    filename::{validate, ProgramName, MAX_PROGRAM_NAME_LEN},
    frame::{build, Frame, LineEnding},
    response::{interpret, ParseFailure},
};

pub use tokio_util::sync::CancellationToken;
