//! Transfer session
//!
//! Runs one upload: connect, write the frame, wait for the result code.
//! Four things can end a session (a reply, the deadline, a connection error
//! or user cancellation) and whichever happens first decides the outcome.
//!
//! The race is a single `tokio::select!` between the cancellation token and
//! the timed exchange. The socket lives inside the exchange future, so every
//! branch that ends the session also drops (closes) the socket.

use super::tcp::{self, TcpConnectionInfo};
use crate::protocol::filename::validate;
use crate::protocol::frame::{build, Frame, LineEnding};
use crate::protocol::response::{interpret, CODE_DEVICE_ERROR, CODE_MACHINE_BUSY, CODE_OK};
use ncsend_core::{ConnectionError, ValidationError};
use ncsend_settings::{ConfigResult, TransferConfig};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of one transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Controller stored the program (code 00)
    Success,
    /// Machine is in edit or operation mode (code 05)
    MachineBusy,
    /// Controller reported a device error (code 09)
    DeviceError(u8),
    /// Connection, timeout or reply parse failure
    NetworkFailure,
    /// The user cancelled the transfer
    Cancelled,
    /// Controller returned a code with no specific meaning
    UnrecognizedCode(u8),
}

impl TransferOutcome {
    /// Map a controller result code to an outcome
    pub fn from_code(code: u8) -> Self {
        match code {
            CODE_OK => Self::Success,
            CODE_MACHINE_BUSY => Self::MachineBusy,
            CODE_DEVICE_ERROR => Self::DeviceError(code),
            other => Self::UnrecognizedCode(other),
        }
    }

    /// Numeric form: the controller code, or -1 for a network failure and
    /// -2 for cancellation
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => CODE_OK as i32,
            Self::MachineBusy => CODE_MACHINE_BUSY as i32,
            Self::DeviceError(code) | Self::UnrecognizedCode(code) => *code as i32,
            Self::NetworkFailure => -1,
            Self::Cancelled => -2,
        }
    }

    /// Whether the program was stored
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Message to show the user, `None` on success
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::MachineBusy => Some(format!(
                "Failed to send file. Machine is in edit or operation mode. Error code: {:02}",
                CODE_MACHINE_BUSY
            )),
            Self::DeviceError(code) | Self::UnrecognizedCode(code) => {
                Some(format!("Failed to send file. Error code: {:02}", code))
            }
            Self::NetworkFailure => {
                Some("Failed to send file. Failed to connect or networking issue.".to_string())
            }
            Self::Cancelled => Some("Failed to send file. User cancelled.".to_string()),
        }
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::MachineBusy => write!(f, "machine busy"),
            Self::DeviceError(code) => write!(f, "device error {:02}", code),
            Self::NetworkFailure => write!(f, "network failure"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::UnrecognizedCode(code) => write!(f, "unrecognized code {:02}", code),
        }
    }
}

/// Everything one session needs
#[derive(Debug, Clone)]
pub struct TransferRequest {
    frame: Frame,
    target: TcpConnectionInfo,
    timeout: Duration,
    cancel: CancellationToken,
}

impl TransferRequest {
    /// Create a request for `frame` to `address:port`
    pub fn new(
        frame: Frame,
        address: impl Into<String>,
        port: u16,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            frame,
            target: TcpConnectionInfo::new(address, port),
            timeout,
            cancel,
        }
    }

    /// Frame to transmit
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Controller endpoint
    pub fn target(&self) -> &TcpConnectionInfo {
        &self.target
    }

    /// Connect deadline, and reply deadline counted from connection
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancellation signal
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Resolving and connecting
    Connecting,
    /// Writing the frame
    Sending,
    /// Frame written, waiting for the result code
    AwaitingReply,
    /// Finished; terminal
    Resolved(TransferOutcome),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Sending => write!(f, "sending"),
            Self::AwaitingReply => write!(f, "awaiting reply"),
            Self::Resolved(outcome) => write!(f, "resolved ({})", outcome),
        }
    }
}

/// A single transfer attempt
pub struct TransferSession {
    request: TransferRequest,
    state: SessionState,
}

impl TransferSession {
    /// Create an idle session
    pub fn new(request: TransferRequest) -> Self {
        Self {
            request,
            state: SessionState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The request this session runs
    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    /// Run the transfer to completion.
    ///
    /// Resolves exactly once: calling `run` again returns the stored outcome
    /// without touching the network.
    pub async fn run(&mut self) -> TransferOutcome {
        if let SessionState::Resolved(outcome) = self.state {
            return outcome;
        }

        let cancel = self.request.cancel.clone();
        let target = self.request.target.clone();
        let timeout_ms = self.request.timeout.as_millis() as u64;

        let outcome = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::info!("Transfer to {} cancelled", target);
                TransferOutcome::Cancelled
            }

            result = self.exchange() => match result {
                Ok(code) => TransferOutcome::from_code(code),
                Err(ConnectionError::ConnectionTimeout { .. }) => {
                    tracing::warn!(
                        "Connection timeout after {}ms talking to {}",
                        timeout_ms,
                        target
                    );
                    TransferOutcome::NetworkFailure
                }
                Err(e) => {
                    tracing::warn!("Transfer to {} failed: {}", target, e);
                    TransferOutcome::NetworkFailure
                }
            },
        };

        self.transition(SessionState::Resolved(outcome));
        outcome
    }

    async fn exchange(&mut self) -> Result<u8, ConnectionError> {
        let timeout = self.request.timeout;
        let timed_out = ConnectionError::ConnectionTimeout {
            timeout_ms: timeout.as_millis() as u64,
        };

        self.transition(SessionState::Connecting);
        tracing::info!("Connecting to {}", self.request.target);
        let mut stream = tokio::time::timeout(timeout, tcp::connect(&self.request.target))
            .await
            .map_err(|_| timed_out.clone())??;

        // The reply deadline runs from connection establishment.
        let deadline = Instant::now() + timeout;
        let result = tokio::time::timeout_at(deadline, self.converse(&mut stream)).await;
        tcp::close(&mut stream).await;

        result.map_err(|_| timed_out)?
    }

    async fn converse(&mut self, stream: &mut TcpStream) -> Result<u8, ConnectionError> {
        self.transition(SessionState::Sending);
        tracing::info!(
            "Sending program {} ({} bytes)",
            self.request.frame.program_name(),
            self.request.frame.len()
        );
        tcp::write_frame(stream, self.request.frame.as_bytes()).await?;

        self.transition(SessionState::AwaitingReply);
        let reply = tcp::read_reply(stream).await?;
        tracing::debug!("Received: {:?}", String::from_utf8_lossy(&reply));

        Ok(interpret(&reply)?)
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Transfer session: {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Builds transfer requests from a [`TransferConfig`] and runs them
#[derive(Debug, Clone)]
pub struct ProgramSender {
    config: TransferConfig,
}

impl ProgramSender {
    /// Create a sender; fails if the config is invalid
    pub fn new(config: TransferConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Line ending for the configured controller
    pub fn line_ending(&self) -> LineEnding {
        LineEnding::for_controller(self.config.controller.as_deref())
    }

    /// Validate the program file name and frame `text` into a request
    pub fn prepare(
        &self,
        path: impl AsRef<Path>,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<TransferRequest, ValidationError> {
        let name = validate(path)?;
        let frame = build(&name, text, self.line_ending());
        Ok(TransferRequest::new(
            frame,
            self.config.address.clone(),
            self.config.port,
            self.config.timeout(),
            cancel,
        ))
    }

    /// Send the program at `path` with contents `text`.
    ///
    /// A validation error is returned before any connection is made; every
    /// other failure is reported through the outcome.
    pub async fn send(
        &self,
        path: impl AsRef<Path>,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<TransferOutcome, ValidationError> {
        let request = self.prepare(path, text, cancel)?;
        let mut session = TransferSession::new(request);
        Ok(session.run().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_code() {
        assert_eq!(TransferOutcome::from_code(0), TransferOutcome::Success);
        assert_eq!(TransferOutcome::from_code(5), TransferOutcome::MachineBusy);
        assert_eq!(TransferOutcome::from_code(9), TransferOutcome::DeviceError(9));
        assert_eq!(
            TransferOutcome::from_code(42),
            TransferOutcome::UnrecognizedCode(42)
        );
        assert_eq!(
            TransferOutcome::from_code(99),
            TransferOutcome::UnrecognizedCode(99)
        );
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(TransferOutcome::Success.code(), 0);
        assert_eq!(TransferOutcome::MachineBusy.code(), 5);
        assert_eq!(TransferOutcome::DeviceError(9).code(), 9);
        assert_eq!(TransferOutcome::UnrecognizedCode(3).code(), 3);
        assert_eq!(TransferOutcome::NetworkFailure.code(), -1);
        assert_eq!(TransferOutcome::Cancelled.code(), -2);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(TransferOutcome::Success.user_message(), None);
        assert_eq!(
            TransferOutcome::MachineBusy.user_message().unwrap(),
            "Failed to send file. Machine is in edit or operation mode. Error code: 05"
        );
        assert_eq!(
            TransferOutcome::DeviceError(9).user_message().unwrap(),
            "Failed to send file. Error code: 09"
        );
        assert_eq!(
            TransferOutcome::UnrecognizedCode(3).user_message().unwrap(),
            "Failed to send file. Error code: 03"
        );
        assert_eq!(
            TransferOutcome::NetworkFailure.user_message().unwrap(),
            "Failed to send file. Failed to connect or networking issue."
        );
        assert_eq!(
            TransferOutcome::Cancelled.user_message().unwrap(),
            "Failed to send file. User cancelled."
        );
    }

    #[test]
    fn test_sender_rejects_invalid_config() {
        assert!(ProgramSender::new(TransferConfig::default()).is_err());
    }

    #[test]
    fn test_sender_line_ending_follows_controller() {
        let sender = ProgramSender::new(TransferConfig::new("cnc").with_controller("A00")).unwrap();
        assert_eq!(sender.line_ending(), LineEnding::Lf);

        let sender = ProgramSender::new(TransferConfig::new("cnc").with_controller("B00")).unwrap();
        assert_eq!(sender.line_ending(), LineEnding::CrLf);

        let sender = ProgramSender::new(TransferConfig::new("cnc")).unwrap();
        assert_eq!(sender.line_ending(), LineEnding::CrLf);
    }

    #[test]
    fn test_prepare_builds_request() {
        let config = TransferConfig::new("10.0.0.9")
            .with_port(10002)
            .with_timeout_ms(750);
        let sender = ProgramSender::new(config).unwrap();
        let request = sender
            .prepare("/tmp/O1234.NC", "G00 X0 Y0", CancellationToken::new())
            .unwrap();

        assert_eq!(request.target().to_string(), "10.0.0.9:10002");
        assert_eq!(request.timeout(), Duration::from_millis(750));
        assert_eq!(request.frame().program_name().as_str(), "O1234");
        assert!(request.frame().to_string().starts_with("%CSAV    O1234     \r\n"));
    }

    #[test]
    fn test_prepare_reports_validation_error() {
        let sender = ProgramSender::new(TransferConfig::new("cnc")).unwrap();
        let err = sender
            .prepare("O123456789.NC", "", CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { .. }));
    }

    #[test]
    fn test_new_session_is_idle() {
        let sender = ProgramSender::new(TransferConfig::new("cnc")).unwrap();
        let request = sender
            .prepare("O1.NC", "", CancellationToken::new())
            .unwrap();
        let session = TransferSession::new(request);
        assert_eq!(session.state(), &SessionState::Idle);
    }
}
