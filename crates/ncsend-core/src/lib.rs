//! # ncsend Core
//!
//! Error types shared across the ncsend workspace.
//! Validation failures are raised before any network activity; connection
//! failures are produced by the transport and folded into a transfer outcome
//! by the session layer.

pub mod error;

pub use error::{ConnectionError, Error, Result, ValidationError};
