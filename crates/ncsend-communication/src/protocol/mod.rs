//! CSAV frame protocol
//!
//! A transfer is a single text frame:
//!
//! ```text
//! %CSAV    <name padded to 8>  <EOL><program body><EOL><checksum hex>%
//! ```
//!
//! The controller answers with a two-digit result code terminated by a
//! line ending.

pub mod checksum;
pub mod filename;
pub mod frame;
pub mod response;
