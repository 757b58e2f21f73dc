//! TCP transport and transfer session

pub mod session;
pub mod tcp;
