//! Validation and state transitions around pledge records.

mod error;
mod service;

pub use error::{Error, ErrorKind};
pub use service::{Dashboard, NewService, RecordInput, RecordQuote, Result, Service, SettleInput};
