use thiserror::Error;

use crate::db;

/// An error that can occur when working with pledge records
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error {
	kind: ErrorKind,
}

impl Error {
	pub fn new(kind: ErrorKind) -> Error {
		Error { kind }
	}

	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}
}

/// The kind of an error that can occur.
#[derive(Debug, Error)]
pub enum ErrorKind {
	#[error("db error: {0}")]
	Database(db::Error),
	/// Negative monetary or weight value
	#[error("invalid amount: {0}")]
	InvalidAmount(String),
	#[error("invalid date: {0}")]
	InvalidDate(String),
	#[error("{0} must not be blank")]
	MissingField(&'static str),
	#[error("a positive returned amount is required to settle a record")]
	MissingReturnedAmount,
	#[error("record has already been settled")]
	AlreadySettled,
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Self {
		Error::new(kind)
	}
}

impl From<db::Error> for Error {
	fn from(e: db::Error) -> Self {
		Error::new(ErrorKind::Database(e))
	}
}
