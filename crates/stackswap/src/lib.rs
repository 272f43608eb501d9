//! Symmetric stackful context switching.
//!
//! A [`Context`] is one saved stack pointer. [`initialize`] builds a resumable context over caller-owned stack
//! memory, and [`transfer`] suspends the running context and resumes another. Everything above that (stack
//! ownership, scheduling, passing data around) belongs to the caller; [`Stack`] and [`Fiber`] are thin helpers for
//! the common case.

use std::{
	alloc::LayoutError,
	fmt::{Debug, Display},
	io,
};

pub mod arch;
mod context;
mod entry;
mod fiber;
mod stack;


pub use crate::{
	context::{destroy, initialize, transfer, Context, Entry},
	entry::{Strategy, STRATEGY},
	fiber::Fiber,
	stack::Stack,
};

#[derive(Clone)]
pub enum Error {
	Layout(LayoutError),
	OutOfMemory { size: usize },
	/// A system call failed with the given `errno`.
	Os { call: &'static str, code: i32 },
	TooSmall { size: usize, min: usize },
}

impl Error {
	/// Captures `errno` right after `call` failed.
	#[cfg(unix)]
	pub(crate) fn last_os(call: &'static str) -> Self {
		Error::Os {
			call,
			code: io::Error::last_os_error().raw_os_error().unwrap_or(0),
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Layout(err) => write!(f, "invalid stack layout: {err}"),
			Error::OutOfMemory { size } => write!(f, "failed to allocate {size} byte stack"),
			Error::Os { call, code } => write!(f, "{call} failed: {}", io::Error::from_raw_os_error(*code)),
			Error::TooSmall { size, min } => write!(f, "stack of {size} bytes is below the {min} byte minimum"),
		}
	}
}

impl Debug for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result { <Self as Display>::fmt(self, f) }
}

impl std::error::Error for Error {}

impl From<LayoutError> for Error {
	fn from(err: LayoutError) -> Self { Error::Layout(err) }
}

impl From<Error> for io::Error {
	fn from(err: Error) -> Self {
		match err {
			Error::OutOfMemory { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err.to_string()),
			Error::Os { code, .. } => io::Error::new(io::Error::from_raw_os_error(code).kind(), err.to_string()),
			_ => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
