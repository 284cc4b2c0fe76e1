use crate::addr::AddressFamily;
use crate::{diag, sys};

/// Result alias used by every operation in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Socket errors.
///
/// Native failures carry the platform error code (`errno` on Unix,
/// `WSAGetLastError()` on Windows) in `code`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid {family} address {addr:?}: {reason}")]
	AddressParse { family: AddressFamily, addr: String, reason: &'static str },

	#[error("address family mismatch: socket is {expected}, address is {found}")]
	FamilyMismatch { expected: AddressFamily, found: AddressFamily },

	#[error("socket() failed: {}", sys::describe(*.code))]
	Create { code: i32 },

	#[error("bind({addr}) failed: {}", sys::describe(*.code))]
	Bind { code: i32, addr: String },

	#[error("listen(backlog={backlog}) failed: {}", sys::describe(*.code))]
	Listen { code: i32, backlog: i32 },

	#[error("connect({addr}) failed: {}", sys::describe(*.code))]
	Connect { code: i32, addr: String },

	#[error("accept() failed: {}", sys::describe(*.code))]
	Accept { code: i32 },

	#[error("send() failed: {}", sys::describe(*.code))]
	Send { code: i32 },

	#[error("recv() failed: {}", sys::describe(*.code))]
	Recv { code: i32 },

	#[error("joining multicast group {group} failed: {}", sys::describe(*.code))]
	JoinGroup { code: i32, group: String },

	#[error("setsockopt({option}) failed: {}", sys::describe(*.code))]
	SocketOption { code: i32, option: &'static str },

	#[error("shutdown() failed: {}", sys::describe(*.code))]
	Shutdown { code: i32 },

	#[error("close() failed: {}", sys::describe(*.code))]
	Close { code: i32 },

	#[error("socket resource bootstrap failed: {}", sys::describe(*.code))]
	Resources { code: i32 },

	#[error("socket is closed")]
	Closed,
}

/// Discriminant of [`Error`], for matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	AddressParse,
	FamilyMismatch,
	Create,
	Bind,
	Listen,
	Connect,
	Accept,
	Send,
	Recv,
	JoinGroup,
	SocketOption,
	Shutdown,
	Close,
	Resources,
	Closed,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::AddressParse { .. } => ErrorKind::AddressParse,
			Error::FamilyMismatch { .. } => ErrorKind::FamilyMismatch,
			Error::Create { .. } => ErrorKind::Create,
			Error::Bind { .. } => ErrorKind::Bind,
			Error::Listen { .. } => ErrorKind::Listen,
			Error::Connect { .. } => ErrorKind::Connect,
			Error::Accept { .. } => ErrorKind::Accept,
			Error::Send { .. } => ErrorKind::Send,
			Error::Recv { .. } => ErrorKind::Recv,
			Error::JoinGroup { .. } => ErrorKind::JoinGroup,
			Error::SocketOption { .. } => ErrorKind::SocketOption,
			Error::Shutdown { .. } => ErrorKind::Shutdown,
			Error::Close { .. } => ErrorKind::Close,
			Error::Resources { .. } => ErrorKind::Resources,
			Error::Closed => ErrorKind::Closed,
		}
	}

	/// Platform error code, if this error came from a native call.
	pub fn code(&self) -> Option<i32> {
		match self {
			Error::Create { code }
			| Error::Bind { code, .. }
			| Error::Listen { code, .. }
			| Error::Connect { code, .. }
			| Error::Accept { code }
			| Error::Send { code }
			| Error::Recv { code }
			| Error::JoinGroup { code, .. }
			| Error::SocketOption { code, .. }
			| Error::Shutdown { code }
			| Error::Close { code }
			| Error::Resources { code } => Some(*code),
			Error::AddressParse { .. } | Error::FamilyMismatch { .. } | Error::Closed => None,
		}
	}

	/// True when a blocking call gave up because its read or write timeout
	/// expired.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Accept { code } | Error::Send { code } | Error::Recv { code } => {
				sys::is_timeout_code(*code)
			}
			_ => false,
		}
	}
}

/// Reports `err` through the diagnostic hook and returns it.
///
/// The hook sees the line of the caller, so every construction site shows up
/// in the diagnostic output.
#[track_caller]
pub(crate) fn report(err: Error) -> Error {
	diag::report(&err);
	err
}

impl From<Error> for std::io::Error {
	fn from(err: Error) -> Self {
		let kind = match &err {
			Error::AddressParse { .. } | Error::FamilyMismatch { .. } => {
				std::io::ErrorKind::InvalidInput
			}
			Error::Closed => std::io::ErrorKind::NotConnected,
			other => match other.code() {
				Some(code) => std::io::Error::from_raw_os_error(code).kind(),
				None => std::io::ErrorKind::Other,
			},
		};
		std::io::Error::new(kind, err)
	}
}
