//! Native socket backends.
//!
//! Each backend exposes the same crate-private surface: `NativeSocket`,
//! `SockAddr`, `startup`/`cleanup`, `last_error`, `describe`. Calls return the
//! raw platform error code; mapping it onto `Error` happens one level up.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use self::unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use self::windows::*;

/// Result of a native call: the raw errno / WSA error code on failure.
pub(crate) type SysResult<T> = Result<T, i32>;

/// Socket type passed to `socket()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SockType {
	/// Reliable, ordered byte stream (TCP).
	Stream,
	/// Unreliable, unordered packets (UDP).
	Datagram,
}

/// Which direction a blocking timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timeout {
	Read,
	Write,
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use crate::addr::AddressFamily;
	use std::net::SocketAddr;

	#[test]
	fn sockaddr_round_trips_both_families() {
		for text in ["127.0.0.1:8080", "[::1]:9000", "[fe80::1]:53", "0.0.0.0:0"] {
			let addr: SocketAddr = text.parse().unwrap();
			let native = SockAddr::from_std(&addr);
			assert_eq!(native.to_std(), Some(addr));
		}
	}

	#[test]
	fn fresh_socket_reports_bound_address() {
		let socket = NativeSocket::new(AddressFamily::Ipv4, SockType::Datagram).unwrap();
		let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
		socket.bind(&SockAddr::from_std(&any)).unwrap();
		let local = socket.local_addr().unwrap().to_std().unwrap();
		assert_eq!(local.ip(), any.ip());
		assert_ne!(local.port(), 0);
		socket.close().unwrap();
	}

	#[test]
	fn unspecified_v6_interface_is_index_zero() {
		assert_eq!(interface_index_v6(std::net::Ipv6Addr::UNSPECIFIED), Ok(0));
	}
}
