//! The four socket kinds and the traits they share.
//!
//! | Kind              | Native type | Operations                                 |
//! |-------------------|-------------|--------------------------------------------|
//! | `TcpSocket`       | stream      | send, recv                                 |
//! | `TcpServer`       | stream      | accept                                     |
//! | `UdpSocket`       | datagram    | send_to, recv_from                         |
//! | `MulticastSocket` | datagram    | send (to group), send_to, recv_from        |
//!
//! Every kind also implements [`Socket`]: shutdown, close, timeouts.

/// Implements [`Socket`] for a kind with `slot: HandleSlot` and
/// `family: AddressFamily` fields.
macro_rules! impl_socket {
	($kind:ty) => {
		impl $crate::socket::Socket for $kind {
			fn shutdown(&self, how: $crate::socket::Shutdown) -> $crate::Result<()> {
				self.slot.with(|socket| {
					socket
						.shutdown(how)
						.map_err(|code| $crate::error::report($crate::Error::Shutdown { code }))
				})
			}

			fn close(&self) -> $crate::Result<()> {
				self.slot.close()
			}

			fn is_closed(&self) -> bool {
				self.slot.is_closed()
			}

			fn local_addr(&self) -> $crate::Result<$crate::GenericSockAddr> {
				self.slot.with(|socket| {
					let native = socket.local_addr().map_err(|code| {
						$crate::error::report($crate::Error::SocketOption { code, option: "getsockname" })
					})?;
					$crate::GenericSockAddr::try_from_native(&native, self.family)
				})
			}

			fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> $crate::Result<()> {
				self.slot.with(|socket| $crate::socket::options::set_read_timeout(socket, timeout))
			}

			fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> $crate::Result<()> {
				self.slot.with(|socket| $crate::socket::options::set_write_timeout(socket, timeout))
			}
		}
	};
}

mod config;
mod datagram;
mod listener;
mod multicast;
mod options;
mod slot;
mod stream;

pub use self::config::{BufferConfig, MulticastConfig, ServerConfig, TcpConfig};
pub use self::datagram::UdpSocket;
pub use self::listener::TcpServer;
pub use self::multicast::MulticastSocket;
pub use self::stream::TcpSocket;

use std::time::Duration;

use crate::addr::{GenericSockAddr, UdpEndpoint};
use crate::error::Result;

/// Which directions `shutdown` disables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	Read,      // SHUT_RD / SD_RECEIVE
	Write,     // SHUT_WR / SD_SEND
	ReadWrite, // SHUT_RDWR / SD_BOTH
}

/// Operations common to every socket kind.
pub trait Socket {
	/// Disables sending and/or receiving without releasing the handle.
	fn shutdown(&self, how: Shutdown) -> Result<()>;

	/// Releases the native handle.
	///
	/// Idempotent: closing twice is `Ok`. Every other operation fails with
	/// `Error::Closed` afterwards. Dropping an open socket closes it too.
	fn close(&self) -> Result<()>;

	fn is_closed(&self) -> bool;

	/// Address the socket is bound to.
	fn local_addr(&self) -> Result<GenericSockAddr>;

	/// Bounds blocking receives (and `accept`). `None` blocks indefinitely.
	fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()>;

	/// Bounds blocking sends. `None` blocks indefinitely.
	fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()>;
}

/// Connectionless send/receive, shared by `UdpSocket` and `MulticastSocket`.
pub trait DatagramSocket: Socket {
	/// Sends one datagram to `endpoint`. Returns the bytes sent.
	fn send_to(&self, buf: &[u8], endpoint: &UdpEndpoint) -> Result<usize>;

	/// Receives one datagram and reports its sender.
	fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, UdpEndpoint)>;

	/// Receives one datagram without asking for the sender.
	fn recv(&self, buf: &mut [u8]) -> Result<usize>;
}
