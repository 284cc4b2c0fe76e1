use std::io::{Read, Write};

use crate::addr::{AddressFamily, BindInterface, GenericSockAddr};
use crate::error::{Error, Result, report};
use crate::sys::{NativeSocket, SockType};
use super::config::TcpConfig;
use super::slot::HandleSlot;

/// A connected TCP stream.
///
/// Created by [`TcpSocket::init`] (client) or [`TcpServer::accept`]
/// (server side). The handle is owned exclusively and released by
/// [`close`](super::Socket::close) or on drop.
///
/// [`TcpServer::accept`]: super::TcpServer::accept
pub struct TcpSocket {
	slot: HandleSlot,
	family: AddressFamily,
}

impl TcpSocket {
	/// Connects to `(ip, port)`, first binding to `bind` if given.
	///
	/// On failure the native handle is released; no half-initialised socket
	/// is ever returned.
	pub fn init(
		family: AddressFamily,
		ip: &str,
		port: u16,
		bind: Option<&BindInterface>,
	) -> Result<Self> {
		Self::init_with(family, ip, port, bind, &TcpConfig::default())
	}

	/// Like [`init`](Self::init) with socket options applied before connect.
	pub fn init_with(
		family: AddressFamily,
		ip: &str,
		port: u16,
		bind: Option<&BindInterface>,
		config: &TcpConfig,
	) -> Result<Self> {
		let remote = GenericSockAddr::new(family, ip, port).map_err(report)?;
		if let Some(local) = bind {
			if local.family() != family {
				return Err(report(Error::FamilyMismatch { expected: family, found: local.family() }));
			}
		}

		let socket = NativeSocket::new(family, SockType::Stream)
			.map_err(|code| report(Error::Create { code }))?;
		config.apply(&socket)?;

		if let Some(local) = bind {
			socket
				.bind(&local.to_native()?)
				.map_err(|code| report(Error::Bind { code, addr: local.to_string() }))?;
			log::trace!("tcp socket bound to {}", local);
		}

		socket
			.connect(&remote.to_native()?)
			.map_err(|code| report(Error::Connect { code, addr: remote.to_string() }))?;
		log::debug!("tcp socket connected to {}", remote);

		Ok(Self::from_native(socket, family))
	}

	/// Wraps a handle produced by `accept`.
	pub(crate) fn from_native(socket: NativeSocket, family: AddressFamily) -> Self {
		Self { slot: HandleSlot::new(socket), family }
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}

	/// Sends up to `buf.len()` bytes in one blocking call.
	///
	/// Returns the number of bytes the stack accepted, which may be less
	/// than `buf.len()`.
	pub fn send(&self, buf: &[u8]) -> Result<usize> {
		self.slot.with(|socket| socket.send(buf).map_err(|code| report(Error::Send { code })))
	}

	/// Receives at most `buf.len()` bytes in one blocking call.
	///
	/// `Ok(0)` means the peer shut down its sending side in order; it is not
	/// an error.
	pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
		self.slot.with(|socket| socket.recv(buf).map_err(|code| report(Error::Recv { code })))
	}

	/// Remote address of this connection.
	pub fn peer_addr(&self) -> Result<GenericSockAddr> {
		self.slot.with(|socket| {
			let native = socket.peer_addr().map_err(|code| {
				report(Error::SocketOption { code, option: "getpeername" })
			})?;
			GenericSockAddr::try_from_native(&native, self.family)
		})
	}
}

impl_socket!(TcpSocket);

impl Read for &TcpSocket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		Ok(TcpSocket::recv(*self, buf)?)
	}
}

impl Write for &TcpSocket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		Ok(TcpSocket::send(*self, buf)?)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(()) // nothing is buffered at this level
	}
}

impl Read for TcpSocket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		(&*self).read(buf)
	}
}

impl Write for TcpSocket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		(&*self).write(buf)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl std::fmt::Debug for TcpSocket {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TcpSocket")
			.field("family", &self.family)
			.field("closed", &self.slot.is_closed())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn malformed_ip_fails_before_any_syscall() {
		let err = TcpSocket::init(AddressFamily::Ipv4, "300.1.1.1", 80, None).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
	}

	#[test]
	fn bind_interface_must_match_family() {
		let local = GenericSockAddr::localhost(AddressFamily::Ipv6, 0);
		let err = TcpSocket::init(AddressFamily::Ipv4, "127.0.0.1", 1, Some(&local)).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::FamilyMismatch);
	}
}
