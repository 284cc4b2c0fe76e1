use crate::addr::{AddressFamily, GenericSockAddr};
use crate::error::{Error, Result, report};
use crate::sys::{NativeSocket, SockType};
use super::config::ServerConfig;
use super::slot::HandleSlot;
use super::stream::TcpSocket;

/// A listening TCP socket.
///
/// Hands out one [`TcpSocket`] per accepted connection. The server itself
/// never sends or receives.
pub struct TcpServer {
	slot: HandleSlot,
	family: AddressFamily,
}

impl TcpServer {
	/// Binds `(ip, port)` and starts listening with room for `backlog`
	/// pending connections.
	///
	/// `SO_REUSEADDR` is set so a restarted server can rebind at once. Port 0
	/// picks an ephemeral port; read it back with
	/// [`local_addr`](super::Socket::local_addr).
	pub fn init(family: AddressFamily, ip: &str, port: u16, backlog: i32) -> Result<Self> {
		Self::init_with(family, ip, port, backlog, &ServerConfig::default())
	}

	/// Like [`init`](Self::init) with explicit options.
	pub fn init_with(
		family: AddressFamily,
		ip: &str,
		port: u16,
		backlog: i32,
		config: &ServerConfig,
	) -> Result<Self> {
		let local = GenericSockAddr::new(family, ip, port).map_err(report)?;

		let socket = NativeSocket::new(family, SockType::Stream)
			.map_err(|code| report(Error::Create { code }))?;
		config.apply(&socket)?;

		socket
			.bind(&local.to_native()?)
			.map_err(|code| report(Error::Bind { code, addr: local.to_string() }))?;
		socket
			.listen(backlog)
			.map_err(|code| report(Error::Listen { code, backlog }))?;
		log::debug!("tcp server listening on {} (backlog {})", local, backlog);

		Ok(Self { slot: HandleSlot::new(socket), family })
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}

	/// Blocks until a client connects.
	///
	/// The returned socket is connected and ready for `send`/`recv`.
	pub fn accept(&self) -> Result<TcpSocket> {
		self.accept_with_addr().map(|(socket, _)| socket)
	}

	/// Like [`accept`](Self::accept), also returning the client's address.
	pub fn accept_with_addr(&self) -> Result<(TcpSocket, GenericSockAddr)> {
		self.slot.with(|socket| {
			let (conn, native) = socket.accept().map_err(|code| report(Error::Accept { code }))?;
			// on failure conn drops here and its handle is released
			let peer = GenericSockAddr::try_from_native(&native, self.family).map_err(report)?;
			log::trace!("accepted connection from {}", peer);
			Ok((TcpSocket::from_native(conn, self.family), peer))
		})
	}
}

impl_socket!(TcpServer);

impl std::fmt::Debug for TcpServer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TcpServer")
			.field("family", &self.family)
			.field("closed", &self.slot.is_closed())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::socket::Socket;

	#[test]
	fn ephemeral_port_is_reported() {
		crate::init_resources().unwrap();
		let server = TcpServer::init(AddressFamily::Ipv4, "127.0.0.1", 0, 8).unwrap();
		let local = server.local_addr().unwrap();
		assert_eq!(local.ip(), "127.0.0.1");
		assert_ne!(local.port(), 0);
	}

	#[test]
	fn wrong_family_text_is_rejected() {
		let err = TcpServer::init(AddressFamily::Ipv6, "127.0.0.1", 0, 8).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
	}

	#[test]
	fn accept_after_close_fails_closed() {
		crate::init_resources().unwrap();
		let server = TcpServer::init(AddressFamily::Ipv4, "127.0.0.1", 0, 8).unwrap();
		server.close().unwrap();
		assert!(server.is_closed());
		assert_eq!(server.accept().unwrap_err().kind(), ErrorKind::Closed);
		server.close().unwrap();
	}
}
