use crate::addr::{AddressFamily, BindInterface, GenericSockAddr, UdpEndpoint};
use crate::error::{Error, Result, report};
use crate::sys::{NativeSocket, SockType};
use super::config::BufferConfig;
use super::slot::HandleSlot;
use super::DatagramSocket;

/// An unconnected UDP socket.
///
/// Every send names its destination. Bind to a known address if datagrams
/// are expected; an unbound socket gets an ephemeral port on first send.
pub struct UdpSocket {
	slot: HandleSlot,
	family: AddressFamily,
}

impl UdpSocket {
	pub fn init(family: AddressFamily, bind: Option<&BindInterface>) -> Result<Self> {
		Self::init_with(family, bind, &BufferConfig::default())
	}

	/// Like [`init`](Self::init) with explicit buffer sizes.
	pub fn init_with(
		family: AddressFamily,
		bind: Option<&BindInterface>,
		buffers: &BufferConfig,
	) -> Result<Self> {
		if let Some(local) = bind {
			if local.family() != family {
				return Err(report(Error::FamilyMismatch { expected: family, found: local.family() }));
			}
		}

		let socket = NativeSocket::new(family, SockType::Datagram)
			.map_err(|code| report(Error::Create { code }))?;
		buffers.apply(&socket)?;

		if let Some(local) = bind {
			socket
				.bind(&local.to_native()?)
				.map_err(|code| report(Error::Bind { code, addr: local.to_string() }))?;
			log::debug!("udp socket bound to {}", local);
		}

		Ok(Self { slot: HandleSlot::new(socket), family })
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}
}

impl_socket!(UdpSocket);

impl DatagramSocket for UdpSocket {
	fn send_to(&self, buf: &[u8], endpoint: &UdpEndpoint) -> Result<usize> {
		send_datagram(&self.slot, self.family, buf, endpoint)
	}

	fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, UdpEndpoint)> {
		recv_datagram(&self.slot, self.family, buf)
	}

	fn recv(&self, buf: &mut [u8]) -> Result<usize> {
		recv_datagram_anonymous(&self.slot, buf)
	}
}

impl std::fmt::Debug for UdpSocket {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UdpSocket")
			.field("family", &self.family)
			.field("closed", &self.slot.is_closed())
			.finish()
	}
}

// Shared with MulticastSocket.

pub(super) fn send_datagram(
	slot: &HandleSlot,
	family: AddressFamily,
	buf: &[u8],
	endpoint: &UdpEndpoint,
) -> Result<usize> {
	if endpoint.family() != family {
		return Err(report(Error::FamilyMismatch { expected: family, found: endpoint.family() }));
	}
	let to = endpoint.to_native()?;
	slot.with(|socket| socket.send_to(buf, &to).map_err(|code| report(Error::Send { code })))
}

pub(super) fn recv_datagram(
	slot: &HandleSlot,
	family: AddressFamily,
	buf: &mut [u8],
) -> Result<(usize, UdpEndpoint)> {
	slot.with(|socket| {
		let (n, from) = socket.recv_from(buf).map_err(|code| report(Error::Recv { code }))?;
		let sender = GenericSockAddr::try_from_native(&from, family).map_err(report)?;
		Ok((n, sender))
	})
}

pub(super) fn recv_datagram_anonymous(slot: &HandleSlot, buf: &mut [u8]) -> Result<usize> {
	slot.with(|socket| socket.recv(buf).map_err(|code| report(Error::Recv { code })))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::socket::Socket;

	#[test]
	fn send_to_other_family_is_rejected() {
		crate::init_resources().unwrap();
		let socket = UdpSocket::init(AddressFamily::Ipv4, None).unwrap();
		let v6 = GenericSockAddr::localhost(AddressFamily::Ipv6, 9);
		let err = socket.send_to(b"x", &v6).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::FamilyMismatch);
	}

	#[test]
	fn closed_socket_refuses_io() {
		crate::init_resources().unwrap();
		let bind = GenericSockAddr::localhost(AddressFamily::Ipv4, 0);
		let socket = UdpSocket::init(AddressFamily::Ipv4, Some(&bind)).unwrap();
		let target = socket.local_addr().unwrap();
		socket.close().unwrap();

		let mut buf = [0u8; 8];
		assert_eq!(socket.send_to(b"x", &target).unwrap_err().kind(), ErrorKind::Closed);
		assert_eq!(socket.recv_from(&mut buf).unwrap_err().kind(), ErrorKind::Closed);
		assert_eq!(socket.recv(&mut buf).unwrap_err().kind(), ErrorKind::Closed);
		assert!(socket.close().is_ok());
	}
}
