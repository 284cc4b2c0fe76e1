use std::net::{IpAddr, SocketAddr};

use crate::addr::{AddressFamily, GenericSockAddr, MulticastGroup, UdpEndpoint};
use crate::error::{Error, Result, report};
use crate::sys::{self, NativeSocket, SockType};
use super::config::MulticastConfig;
use super::datagram::{recv_datagram, send_datagram};
use super::options;
use super::slot::HandleSlot;
use super::DatagramSocket;

/// A UDP socket joined to one multicast group.
///
/// Bound to the unspecified address on the group's port, so it receives the
/// group's traffic on every interface that joined. `recv_from` reports
/// whoever sent a datagram. With loopback off and a concrete local
/// interface, datagrams carrying this socket's own source address are
/// dropped as well: on a loopback interface the device hands them back even
/// though the kernel's local copy is disabled.
pub struct MulticastSocket {
	slot: HandleSlot,
	family: AddressFamily,
	group: MulticastGroup,
	destination: sys::SockAddr,
	/// Source address of our own sends, filtered on receive when loopback is off.
	own: Option<GenericSockAddr>,
}

impl MulticastSocket {
	/// Creates the socket, binds it and joins `group`.
	///
	/// `ttl` is the hop limit of outgoing datagrams; `loopback` controls
	/// whether this host receives its own sends.
	pub fn init(group: &MulticastGroup, reuse_addr: bool, loopback: bool, ttl: u8) -> Result<Self> {
		let config = MulticastConfig::new().reuse_addr(reuse_addr).loopback(loopback).ttl(ttl);
		Self::init_with(group, &config)
	}

	pub fn init_with(group: &MulticastGroup, config: &MulticastConfig) -> Result<Self> {
		let family = group.family();
		let v6 = family == AddressFamily::Ipv6;
		let group_ip = group.group_ip().map_err(report)?;
		let local_ip = group.local_ip().map_err(report)?;
		let destination = sys::SockAddr::from_std(&group.destination().map_err(report)?);

		let socket = NativeSocket::new(family, SockType::Datagram)
			.map_err(|code| report(Error::Create { code }))?;
		config.apply_pre_bind(&socket)?;

		let any = GenericSockAddr::unspecified(family, group.port());
		socket
			.bind(&any.to_native()?)
			.map_err(|code| report(Error::Bind { code, addr: any.to_string() }))?;

		options::set_multicast_loop(&socket, v6, config.loopback)?;
		options::set_multicast_ttl(&socket, v6, config.ttl)?;

		let index = match local_ip {
			IpAddr::V4(local) => {
				options::set_multicast_if_v4(&socket, local)?;
				0
			}
			IpAddr::V6(local) => {
				let index = sys::interface_index_v6(local).map_err(|code| {
					report(Error::SocketOption { code, option: "IPV6_MULTICAST_IF" })
				})?;
				options::set_multicast_if_v6(&socket, index)?;
				index
			}
		};
		options::join_group(&socket, group_ip, local_ip, index)?;
		log::debug!(
			"joined multicast group {} on {} (port {}, ttl {}, loopback {})",
			group.group(),
			group.local(),
			group.port(),
			config.ttl,
			config.loopback,
		);

		let own = (!config.loopback && !local_ip.is_unspecified())
			.then(|| GenericSockAddr::from(SocketAddr::new(local_ip, group.port())));

		Ok(Self { slot: HandleSlot::new(socket), family, group: *group, destination, own })
	}

	/// Sends one datagram to the group.
	pub fn send(&self, buf: &[u8]) -> Result<usize> {
		self.slot.with(|socket| {
			socket.send_to(buf, &self.destination).map_err(|code| report(Error::Send { code }))
		})
	}

	pub fn group(&self) -> &MulticastGroup {
		&self.group
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}
}

impl_socket!(MulticastSocket);

impl DatagramSocket for MulticastSocket {
	/// Sends to an arbitrary endpoint, e.g. a unicast reply.
	fn send_to(&self, buf: &[u8], endpoint: &UdpEndpoint) -> Result<usize> {
		send_datagram(&self.slot, self.family, buf, endpoint)
	}

	fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, UdpEndpoint)> {
		loop {
			let (n, sender) = recv_datagram(&self.slot, self.family, buf)?;
			if self.own == Some(sender) {
				log::trace!("dropped own datagram from {}", sender);
				continue;
			}
			return Ok((n, sender));
		}
	}

	/// Goes through `recv_from` so own datagrams are filtered here too.
	fn recv(&self, buf: &mut [u8]) -> Result<usize> {
		self.recv_from(buf).map(|(n, _)| n)
	}
}

impl std::fmt::Debug for MulticastSocket {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MulticastSocket")
			.field("group", &self.group)
			.field("closed", &self.slot.is_closed())
			.finish()
	}
}
