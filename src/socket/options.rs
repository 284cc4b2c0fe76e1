use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::error::{Error, Result, report};
use crate::sys::{NativeSocket, SysResult, Timeout};

/// Maps a failed setsockopt onto `Error::SocketOption` naming the option.
#[track_caller]
fn check(result: SysResult<()>, option: &'static str) -> Result<()> {
	match result {
		Ok(()) => Ok(()),
		Err(code) => Err(report(Error::SocketOption { code, option })),
	}
}

/// Sets SO_REUSEADDR.
///
/// Lets a server rebind a port still in TIME_WAIT, and lets several
/// multicast receivers share one port.
pub(crate) fn set_reuse_addr(socket: &NativeSocket, enable: bool) -> Result<()> {
	check(socket.set_reuse_addr(enable), "SO_REUSEADDR")
}

/// Sets SO_REUSEPORT where the platform needs it for shared ports.
pub(crate) fn set_reuse_port(socket: &NativeSocket, enable: bool) -> Result<()> {
	check(socket.set_reuse_port(enable), "SO_REUSEPORT")
}

/// Sets TCP_NODELAY (disables Nagle's algorithm).
pub(crate) fn set_tcp_nodelay(socket: &NativeSocket, enable: bool) -> Result<()> {
	check(socket.set_nodelay(enable), "TCP_NODELAY")
}

/// Sets SO_LINGER:
/// - `None`: close returns at once, unsent data goes out in the background
/// - `Some(0)`: close resets the connection and discards unsent data
/// - `Some(n)`: close blocks up to n seconds for unsent data
pub(crate) fn set_linger(socket: &NativeSocket, linger: Option<Duration>) -> Result<()> {
	check(socket.set_linger(linger), "SO_LINGER")
}

/// Sets SO_RCVBUF. The kernel may round or double the value.
pub(crate) fn set_recv_buffer_size(socket: &NativeSocket, size: usize) -> Result<()> {
	check(socket.set_recv_buffer_size(size), "SO_RCVBUF")
}

/// Sets SO_SNDBUF.
pub(crate) fn set_send_buffer_size(socket: &NativeSocket, size: usize) -> Result<()> {
	check(socket.set_send_buffer_size(size), "SO_SNDBUF")
}

pub(crate) fn set_read_timeout(socket: &NativeSocket, timeout: Option<Duration>) -> Result<()> {
	check(socket.set_timeout(Timeout::Read, timeout), "SO_RCVTIMEO")
}

pub(crate) fn set_write_timeout(socket: &NativeSocket, timeout: Option<Duration>) -> Result<()> {
	check(socket.set_timeout(Timeout::Write, timeout), "SO_SNDTIMEO")
}

/// Whether datagrams this host sends to a group are delivered back to it.
pub(crate) fn set_multicast_loop(socket: &NativeSocket, v6: bool, enable: bool) -> Result<()> {
	if v6 {
		check(socket.set_multicast_loop_v6(enable), "IPV6_MULTICAST_LOOP")
	} else {
		check(socket.set_multicast_loop_v4(enable), "IP_MULTICAST_LOOP")
	}
}

/// Hop limit of outgoing multicast datagrams. 1 keeps them on the local link.
pub(crate) fn set_multicast_ttl(socket: &NativeSocket, v6: bool, ttl: u8) -> Result<()> {
	if v6 {
		check(socket.set_multicast_hops_v6(ttl), "IPV6_MULTICAST_HOPS")
	} else {
		check(socket.set_multicast_ttl_v4(ttl), "IP_MULTICAST_TTL")
	}
}

/// Selects the interface outgoing multicast leaves through.
///
/// An unspecified IPv4 address leaves the routing table in charge.
pub(crate) fn set_multicast_if_v4(socket: &NativeSocket, interface: Ipv4Addr) -> Result<()> {
	if interface.is_unspecified() {
		return Ok(());
	}
	check(socket.set_multicast_if_v4(interface), "IP_MULTICAST_IF")
}

/// Index 0 leaves the choice to the system.
pub(crate) fn set_multicast_if_v6(socket: &NativeSocket, index: u32) -> Result<()> {
	if index == 0 {
		return Ok(());
	}
	check(socket.set_multicast_if_v6(index), "IPV6_MULTICAST_IF")
}

/// Joins `group` on the interface identified by `local` (IPv4) or
/// `index` (IPv6).
pub(crate) fn join_group(
	socket: &NativeSocket,
	group: IpAddr,
	local: IpAddr,
	index: u32,
) -> Result<()> {
	let result = match (group, local) {
		(IpAddr::V4(group), IpAddr::V4(local)) => socket.join_multicast_v4(group, local),
		(IpAddr::V6(group), _) => socket.join_multicast_v6(group, index),
		(IpAddr::V4(_), IpAddr::V6(_)) => {
			return Err(report(Error::FamilyMismatch {
				expected: crate::AddressFamily::Ipv4,
				found: crate::AddressFamily::Ipv6,
			}));
		}
	};
	result.map_err(|code| report(Error::JoinGroup { code, group: group.to_string() }))
}
