//! Address families and the generic address representation.
//!
//! Callers never see a native `sockaddr`. They work with
//! [`GenericSockAddr`], an (address family, textual IP, port) triple, and the
//! crate translates it to and from the platform layout at the syscall edge.

mod group;
mod text;

pub use self::group::MulticastGroup;
pub use self::text::{IpText, MAX_IP_TEXT_LEN};

use std::fmt;
use std::net::{IpAddr, SocketAddr, SocketAddrV4, SocketAddrV6};

use crate::error::{Error, Result};
use crate::sys;

/// Address family of a socket or address.
///
/// Only IPv4 and IPv6 are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
	/// Internet Protocol version 4 (e.g. 192.168.1.1).
	Ipv4,
	/// Internet Protocol version 6 (e.g. ::1).
	Ipv6,
}

impl AddressFamily {
	/// Family of a parsed IP address.
	pub fn of(ip: &IpAddr) -> Self {
		match ip {
			IpAddr::V4(_) => AddressFamily::Ipv4,
			IpAddr::V6(_) => AddressFamily::Ipv6,
		}
	}

	/// The unspecified ("any") address of this family.
	pub fn unspecified(self) -> IpAddr {
		match self {
			AddressFamily::Ipv4 => IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
			AddressFamily::Ipv6 => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
		}
	}

	/// Parses `text` as an address of this family.
	pub(crate) fn parse(self, text: &str) -> Result<IpAddr> {
		let ip: IpAddr = text.parse().map_err(|_| Error::AddressParse {
			family: self,
			addr: text.to_owned(),
			reason: "not a valid textual IP address",
		})?;
		if AddressFamily::of(&ip) != self {
			return Err(Error::AddressParse {
				family: self,
				addr: text.to_owned(),
				reason: "address belongs to the other family",
			});
		}
		Ok(ip)
	}
}

impl fmt::Display for AddressFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AddressFamily::Ipv4 => f.write_str("IPv4"),
			AddressFamily::Ipv6 => f.write_str("IPv6"),
		}
	}
}

/// A platform-neutral socket address: family, canonical IP text and port.
///
/// Values are always fully valid: construction parses the text, checks it
/// against the family and stores the canonical rendering (`"::0001"` becomes
/// `"::1"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericSockAddr {
	family: AddressFamily,
	ip: IpText,
	port: u16,
}

/// A local interface address to bind to before connect, listen or receive.
pub type BindInterface = GenericSockAddr;

/// Destination of a `send_to`, or the sender reported by `recv_from`.
pub type UdpEndpoint = GenericSockAddr;

impl GenericSockAddr {
	/// Creates an address from text.
	///
	/// Fails with [`Error::AddressParse`] if `ip` is malformed or not an
	/// address of `family`.
	pub fn new(family: AddressFamily, ip: &str, port: u16) -> Result<Self> {
		let parsed = family.parse(ip)?;
		Ok(Self { family, ip: IpText::from_ip(parsed), port })
	}

	/// Loopback address of `family` (`127.0.0.1` / `::1`).
	pub fn localhost(family: AddressFamily, port: u16) -> Self {
		let ip = match family {
			AddressFamily::Ipv4 => IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
			AddressFamily::Ipv6 => IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
		};
		Self::from(SocketAddr::new(ip, port))
	}

	/// Unspecified address of `family`, used to bind on every interface.
	pub fn unspecified(family: AddressFamily, port: u16) -> Self {
		Self::from(SocketAddr::new(family.unspecified(), port))
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}

	/// Canonical IP text.
	pub fn ip(&self) -> &str {
		self.ip.as_str()
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	/// Converts to a std socket address.
	pub fn to_socket_addr(&self) -> Result<SocketAddr> {
		let ip = self.family.parse(self.ip.as_str())?;
		Ok(SocketAddr::new(ip, self.port))
	}

	/// Translates to the platform sockaddr layout.
	pub(crate) fn to_native(&self) -> Result<sys::SockAddr> {
		Ok(sys::SockAddr::from_std(&self.to_socket_addr()?))
	}

	/// Translates a platform sockaddr. `None` for any family other than
	/// AF_INET / AF_INET6.
	pub(crate) fn from_native(native: &sys::SockAddr) -> Option<Self> {
		native.to_std().map(Self::from)
	}

	/// Like [`from_native`](Self::from_native) but reports an unexpected
	/// family as an error against the socket's own `family`.
	pub(crate) fn try_from_native(native: &sys::SockAddr, family: AddressFamily) -> Result<Self> {
		Self::from_native(native).ok_or_else(|| Error::AddressParse {
			family,
			addr: String::from("<native>"),
			reason: "unsupported address family in native address",
		})
	}
}

impl From<SocketAddr> for GenericSockAddr {
	fn from(addr: SocketAddr) -> Self {
		Self {
			family: AddressFamily::of(&addr.ip()),
			ip: IpText::from_ip(addr.ip()),
			port: addr.port(),
		}
	}
}

impl From<SocketAddrV4> for GenericSockAddr {
	fn from(addr: SocketAddrV4) -> Self {
		Self::from(SocketAddr::V4(addr))
	}
}

impl From<SocketAddrV6> for GenericSockAddr {
	fn from(addr: SocketAddrV6) -> Self {
		Self::from(SocketAddr::V6(addr))
	}
}

impl TryFrom<GenericSockAddr> for SocketAddr {
	type Error = Error;

	fn try_from(addr: GenericSockAddr) -> Result<Self> {
		addr.to_socket_addr()
	}
}

impl fmt::Display for GenericSockAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.family {
			AddressFamily::Ipv4 => write!(f, "{}:{}", self.ip, self.port),
			AddressFamily::Ipv6 => write!(f, "[{}]:{}", self.ip, self.port),
		}
	}
}

impl fmt::Debug for GenericSockAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenericSockAddr")
			.field("family", &self.family)
			.field("ip", &self.ip)
			.field("port", &self.port)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn native_round_trip_keeps_every_field() {
		let cases = [
			(AddressFamily::Ipv4, "192.168.1.20", 8080),
			(AddressFamily::Ipv4, "0.0.0.0", 0),
			(AddressFamily::Ipv6, "::1", 65535),
			(AddressFamily::Ipv6, "fe80::abcd:1", 443),
			(AddressFamily::Ipv6, "::ffff:10.1.2.3", 7),
		];
		for (family, ip, port) in cases {
			let generic = GenericSockAddr::new(family, ip, port).unwrap();
			let native = generic.to_native().unwrap();
			let back = GenericSockAddr::from_native(&native).unwrap();
			assert_eq!(back, generic);
			assert_eq!(back.ip(), ip);
			assert_eq!(back.port(), port);
			assert_eq!(back.family(), family);
		}
	}

	#[test]
	fn text_is_canonicalised() {
		let addr = GenericSockAddr::new(AddressFamily::Ipv6, "0:0:0:0:0:0:0:0001", 1).unwrap();
		assert_eq!(addr.ip(), "::1");
		let addr = GenericSockAddr::new(AddressFamily::Ipv6, "2001:DB8::1", 1).unwrap();
		assert_eq!(addr.ip(), "2001:db8::1");
	}

	#[test]
	fn wrong_family_is_rejected() {
		let err = GenericSockAddr::new(AddressFamily::Ipv4, "::1", 80).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
		let err = GenericSockAddr::new(AddressFamily::Ipv6, "127.0.0.1", 80).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
	}

	#[test]
	fn display_brackets_ipv6() {
		let v4 = GenericSockAddr::localhost(AddressFamily::Ipv4, 53);
		let v6 = GenericSockAddr::localhost(AddressFamily::Ipv6, 53);
		assert_eq!(v4.to_string(), "127.0.0.1:53");
		assert_eq!(v6.to_string(), "[::1]:53");
	}
}
