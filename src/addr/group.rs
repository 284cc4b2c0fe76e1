use std::net::{IpAddr, SocketAddr};

use super::{AddressFamily, IpText};
use crate::error::{Error, Result};

/// A multicast destination: group address, local interface address and port.
///
/// `local` picks the interface the group is joined on. The unspecified
/// address (`0.0.0.0` / `::`) lets the system choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MulticastGroup {
	family: AddressFamily,
	group: IpText,
	local: IpText,
	port: u16,
}

impl MulticastGroup {
	/// Validates and stores a group description.
	///
	/// Fails with [`Error::AddressParse`] if either address is malformed or
	/// of the wrong family, or if `group` is not a multicast address.
	pub fn new(family: AddressFamily, group: &str, local: &str, port: u16) -> Result<Self> {
		let group_ip = family.parse(group)?;
		if !group_ip.is_multicast() {
			return Err(Error::AddressParse {
				family,
				addr: group.to_owned(),
				reason: "not a multicast group address",
			});
		}
		let local_ip = family.parse(local)?;
		Ok(Self {
			family,
			group: IpText::from_ip(group_ip),
			local: IpText::from_ip(local_ip),
			port,
		})
	}

	pub fn family(&self) -> AddressFamily {
		self.family
	}

	/// Group address text.
	pub fn group(&self) -> &str {
		self.group.as_str()
	}

	/// Local interface address text.
	pub fn local(&self) -> &str {
		self.local.as_str()
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub(crate) fn group_ip(&self) -> Result<IpAddr> {
		self.family.parse(self.group.as_str())
	}

	pub(crate) fn local_ip(&self) -> Result<IpAddr> {
		self.family.parse(self.local.as_str())
	}

	/// Group address and port as the destination of `send`.
	pub(crate) fn destination(&self) -> Result<SocketAddr> {
		Ok(SocketAddr::new(self.group_ip()?, self.port))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn accepts_multicast_groups() {
		let g = MulticastGroup::new(AddressFamily::Ipv4, "239.255.0.1", "127.0.0.1", 5000).unwrap();
		assert_eq!(g.group(), "239.255.0.1");
		assert_eq!(g.local(), "127.0.0.1");
		assert_eq!(g.port(), 5000);
		let g = MulticastGroup::new(AddressFamily::Ipv6, "FF02::1:3", "::", 5355).unwrap();
		assert_eq!(g.group(), "ff02::1:3");
		assert_eq!(g.destination().unwrap().to_string(), "[ff02::1:3]:5355");
	}

	#[test]
	fn rejects_unicast_group() {
		let err = MulticastGroup::new(AddressFamily::Ipv4, "10.0.0.1", "0.0.0.0", 1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
	}

	#[test]
	fn rejects_mixed_families() {
		let err = MulticastGroup::new(AddressFamily::Ipv4, "239.1.1.1", "::1", 1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
		let err = MulticastGroup::new(AddressFamily::Ipv6, "239.1.1.1", "::", 1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse);
	}
}
