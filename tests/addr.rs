use std::net::SocketAddr;

use gsocket::{AddressFamily, ErrorKind, GenericSockAddr, MAX_IP_TEXT_LEN, MulticastGroup};

#[test]
fn valid_pairs_survive_std_round_trip() {
	let cases = [
		(AddressFamily::Ipv4, "10.0.0.1", 1),
		(AddressFamily::Ipv4, "255.255.255.255", 65535),
		(AddressFamily::Ipv6, "2001:db8::8:800:200c:417a", 8080),
		(AddressFamily::Ipv6, "::", 0),
	];
	for (family, ip, port) in cases {
		let addr = GenericSockAddr::new(family, ip, port).unwrap();
		let std_addr = SocketAddr::try_from(addr).unwrap();
		assert_eq!(GenericSockAddr::from(std_addr), addr);
		assert_eq!(addr.ip(), ip);
	}
}

#[test]
fn malformed_text_never_yields_an_address() {
	let bad = [
		(AddressFamily::Ipv4, ""),
		(AddressFamily::Ipv4, "1.2.3"),
		(AddressFamily::Ipv4, "1.2.3.4.5"),
		(AddressFamily::Ipv4, "localhost"),
		(AddressFamily::Ipv6, "1::2::3"),
		(AddressFamily::Ipv6, "gggg::1"),
		(AddressFamily::Ipv6, "10.0.0.1"),
	];
	for (family, ip) in bad {
		let err = GenericSockAddr::new(family, ip, 80).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::AddressParse, "{ip:?} should not parse");
		assert_eq!(err.code(), None);
	}
}

#[test]
fn longest_ipv6_text_fits() {
	let ip = "ffff:ffff:ffff:ffff:ffff:ffff:255.255.255.255";
	assert!(ip.len() < MAX_IP_TEXT_LEN);
	let addr = GenericSockAddr::new(AddressFamily::Ipv6, ip, 1).unwrap();
	assert!(addr.ip().len() < MAX_IP_TEXT_LEN);
}

#[test]
fn multicast_group_rejects_unicast() {
	let err = MulticastGroup::new(AddressFamily::Ipv4, "192.168.0.1", "0.0.0.0", 5000).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::AddressParse);

	let group = MulticastGroup::new(AddressFamily::Ipv6, "ff02::1:3", "::", 5355).unwrap();
	assert_eq!(group.group(), "ff02::1:3");
	assert_eq!(group.local(), "::");
	assert_eq!(group.port(), 5355);
}
