use std::time::Duration;

use gsocket::{
	AddressFamily, DatagramSocket, Error, ErrorKind, MulticastConfig, MulticastGroup,
	MulticastSocket, Socket,
};

// Hosts without a multicast route (or without IPv6) answer with one of these.
#[cfg(unix)]
const NO_MULTICAST_ROUTE: &[i32] =
	&[libc::ENODEV, libc::ENETUNREACH, libc::EADDRNOTAVAIL, libc::EAFNOSUPPORT];
#[cfg(windows)]
const NO_MULTICAST_ROUTE: &[i32] = &[
	windows_sys::Win32::Networking::WinSock::WSAENETUNREACH,
	windows_sys::Win32::Networking::WinSock::WSAEADDRNOTAVAIL,
	windows_sys::Win32::Networking::WinSock::WSAEAFNOSUPPORT,
];

/// True only for the missing-route case; every other failure is a real one.
fn no_route(err: &Error) -> bool {
	let stage = matches!(
		err.kind(),
		ErrorKind::Create | ErrorKind::Bind | ErrorKind::JoinGroup | ErrorKind::SocketOption | ErrorKind::Send
	);
	let code = err.code().is_some_and(|code| NO_MULTICAST_ROUTE.contains(&code));
	if stage && code {
		eprintln!("skipping: no multicast route: {err}");
	}
	stage && code
}

fn join(
	family: AddressFamily,
	group: &str,
	local: &str,
	port: u16,
	loopback: bool,
) -> Option<MulticastSocket> {
	gsocket::init_resources().unwrap();
	gsocket::set_diagnostic_hook(gsocket::silent_hook);
	let group = MulticastGroup::new(family, group, local, port).unwrap();
	let config = MulticastConfig::new().loopback(loopback);
	match MulticastSocket::init_with(&group, &config) {
		Ok(socket) => Some(socket),
		Err(err) if no_route(&err) => None,
		Err(err) => panic!("multicast setup failed: {err}"),
	}
}

/// Sends once; `false` means the host has no route and the test should end.
fn send_or_skip(socket: &MulticastSocket, payload: &[u8]) -> bool {
	match socket.send(payload) {
		Ok(n) => {
			assert_eq!(n, payload.len());
			true
		}
		Err(err) if no_route(&err) => false,
		Err(err) => panic!("multicast send failed: {err}"),
	}
}

fn port(offset: u16) -> u16 {
	40000 + (std::process::id() % 10000) as u16 + offset
}

#[test]
fn loopback_delivers_own_datagrams() {
	let Some(socket) = join(AddressFamily::Ipv4, "239.255.42.1", "127.0.0.1", port(0), true) else {
		return;
	};
	socket.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
	if !send_or_skip(&socket, b"hello group") {
		return;
	}

	let mut buf = [0u8; 32];
	let (n, from) = socket.recv_from(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"hello group");
	assert_eq!(from.port(), port(0));
	assert_eq!(socket.group().group(), "239.255.42.1");
}

#[test]
fn loopback_off_keeps_own_datagrams_away() {
	let Some(socket) = join(AddressFamily::Ipv4, "239.255.42.2", "127.0.0.1", port(1), false) else {
		return;
	};
	socket.set_read_timeout(Some(Duration::from_millis(300))).unwrap();
	if !send_or_skip(&socket, b"silent") {
		return;
	}

	let mut buf = [0u8; 32];
	let err = socket.recv(&mut buf).unwrap_err();
	assert!(err.is_timeout(), "expected timeout, got {err}");
	let err = socket.recv_from(&mut buf).unwrap_err();
	assert!(err.is_timeout(), "expected timeout, got {err}");
}

#[test]
fn loopback_off_still_receives_other_senders() {
	let Some(quiet) = join(AddressFamily::Ipv4, "239.255.42.4", "127.0.0.1", port(3), false) else {
		return;
	};
	quiet.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

	let other = gsocket::UdpSocket::init(AddressFamily::Ipv4, None).unwrap();
	let target = gsocket::GenericSockAddr::localhost(AddressFamily::Ipv4, port(3));
	other.send_to(b"unicast", &target).unwrap();

	let mut buf = [0u8; 32];
	let (n, from) = quiet.recv_from(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"unicast");
	assert_ne!(from.port(), port(3));
}

#[test]
fn ipv6_group_joins_and_sends() {
	let Some(socket) = join(AddressFamily::Ipv6, "ff02::1:ff42:1", "::", port(4), true) else {
		return;
	};
	assert_eq!(socket.family(), AddressFamily::Ipv6);
	assert_eq!(socket.group().group(), "ff02::1:ff42:1");
	assert_eq!(socket.local_addr().unwrap().port(), port(4));
	send_or_skip(&socket, b"v6 group");
}

#[test]
fn closed_multicast_socket_refuses_send() {
	let Some(socket) = join(AddressFamily::Ipv4, "239.255.42.3", "127.0.0.1", port(2), true) else {
		return;
	};
	socket.close().unwrap();
	assert_eq!(socket.send(b"x").unwrap_err().kind(), ErrorKind::Closed);
	socket.close().unwrap();
}
