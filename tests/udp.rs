use std::thread;
use std::time::Duration;

use gsocket::{
	AddressFamily, BufferConfig, DatagramSocket, ErrorKind, GenericSockAddr, Socket, UdpSocket,
};

const WAIT: Option<Duration> = Some(Duration::from_secs(5));

fn bound(family: AddressFamily) -> UdpSocket {
	gsocket::init_resources().unwrap();
	gsocket::set_diagnostic_hook(gsocket::silent_hook);
	let local = GenericSockAddr::localhost(family, 0);
	let socket = UdpSocket::init(family, Some(&local)).unwrap();
	socket.set_read_timeout(WAIT).unwrap();
	socket
}

#[test]
fn datagram_arrives_intact_with_sender_port() {
	let a = bound(AddressFamily::Ipv4);
	let b = bound(AddressFamily::Ipv4);
	let a_addr = a.local_addr().unwrap();
	let b_addr = b.local_addr().unwrap();

	let payload = b"the quick brown fox";
	assert_eq!(a.send_to(payload, &b_addr).unwrap(), payload.len());

	let mut buf = [0u8; 64];
	let (n, from) = b.recv_from(&mut buf).unwrap();
	assert_eq!(&buf[..n], payload);
	assert_eq!(from.port(), a_addr.port());
	assert_eq!(from, a_addr);
}

#[test]
fn ipv6_loopback_exchange() {
	gsocket::init_resources().unwrap();
	let local = GenericSockAddr::localhost(AddressFamily::Ipv6, 0);
	let Ok(a) = UdpSocket::init(AddressFamily::Ipv6, Some(&local)) else {
		eprintln!("skipping: no IPv6 loopback");
		return;
	};
	let b = bound(AddressFamily::Ipv6);
	a.send_to(b"v6", &b.local_addr().unwrap()).unwrap();

	let mut buf = [0u8; 8];
	let n = b.recv(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"v6");
}

#[test]
fn recv_times_out_on_silence() {
	let socket = bound(AddressFamily::Ipv4);
	socket.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
	let mut buf = [0u8; 8];
	let err = socket.recv_from(&mut buf).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Recv);
	assert!(err.is_timeout());
}

#[test]
fn buffer_sizes_are_accepted() {
	gsocket::init_resources().unwrap();
	let local = GenericSockAddr::localhost(AddressFamily::Ipv4, 0);
	let buffers = BufferConfig::new().both(256 * 1024);
	let socket = UdpSocket::init_with(AddressFamily::Ipv4, Some(&local), &buffers).unwrap();
	assert!(!socket.is_closed());
	socket.close().unwrap();
	assert!(socket.is_closed());
}

#[test]
fn close_wakes_blocked_receivers_with_closed() {
	let socket = bound(AddressFamily::Ipv4);
	let (from, plain) = thread::scope(|s| {
		let with_sender = s.spawn(|| {
			let mut buf = [0u8; 8];
			socket.recv_from(&mut buf).map(|(n, _)| n)
		});
		let without_sender = s.spawn(|| {
			let mut buf = [0u8; 8];
			socket.recv(&mut buf)
		});
		thread::sleep(Duration::from_millis(200));
		socket.close().unwrap();
		(with_sender.join().unwrap(), without_sender.join().unwrap())
	});
	assert_eq!(from.unwrap_err().kind(), ErrorKind::Closed);
	assert_eq!(plain.unwrap_err().kind(), ErrorKind::Closed);
}
