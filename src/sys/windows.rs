use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::windows::io::{AsRawSocket, FromRawSocket, IntoRawSocket, OwnedSocket};
use std::time::Duration;

use windows_sys::Win32::Networking::WinSock::{
	self as ws, IN6_ADDR, IN6_ADDR_0, IN_ADDR, IN_ADDR_0, INVALID_SOCKET, IP_MREQ, IPV6_MREQ,
	SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6, SOCKADDR_STORAGE, SOCKET, SOCKET_ERROR, WSADATA,
};

use crate::addr::AddressFamily;
use crate::socket::Shutdown;
use super::{SockType, SysResult, Timeout};

/// Returns the Winsock error code of the last failed call on this thread.
#[inline]
pub(crate) fn last_error() -> i32 {
	unsafe { ws::WSAGetLastError() }
}

/// Requests Winsock 2.2.
pub(crate) fn startup() -> SysResult<()> {
	let mut data: WSADATA = unsafe { std::mem::zeroed() };
	match unsafe { ws::WSAStartup(0x0202, &mut data) } {
		0 => Ok(()),
		code => Err(code),
	}
}

pub(crate) fn cleanup() -> SysResult<()> {
	if unsafe { ws::WSACleanup() } == SOCKET_ERROR { Err(last_error()) } else { Ok(()) }
}

#[inline]
fn cvt(ret: i32) -> SysResult<i32> {
	if ret == SOCKET_ERROR { Err(last_error()) } else { Ok(ret) }
}

#[inline]
fn cvt_len(ret: i32) -> SysResult<usize> {
	if ret == SOCKET_ERROR { Err(last_error()) } else { Ok(ret as usize) }
}

/// Winsock lengths are `i32`; larger buffers are sent in part.
#[inline]
fn clamp_len(len: usize) -> i32 {
	len.min(i32::MAX as usize) as i32
}

/// Native socket address: a `SOCKADDR_STORAGE` plus the length actually used.
#[derive(Clone, Copy)]
pub(crate) struct SockAddr {
	storage: SOCKADDR_STORAGE,
	len: i32,
}

impl SockAddr {
	fn zeroed() -> Self {
		Self {
			storage: unsafe { std::mem::zeroed() },
			len: std::mem::size_of::<SOCKADDR_STORAGE>() as i32,
		}
	}

	pub(crate) fn from_std(addr: &SocketAddr) -> Self {
		let mut out = Self::zeroed();
		match addr {
			SocketAddr::V4(a) => {
				let raw = &mut out.storage as *mut _ as *mut SOCKADDR_IN;
				unsafe {
					(*raw).sin_family = ws::AF_INET;
					(*raw).sin_port = a.port().to_be();
					(*raw).sin_addr = IN_ADDR {
						S_un: IN_ADDR_0 { S_addr: u32::from_ne_bytes(a.ip().octets()) },
					};
				}
				out.len = std::mem::size_of::<SOCKADDR_IN>() as i32;
			}
			SocketAddr::V6(a) => {
				let raw = &mut out.storage as *mut _ as *mut SOCKADDR_IN6;
				unsafe {
					(*raw).sin6_family = ws::AF_INET6;
					(*raw).sin6_port = a.port().to_be();
					(*raw).sin6_flowinfo = a.flowinfo();
					(*raw).sin6_addr = IN6_ADDR { u: IN6_ADDR_0 { Byte: a.ip().octets() } };
					(*raw).Anonymous.sin6_scope_id = a.scope_id();
				}
				out.len = std::mem::size_of::<SOCKADDR_IN6>() as i32;
			}
		}
		out
	}

	pub(crate) fn to_std(&self) -> Option<SocketAddr> {
		match self.storage.ss_family {
			ws::AF_INET => {
				if (self.len as usize) < std::mem::size_of::<SOCKADDR_IN>() {
					return None;
				}
				let raw = unsafe { &*(&self.storage as *const _ as *const SOCKADDR_IN) };
				let ip = Ipv4Addr::from(unsafe { raw.sin_addr.S_un.S_addr }.to_ne_bytes());
				Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(raw.sin_port))))
			}
			ws::AF_INET6 => {
				if (self.len as usize) < std::mem::size_of::<SOCKADDR_IN6>() {
					return None;
				}
				let raw = unsafe { &*(&self.storage as *const _ as *const SOCKADDR_IN6) };
				Some(SocketAddr::V6(SocketAddrV6::new(
					Ipv6Addr::from(unsafe { raw.sin6_addr.u.Byte }),
					u16::from_be(raw.sin6_port),
					raw.sin6_flowinfo,
					unsafe { raw.Anonymous.sin6_scope_id },
				)))
			}
			_ => None,
		}
	}

	#[inline]
	fn as_ptr(&self) -> *const SOCKADDR {
		&self.storage as *const _ as *const SOCKADDR
	}

	#[inline]
	fn as_mut_ptr(&mut self) -> *mut SOCKADDR {
		&mut self.storage as *mut _ as *mut SOCKADDR
	}
}

/// An open Winsock socket, closed with `closesocket` when dropped.
pub(crate) struct NativeSocket {
	socket: OwnedSocket,
}

impl NativeSocket {
	/// Creates a non-inheritable socket. Fails with WSANOTINITIALISED if
	/// `startup` has not run.
	pub(crate) fn new(family: AddressFamily, ty: SockType) -> SysResult<Self> {
		let af = match family {
			AddressFamily::Ipv4 => ws::AF_INET,
			AddressFamily::Ipv6 => ws::AF_INET6,
		};
		let ty = match ty {
			SockType::Stream => ws::SOCK_STREAM,
			SockType::Datagram => ws::SOCK_DGRAM,
		};
		let raw = unsafe {
			ws::WSASocketW(
				af as i32,
				ty as i32,
				0,
				std::ptr::null(),
				0,
				ws::WSA_FLAG_NO_HANDLE_INHERIT,
			)
		};
		if raw == INVALID_SOCKET {
			return Err(last_error());
		}
		Ok(Self::from_raw(raw))
	}

	fn from_raw(raw: SOCKET) -> Self {
		Self { socket: unsafe { OwnedSocket::from_raw_socket(raw as _) } }
	}

	#[inline]
	pub(crate) fn raw(&self) -> SOCKET {
		self.socket.as_raw_socket() as SOCKET
	}

	pub(crate) fn bind(&self, addr: &SockAddr) -> SysResult<()> {
		cvt(unsafe { ws::bind(self.raw(), addr.as_ptr(), addr.len) }).map(drop)
	}

	pub(crate) fn connect(&self, addr: &SockAddr) -> SysResult<()> {
		cvt(unsafe { ws::connect(self.raw(), addr.as_ptr(), addr.len) }).map(drop)
	}

	pub(crate) fn listen(&self, backlog: i32) -> SysResult<()> {
		cvt(unsafe { ws::listen(self.raw(), backlog) }).map(drop)
	}

	pub(crate) fn accept(&self) -> SysResult<(NativeSocket, SockAddr)> {
		let mut peer = SockAddr::zeroed();
		let raw = unsafe { ws::accept(self.raw(), peer.as_mut_ptr(), &mut peer.len) };
		if raw == INVALID_SOCKET {
			return Err(last_error());
		}
		Ok((Self::from_raw(raw), peer))
	}

	pub(crate) fn send(&self, buf: &[u8]) -> SysResult<usize> {
		cvt_len(unsafe { ws::send(self.raw(), buf.as_ptr(), clamp_len(buf.len()), 0) })
	}

	pub(crate) fn recv(&self, buf: &mut [u8]) -> SysResult<usize> {
		cvt_len(unsafe { ws::recv(self.raw(), buf.as_mut_ptr(), clamp_len(buf.len()), 0) })
	}

	pub(crate) fn send_to(&self, buf: &[u8], to: &SockAddr) -> SysResult<usize> {
		cvt_len(unsafe {
			ws::sendto(self.raw(), buf.as_ptr(), clamp_len(buf.len()), 0, to.as_ptr(), to.len)
		})
	}

	pub(crate) fn recv_from(&self, buf: &mut [u8]) -> SysResult<(usize, SockAddr)> {
		let mut from = SockAddr::zeroed();
		let n = cvt_len(unsafe {
			ws::recvfrom(
				self.raw(),
				buf.as_mut_ptr(),
				clamp_len(buf.len()),
				0,
				from.as_mut_ptr(),
				&mut from.len,
			)
		})?;
		Ok((n, from))
	}

	pub(crate) fn shutdown(&self, how: Shutdown) -> SysResult<()> {
		let how = match how {
			Shutdown::Read => ws::SD_RECEIVE,
			Shutdown::Write => ws::SD_SEND,
			Shutdown::ReadWrite => ws::SD_BOTH,
		};
		cvt(unsafe { ws::shutdown(self.raw(), how as _) }).map(drop)
	}

	pub(crate) fn local_addr(&self) -> SysResult<SockAddr> {
		let mut addr = SockAddr::zeroed();
		cvt(unsafe { ws::getsockname(self.raw(), addr.as_mut_ptr(), &mut addr.len) })?;
		Ok(addr)
	}

	pub(crate) fn peer_addr(&self) -> SysResult<SockAddr> {
		let mut addr = SockAddr::zeroed();
		cvt(unsafe { ws::getpeername(self.raw(), addr.as_mut_ptr(), &mut addr.len) })?;
		Ok(addr)
	}

	pub(crate) fn close(self) -> SysResult<()> {
		let raw = self.socket.into_raw_socket() as SOCKET;
		cvt(unsafe { ws::closesocket(raw) }).map(drop)
	}

	fn setsockopt<T>(&self, level: i32, name: i32, value: T) -> SysResult<()> {
		cvt(unsafe {
			ws::setsockopt(
				self.raw(),
				level,
				name,
				&value as *const T as *const u8,
				std::mem::size_of::<T>() as i32,
			)
		})
		.map(drop)
	}

	pub(crate) fn set_reuse_addr(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(ws::SOL_SOCKET as i32, ws::SO_REUSEADDR as i32, enable as i32)
	}

	/// Winsock shares ports through SO_REUSEADDR alone.
	pub(crate) fn set_reuse_port(&self, _enable: bool) -> SysResult<()> {
		Ok(())
	}

	pub(crate) fn set_nodelay(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_TCP as i32, ws::TCP_NODELAY as i32, enable as i32)
	}

	pub(crate) fn set_linger(&self, linger: Option<Duration>) -> SysResult<()> {
		let val = match linger {
			None => ws::LINGER { l_onoff: 0, l_linger: 0 },
			Some(d) => ws::LINGER { l_onoff: 1, l_linger: d.as_secs().min(u16::MAX as u64) as u16 },
		};
		self.setsockopt(ws::SOL_SOCKET as i32, ws::SO_LINGER as i32, val)
	}

	pub(crate) fn set_recv_buffer_size(&self, size: usize) -> SysResult<()> {
		self.setsockopt(ws::SOL_SOCKET as i32, ws::SO_RCVBUF as i32, clamp_len(size))
	}

	pub(crate) fn set_send_buffer_size(&self, size: usize) -> SysResult<()> {
		self.setsockopt(ws::SOL_SOCKET as i32, ws::SO_SNDBUF as i32, clamp_len(size))
	}

	/// Winsock takes milliseconds as a DWORD; 0 means no timeout, so a
	/// zero duration is rounded up to 1ms.
	pub(crate) fn set_timeout(&self, which: Timeout, timeout: Option<Duration>) -> SysResult<()> {
		let name = match which {
			Timeout::Read => ws::SO_RCVTIMEO,
			Timeout::Write => ws::SO_SNDTIMEO,
		};
		let millis: u32 = match timeout {
			None => 0,
			Some(d) => d.as_millis().clamp(1, u32::MAX as u128) as u32,
		};
		self.setsockopt(ws::SOL_SOCKET as i32, name as i32, millis)
	}

	pub(crate) fn set_multicast_loop_v4(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IP as i32, ws::IP_MULTICAST_LOOP as i32, enable as u32)
	}

	pub(crate) fn set_multicast_ttl_v4(&self, ttl: u8) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IP as i32, ws::IP_MULTICAST_TTL as i32, ttl as u32)
	}

	pub(crate) fn set_multicast_if_v4(&self, interface: Ipv4Addr) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IP as i32, ws::IP_MULTICAST_IF as i32, in_addr(interface))
	}

	pub(crate) fn set_multicast_loop_v6(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IPV6 as i32, ws::IPV6_MULTICAST_LOOP as i32, enable as u32)
	}

	pub(crate) fn set_multicast_hops_v6(&self, hops: u8) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IPV6 as i32, ws::IPV6_MULTICAST_HOPS as i32, hops as u32)
	}

	pub(crate) fn set_multicast_if_v6(&self, index: u32) -> SysResult<()> {
		self.setsockopt(ws::IPPROTO_IPV6 as i32, ws::IPV6_MULTICAST_IF as i32, index)
	}

	pub(crate) fn join_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> SysResult<()> {
		let mreq = IP_MREQ { imr_multiaddr: in_addr(group), imr_interface: in_addr(interface) };
		self.setsockopt(ws::IPPROTO_IP as i32, ws::IP_ADD_MEMBERSHIP as i32, mreq)
	}

	pub(crate) fn join_multicast_v6(&self, group: Ipv6Addr, index: u32) -> SysResult<()> {
		let mreq = IPV6_MREQ {
			ipv6mr_multiaddr: IN6_ADDR { u: IN6_ADDR_0 { Byte: group.octets() } },
			ipv6mr_interface: index,
		};
		self.setsockopt(ws::IPPROTO_IPV6 as i32, ws::IPV6_ADD_MEMBERSHIP as i32, mreq)
	}
}

#[inline]
fn in_addr(ip: Ipv4Addr) -> IN_ADDR {
	IN_ADDR { S_un: IN_ADDR_0 { S_addr: u32::from_ne_bytes(ip.octets()) } }
}

/// Only the unspecified address is mapped here (index 0, system default);
/// other addresses need IP Helper, which this backend does not link.
pub(crate) fn interface_index_v6(addr: Ipv6Addr) -> SysResult<u32> {
	if addr.is_unspecified() { Ok(0) } else { Err(ws::WSAEADDRNOTAVAIL) }
}

pub(crate) fn is_timeout_code(code: i32) -> bool {
	code == ws::WSAETIMEDOUT || code == ws::WSAEWOULDBLOCK
}

pub(crate) fn describe(code: i32) -> String {
	std::io::Error::from_raw_os_error(code).to_string()
}
