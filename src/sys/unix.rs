use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::time::Duration;

use crate::addr::AddressFamily;
use crate::socket::Shutdown;
use super::{SockType, SysResult, Timeout};

/// Multicast TTL / loop values are `u_char` on these stacks and `int` elsewhere.
#[cfg(any(
	target_os = "openbsd",
	target_os = "netbsd",
	target_os = "solaris",
	target_os = "illumos"
))]
type McastByte = libc::c_uchar;
#[cfg(not(any(
	target_os = "openbsd",
	target_os = "netbsd",
	target_os = "solaris",
	target_os = "illumos"
)))]
type McastByte = libc::c_int;

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

#[cfg(any(target_os = "linux", target_os = "android"))]
const IPV6_JOIN: libc::c_int = libc::IPV6_ADD_MEMBERSHIP;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const IPV6_JOIN: libc::c_int = libc::IPV6_JOIN_GROUP;

/// Returns the error code of the last failed call on this thread.
#[inline]
pub(crate) fn last_error() -> i32 {
	std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// BSD sockets need no process-wide setup.
pub(crate) fn startup() -> SysResult<()> {
	Ok(())
}

pub(crate) fn cleanup() -> SysResult<()> {
	Ok(())
}

#[inline]
fn cvt(ret: libc::c_int) -> SysResult<libc::c_int> {
	if ret == -1 { Err(last_error()) } else { Ok(ret) }
}

#[inline]
fn cvt_len(ret: libc::ssize_t) -> SysResult<usize> {
	if ret == -1 { Err(last_error()) } else { Ok(ret as usize) }
}

/// Native socket address: a `sockaddr_storage` plus the length actually used.
#[derive(Clone, Copy)]
pub(crate) struct SockAddr {
	storage: libc::sockaddr_storage,
	len: libc::socklen_t,
}

impl SockAddr {
	fn zeroed() -> Self {
		Self {
			storage: unsafe { std::mem::zeroed() },
			len: std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t,
		}
	}

	/// Builds the native form of a std address.
	pub(crate) fn from_std(addr: &SocketAddr) -> Self {
		let mut out = Self::zeroed();
		match addr {
			SocketAddr::V4(a) => {
				let raw = &mut out.storage as *mut _ as *mut libc::sockaddr_in;
				unsafe {
					(*raw).sin_family = libc::AF_INET as libc::sa_family_t;
					(*raw).sin_port = a.port().to_be();
					(*raw).sin_addr = libc::in_addr {
						s_addr: u32::from_be_bytes(a.ip().octets()).to_be(),
					};
				}
				out.len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
			}
			SocketAddr::V6(a) => {
				let raw = &mut out.storage as *mut _ as *mut libc::sockaddr_in6;
				unsafe {
					(*raw).sin6_family = libc::AF_INET6 as libc::sa_family_t;
					(*raw).sin6_port = a.port().to_be();
					(*raw).sin6_flowinfo = a.flowinfo();
					(*raw).sin6_addr = libc::in6_addr { s6_addr: a.ip().octets() };
					(*raw).sin6_scope_id = a.scope_id();
				}
				out.len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
			}
		}
		out
	}

	/// Reads the address back. `None` for other families or a short length.
	pub(crate) fn to_std(&self) -> Option<SocketAddr> {
		match self.storage.ss_family as libc::c_int {
			libc::AF_INET => {
				if (self.len as usize) < std::mem::size_of::<libc::sockaddr_in>() {
					return None;
				}
				let raw = unsafe { &*(&self.storage as *const _ as *const libc::sockaddr_in) };
				let ip = Ipv4Addr::from(raw.sin_addr.s_addr.to_ne_bytes());
				Some(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(raw.sin_port))))
			}
			libc::AF_INET6 => {
				if (self.len as usize) < std::mem::size_of::<libc::sockaddr_in6>() {
					return None;
				}
				let raw = unsafe { &*(&self.storage as *const _ as *const libc::sockaddr_in6) };
				Some(SocketAddr::V6(SocketAddrV6::new(
					Ipv6Addr::from(raw.sin6_addr.s6_addr),
					u16::from_be(raw.sin6_port),
					raw.sin6_flowinfo,
					raw.sin6_scope_id,
				)))
			}
			_ => None,
		}
	}

	#[inline]
	fn as_ptr(&self) -> *const libc::sockaddr {
		&self.storage as *const _ as *const libc::sockaddr
	}

	#[inline]
	fn as_mut_ptr(&mut self) -> *mut libc::sockaddr {
		&mut self.storage as *mut _ as *mut libc::sockaddr
	}
}

/// An open native socket. The descriptor is closed when this is dropped.
pub(crate) struct NativeSocket {
	fd: OwnedFd,
}

impl NativeSocket {
	/// Calls `socket()` with close-on-exec set.
	pub(crate) fn new(family: AddressFamily, ty: SockType) -> SysResult<Self> {
		let domain = match family {
			AddressFamily::Ipv4 => libc::AF_INET,
			AddressFamily::Ipv6 => libc::AF_INET6,
		};
		let ty = match ty {
			SockType::Stream => libc::SOCK_STREAM,
			SockType::Datagram => libc::SOCK_DGRAM,
		};
		let socket = Self::from_raw(cvt(unsafe { libc::socket(domain, ty | cloexec_flag(), 0) })?);
		socket.after_create()?;
		Ok(socket)
	}

	fn from_raw(fd: RawFd) -> Self {
		Self { fd: unsafe { OwnedFd::from_raw_fd(fd) } }
	}

	#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
	fn after_create(&self) -> SysResult<()> {
		Ok(())
	}

	#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
	fn after_create(&self) -> SysResult<()> {
		cvt(unsafe { libc::fcntl(self.raw(), libc::F_SETFD, libc::FD_CLOEXEC) })?;
		#[cfg(any(target_os = "macos", target_os = "ios"))]
		self.setsockopt(libc::SOL_SOCKET, libc::SO_NOSIGPIPE, 1 as libc::c_int)?;
		Ok(())
	}

	#[inline]
	pub(crate) fn raw(&self) -> RawFd {
		self.fd.as_raw_fd()
	}

	pub(crate) fn bind(&self, addr: &SockAddr) -> SysResult<()> {
		cvt(unsafe { libc::bind(self.raw(), addr.as_ptr(), addr.len) }).map(drop)
	}

	pub(crate) fn connect(&self, addr: &SockAddr) -> SysResult<()> {
		cvt(unsafe { libc::connect(self.raw(), addr.as_ptr(), addr.len) }).map(drop)
	}

	pub(crate) fn listen(&self, backlog: i32) -> SysResult<()> {
		cvt(unsafe { libc::listen(self.raw(), backlog) }).map(drop)
	}

	#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
	pub(crate) fn accept(&self) -> SysResult<(NativeSocket, SockAddr)> {
		let mut peer = SockAddr::zeroed();
		let fd = cvt(unsafe {
			libc::accept4(self.raw(), peer.as_mut_ptr(), &mut peer.len, libc::SOCK_CLOEXEC)
		})?;
		Ok((Self::from_raw(fd), peer))
	}

	#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
	pub(crate) fn accept(&self) -> SysResult<(NativeSocket, SockAddr)> {
		let mut peer = SockAddr::zeroed();
		let fd = cvt(unsafe { libc::accept(self.raw(), peer.as_mut_ptr(), &mut peer.len) })?;
		let socket = Self::from_raw(fd);
		socket.after_create()?;
		Ok((socket, peer))
	}

	pub(crate) fn send(&self, buf: &[u8]) -> SysResult<usize> {
		cvt_len(unsafe {
			libc::send(self.raw(), buf.as_ptr() as *const libc::c_void, buf.len(), SEND_FLAGS)
		})
	}

	pub(crate) fn recv(&self, buf: &mut [u8]) -> SysResult<usize> {
		cvt_len(unsafe {
			libc::recv(self.raw(), buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
		})
	}

	pub(crate) fn send_to(&self, buf: &[u8], to: &SockAddr) -> SysResult<usize> {
		cvt_len(unsafe {
			libc::sendto(
				self.raw(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
				SEND_FLAGS,
				to.as_ptr(),
				to.len,
			)
		})
	}

	pub(crate) fn recv_from(&self, buf: &mut [u8]) -> SysResult<(usize, SockAddr)> {
		let mut from = SockAddr::zeroed();
		let n = cvt_len(unsafe {
			libc::recvfrom(
				self.raw(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
				0,
				from.as_mut_ptr(),
				&mut from.len,
			)
		})?;
		Ok((n, from))
	}

	pub(crate) fn shutdown(&self, how: Shutdown) -> SysResult<()> {
		let how = match how {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		};
		cvt(unsafe { libc::shutdown(self.raw(), how) }).map(drop)
	}

	pub(crate) fn local_addr(&self) -> SysResult<SockAddr> {
		let mut addr = SockAddr::zeroed();
		cvt(unsafe { libc::getsockname(self.raw(), addr.as_mut_ptr(), &mut addr.len) })?;
		Ok(addr)
	}

	pub(crate) fn peer_addr(&self) -> SysResult<SockAddr> {
		let mut addr = SockAddr::zeroed();
		cvt(unsafe { libc::getpeername(self.raw(), addr.as_mut_ptr(), &mut addr.len) })?;
		Ok(addr)
	}

	/// Releases the descriptor and reports the result of `close()`.
	pub(crate) fn close(self) -> SysResult<()> {
		let fd = self.fd.into_raw_fd();
		cvt(unsafe { libc::close(fd) }).map(drop)
	}

	fn setsockopt<T>(&self, level: libc::c_int, name: libc::c_int, value: T) -> SysResult<()> {
		cvt(unsafe {
			libc::setsockopt(
				self.raw(),
				level,
				name,
				&value as *const T as *const libc::c_void,
				std::mem::size_of::<T>() as libc::socklen_t,
			)
		})
		.map(drop)
	}

	pub(crate) fn set_reuse_addr(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(libc::SOL_SOCKET, libc::SO_REUSEADDR, enable as libc::c_int)
	}

	/// BSD-derived stacks need SO_REUSEPORT for several receivers on one
	/// multicast port; Linux shares the port with SO_REUSEADDR alone.
	pub(crate) fn set_reuse_port(&self, enable: bool) -> SysResult<()> {
		#[cfg(any(
			target_os = "macos",
			target_os = "ios",
			target_os = "freebsd",
			target_os = "openbsd",
			target_os = "netbsd",
			target_os = "dragonfly"
		))]
		self.setsockopt(libc::SOL_SOCKET, libc::SO_REUSEPORT, enable as libc::c_int)?;
		let _ = enable;
		Ok(())
	}

	pub(crate) fn set_nodelay(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_TCP, libc::TCP_NODELAY, enable as libc::c_int)
	}

	pub(crate) fn set_linger(&self, linger: Option<Duration>) -> SysResult<()> {
		let val = match linger {
			None => libc::linger { l_onoff: 0, l_linger: 0 },
			Some(d) => libc::linger {
				l_onoff: 1,
				l_linger: d.as_secs().min(libc::c_int::MAX as u64) as libc::c_int,
			},
		};
		self.setsockopt(libc::SOL_SOCKET, libc::SO_LINGER, val)
	}

	pub(crate) fn set_recv_buffer_size(&self, size: usize) -> SysResult<()> {
		self.setsockopt(libc::SOL_SOCKET, libc::SO_RCVBUF, size.min(libc::c_int::MAX as usize) as libc::c_int)
	}

	pub(crate) fn set_send_buffer_size(&self, size: usize) -> SysResult<()> {
		self.setsockopt(libc::SOL_SOCKET, libc::SO_SNDBUF, size.min(libc::c_int::MAX as usize) as libc::c_int)
	}

	/// `None` restores fully blocking calls. Zero is rounded up to 1µs,
	/// since a zeroed timeval means "no timeout".
	pub(crate) fn set_timeout(&self, which: Timeout, timeout: Option<Duration>) -> SysResult<()> {
		let name = match which {
			Timeout::Read => libc::SO_RCVTIMEO,
			Timeout::Write => libc::SO_SNDTIMEO,
		};
		let tv = match timeout {
			None => libc::timeval { tv_sec: 0, tv_usec: 0 },
			Some(d) => {
				let mut tv = libc::timeval {
					tv_sec: d.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
					tv_usec: d.subsec_micros() as libc::suseconds_t,
				};
				if tv.tv_sec == 0 && tv.tv_usec == 0 {
					tv.tv_usec = 1;
				}
				tv
			}
		};
		self.setsockopt(libc::SOL_SOCKET, name, tv)
	}

	pub(crate) fn set_multicast_loop_v4(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IP, libc::IP_MULTICAST_LOOP, enable as McastByte)
	}

	pub(crate) fn set_multicast_ttl_v4(&self, ttl: u8) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IP, libc::IP_MULTICAST_TTL, ttl as McastByte)
	}

	pub(crate) fn set_multicast_if_v4(&self, interface: Ipv4Addr) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IP, libc::IP_MULTICAST_IF, in_addr(interface))
	}

	pub(crate) fn set_multicast_loop_v6(&self, enable: bool) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IPV6, libc::IPV6_MULTICAST_LOOP, enable as libc::c_uint)
	}

	pub(crate) fn set_multicast_hops_v6(&self, hops: u8) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IPV6, libc::IPV6_MULTICAST_HOPS, hops as libc::c_int)
	}

	pub(crate) fn set_multicast_if_v6(&self, index: u32) -> SysResult<()> {
		self.setsockopt(libc::IPPROTO_IPV6, libc::IPV6_MULTICAST_IF, index as libc::c_uint)
	}

	pub(crate) fn join_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> SysResult<()> {
		let mreq = libc::ip_mreq {
			imr_multiaddr: in_addr(group),
			imr_interface: in_addr(interface),
		};
		self.setsockopt(libc::IPPROTO_IP, libc::IP_ADD_MEMBERSHIP, mreq)
	}

	pub(crate) fn join_multicast_v6(&self, group: Ipv6Addr, index: u32) -> SysResult<()> {
		let mreq = libc::ipv6_mreq {
			ipv6mr_multiaddr: libc::in6_addr { s6_addr: group.octets() },
			ipv6mr_interface: index as _,
		};
		self.setsockopt(libc::IPPROTO_IPV6, IPV6_JOIN, mreq)
	}
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
#[inline]
fn cloexec_flag() -> libc::c_int {
	libc::SOCK_CLOEXEC
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
#[inline]
fn cloexec_flag() -> libc::c_int {
	0
}

#[inline]
fn in_addr(ip: Ipv4Addr) -> libc::in_addr {
	libc::in_addr { s_addr: u32::from_ne_bytes(ip.octets()) }
}

/// Finds the index of the interface carrying `addr`.
///
/// The unspecified address maps to 0, which lets the kernel pick.
pub(crate) fn interface_index_v6(addr: Ipv6Addr) -> SysResult<u32> {
	if addr.is_unspecified() {
		return Ok(0);
	}
	let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
	cvt(unsafe { libc::getifaddrs(&mut head) })?;

	let mut found = None;
	let mut cursor = head;
	while !cursor.is_null() {
		let entry = unsafe { &*cursor };
		cursor = entry.ifa_next;
		if entry.ifa_addr.is_null() {
			continue;
		}
		let family = unsafe { (*entry.ifa_addr).sa_family } as libc::c_int;
		if family != libc::AF_INET6 {
			continue;
		}
		let raw = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in6) };
		if raw.sin6_addr.s6_addr == addr.octets() {
			let index = unsafe { libc::if_nametoindex(entry.ifa_name) };
			if index != 0 {
				found = Some(index);
			}
			break;
		}
	}
	unsafe { libc::freeifaddrs(head) };
	found.ok_or(libc::ENODEV)
}

/// Platform error codes that signal an expired SO_RCVTIMEO / SO_SNDTIMEO.
pub(crate) fn is_timeout_code(code: i32) -> bool {
	code == libc::EAGAIN || code == libc::EWOULDBLOCK || code == libc::ETIMEDOUT
}

/// Human-readable text for common socket errno values.
pub(crate) fn describe(code: i32) -> String {
	match code {
		libc::EACCES => "permission denied".into(),
		libc::EADDRINUSE => "address already in use".into(),
		libc::EADDRNOTAVAIL => "address not available".into(),
		libc::EAFNOSUPPORT => "address family not supported".into(),
		libc::EAGAIN => "resource temporarily unavailable".into(),
		libc::EBADF => "bad file descriptor".into(),
		libc::ECONNREFUSED => "connection refused".into(),
		libc::ECONNRESET => "connection reset by peer".into(),
		libc::EINTR => "interrupted by signal".into(),
		libc::EINVAL => "invalid argument".into(),
		libc::EMFILE => "too many open files".into(),
		libc::ENETUNREACH => "network unreachable".into(),
		libc::ENOBUFS => "no buffer space available".into(),
		libc::ENODEV => "no such device".into(),
		libc::ENOTCONN => "not connected".into(),
		libc::EPIPE => "broken pipe".into(),
		libc::ETIMEDOUT => "connection timed out".into(),
		_ => std::io::Error::from_raw_os_error(code).to_string(),
	}
}
