use std::time::Duration;

use super::options::{
	set_linger, set_recv_buffer_size, set_reuse_addr, set_reuse_port, set_send_buffer_size,
	set_tcp_nodelay,
};
use crate::error::Result;
use crate::sys::NativeSocket;

/// Kernel socket buffer sizes (SO_RCVBUF / SO_SNDBUF).
///
/// `None` leaves the system default in place. Shared by every socket kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferConfig {
	pub recv: Option<usize>,
	pub send: Option<usize>,
}

impl BufferConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn recv(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self
	}

	pub fn send(mut self, size: usize) -> Self {
		self.send = Some(size);
		self
	}

	/// Same size for both directions.
	pub fn both(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self.send = Some(size);
		self
	}

	pub(crate) fn apply(&self, socket: &NativeSocket) -> Result<()> {
		if let Some(size) = self.recv {
			set_recv_buffer_size(socket, size)?;
		}
		if let Some(size) = self.send {
			set_send_buffer_size(socket, size)?;
		}
		Ok(())
	}
}

/// Options applied to a client `TcpSocket` before it connects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpConfig {
	pub nodelay: bool,
	/// `None` keeps the system default; `Some(linger)` sets SO_LINGER.
	pub linger: Option<Option<Duration>>,
	pub buffers: BufferConfig,
}

impl TcpConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	pub fn linger(mut self, linger: Option<Duration>) -> Self {
		self.linger = Some(linger);
		self
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	pub(crate) fn apply(&self, socket: &NativeSocket) -> Result<()> {
		if self.nodelay {
			set_tcp_nodelay(socket, true)?;
		}
		if let Some(linger) = self.linger {
			set_linger(socket, linger)?;
		}
		self.buffers.apply(socket)
	}
}

/// Options applied to a `TcpServer` before it binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
	pub reuse_addr: bool,
	pub buffers: BufferConfig,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			reuse_addr: true, // restarts must not wait out TIME_WAIT
			buffers: BufferConfig::default(),
		}
	}
}

impl ServerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	pub(crate) fn apply(&self, socket: &NativeSocket) -> Result<()> {
		if self.reuse_addr {
			set_reuse_addr(socket, true)?;
		}
		self.buffers.apply(socket)
	}
}

/// Options of a `MulticastSocket`.
///
/// `reuse_addr` lets several local sockets receive the same group stream,
/// `loopback` delivers this host's own datagrams back to it, and `ttl` is the
/// hop limit (1 keeps traffic on the local link).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulticastConfig {
	pub reuse_addr: bool,
	pub loopback: bool,
	pub ttl: u8,
	pub buffers: BufferConfig,
}

impl Default for MulticastConfig {
	fn default() -> Self {
		Self {
			reuse_addr: true,
			loopback: true,
			ttl: 1,
			buffers: BufferConfig::default(),
		}
	}
}

impl MulticastConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	pub fn loopback(mut self, enable: bool) -> Self {
		self.loopback = enable;
		self
	}

	pub fn ttl(mut self, ttl: u8) -> Self {
		self.ttl = ttl;
		self
	}

	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Socket-level options that must precede bind. Group options are set by
	/// `MulticastSocket` itself since they depend on the family.
	pub(crate) fn apply_pre_bind(&self, socket: &NativeSocket) -> Result<()> {
		if self.reuse_addr {
			set_reuse_addr(socket, true)?;
			set_reuse_port(socket, true)?;
		}
		self.buffers.apply(socket)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn multicast_defaults_stay_on_link() {
		let config = MulticastConfig::default();
		assert_eq!(config.ttl, 1);
		assert!(config.loopback);
		assert!(config.reuse_addr);
	}

	#[test]
	fn builders_chain() {
		let tcp = TcpConfig::new()
			.nodelay(true)
			.linger(Some(Duration::from_secs(0)))
			.buffers(BufferConfig::new().both(64 * 1024));
		assert!(tcp.nodelay);
		assert_eq!(tcp.linger, Some(Some(Duration::ZERO)));
		assert_eq!(tcp.buffers.recv, Some(65536));
		assert_eq!(tcp.buffers.send, Some(65536));
		assert!(!ServerConfig::new().reuse_addr(false).reuse_addr);
	}
}
