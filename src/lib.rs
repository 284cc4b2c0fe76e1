//! One blocking socket API over BSD sockets and Winsock.
//!
//! ```no_run
//! use gsocket::{AddressFamily, Socket, TcpServer, TcpSocket};
//!
//! let _resources = gsocket::Resources::acquire()?;
//! let server = TcpServer::init(AddressFamily::Ipv4, "127.0.0.1", 0, 16)?;
//! let port = server.local_addr()?.port();
//!
//! let client = TcpSocket::init(AddressFamily::Ipv4, "127.0.0.1", port, None)?;
//! let conn = server.accept()?;
//! client.send(b"ping")?;
//!
//! let mut buf = [0u8; 4];
//! let n = conn.recv(&mut buf)?;
//! assert_eq!(&buf[..n], b"ping");
//! # Ok::<(), gsocket::Error>(())
//! ```

pub mod socket;
mod addr;
mod diag;
mod error;
mod lifecycle;
mod sys;

pub use self::addr::{
	AddressFamily, BindInterface, GenericSockAddr, IpText, MAX_IP_TEXT_LEN, MulticastGroup,
	UdpEndpoint,
};
pub use self::diag::{
	DiagnosticHook, default_hook, format_diagnostic, log_hook, reset_diagnostic_hook,
	set_diagnostic_hook, silent_hook,
};
pub use self::error::{Error, ErrorKind, Result};
pub use self::lifecycle::{Resources, close_resources, init_resources};
pub use self::socket::{
	BufferConfig, DatagramSocket, MulticastConfig, MulticastSocket, ServerConfig, Shutdown, Socket,
	TcpConfig, TcpServer, TcpSocket, UdpSocket,
};
