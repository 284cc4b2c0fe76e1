use std::fmt;
use std::io::Write;
use std::net::IpAddr;

/// Room for the longest textual IPv6 address plus a terminator
/// (`INET6_ADDRSTRLEN`).
pub const MAX_IP_TEXT_LEN: usize = 46;

/// Bounded buffer holding the canonical text of an IP address.
///
/// Only built from a parsed `IpAddr`, so the content is always a valid
/// address. It is `Copy`, like the fixed `char[]` fields of a C sockaddr
/// wrapper.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpText {
	buf: [u8; MAX_IP_TEXT_LEN],
	len: u8,
}

impl IpText {
	pub(crate) fn from_ip(ip: IpAddr) -> Self {
		let mut buf = [0u8; MAX_IP_TEXT_LEN];
		let mut cursor = &mut buf[..];
		// Display output of IpAddr is at most 45 bytes.
		let _ = write!(cursor, "{}", ip);
		let len = (MAX_IP_TEXT_LEN - cursor.len()) as u8;
		Self { buf, len }
	}

	/// Returns the address text.
	pub fn as_str(&self) -> &str {
		std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
	}
}

impl fmt::Display for IpText {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Debug for IpText {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self.as_str(), f)
	}
}

impl AsRef<str> for IpText {
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn longest_ipv6_text_fits() {
		let ip: IpAddr = "ffff:ffff:ffff:ffff:ffff:ffff:255.255.255.255".parse().unwrap();
		let text = IpText::from_ip(ip);
		assert_eq!(text.as_str(), ip.to_string());
		assert!(text.as_str().len() < MAX_IP_TEXT_LEN);
	}

	#[test]
	fn debug_is_quoted_text() {
		let text = IpText::from_ip("10.0.0.1".parse().unwrap());
		assert_eq!(format!("{:?}", text), "\"10.0.0.1\"");
	}
}
