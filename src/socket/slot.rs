use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use super::Shutdown;
use crate::error::{Error, Result, report};
use crate::sys::NativeSocket;

/// Owner of one native handle plus its closed state.
///
/// `Some` means open. Every operation runs under the read lock, so send and
/// recv may proceed from two threads at once, while `close` needs the write
/// lock and therefore waits for in-flight calls to return before the handle
/// is released. A handle can never be used after it has been closed.
///
/// `closing` is raised before the pre-close shutdown. A call that returns
/// while it is set was cut short by `close`, whatever the native result
/// looked like, and reports `Error::Closed`.
pub(crate) struct HandleSlot {
	inner: RwLock<Option<NativeSocket>>,
	closing: AtomicBool,
}

impl HandleSlot {
	pub(crate) fn new(socket: NativeSocket) -> Self {
		Self { inner: RwLock::new(Some(socket)), closing: AtomicBool::new(false) }
	}

	/// Runs `f` on the open handle, or fails with `Error::Closed`.
	#[track_caller]
	pub(crate) fn with<T>(&self, f: impl FnOnce(&NativeSocket) -> Result<T>) -> Result<T> {
		if self.closing.load(Ordering::Acquire) {
			return Err(report(Error::Closed));
		}
		let result = {
			let guard = self.inner.read();
			match guard.as_ref() {
				Some(socket) => f(socket),
				None => Err(Error::Closed),
			}
		};
		// Closed is reported after the guard is released
		match result {
			_ if self.closing.load(Ordering::Acquire) => Err(report(Error::Closed)),
			Err(Error::Closed) => Err(report(Error::Closed)),
			other => other,
		}
	}

	/// Lock-free, so it is safe to call from a diagnostic hook or `Debug`.
	pub(crate) fn is_closed(&self) -> bool {
		self.closing.load(Ordering::Acquire)
	}

	/// Releases the handle. A second call is a no-op.
	///
	/// Blocked `recv`/`accept` calls are woken first with a best-effort
	/// shutdown, otherwise the write lock could wait on them forever.
	pub(crate) fn close(&self) -> Result<()> {
		self.closing.store(true, Ordering::Release);
		if let Some(socket) = self.inner.read().as_ref() {
			if let Err(code) = socket.shutdown(Shutdown::ReadWrite) {
				log::trace!("pre-close shutdown returned code {}", code);
			}
		}
		let taken = self.inner.write().take();
		match taken {
			Some(socket) => {
				socket.close().map_err(|code| report(Error::Close { code }))?;
				log::debug!("socket closed");
				Ok(())
			}
			None => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::addr::AddressFamily;
	use crate::error::ErrorKind;
	use crate::sys::SockType;
	use std::thread;
	use std::time::Duration;

	fn slot() -> HandleSlot {
		crate::init_resources().unwrap();
		HandleSlot::new(NativeSocket::new(AddressFamily::Ipv4, SockType::Datagram).unwrap())
	}

	#[test]
	fn is_closed_does_not_wait_for_the_lock() {
		let slot = slot();
		let result = thread::scope(|s| {
			slot.with(|_| {
				// close queues behind this read guard
				s.spawn(|| slot.close().unwrap());
				for _ in 0..500 {
					if slot.is_closed() {
						break;
					}
					thread::sleep(Duration::from_millis(10));
				}
				assert!(slot.is_closed());
				Ok(())
			})
		});
		assert_eq!(result.unwrap_err().kind(), ErrorKind::Closed);
		assert!(slot.is_closed());
	}

	#[test]
	fn calls_after_close_fail_without_touching_the_handle() {
		let slot = slot();
		slot.close().unwrap();
		let err = slot.with(|_| -> Result<()> { unreachable!() }).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Closed);
		slot.close().unwrap();
	}
}
