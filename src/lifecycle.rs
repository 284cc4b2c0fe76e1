//! Process-wide bootstrap of the native socket stack.
//!
//! Winsock must be started before the first socket is created and cleaned up
//! after the last one is closed. On Unix both calls succeed without doing
//! anything. Both are idempotent.

use parking_lot::Mutex;

use crate::error::{Error, Result, report};
use crate::sys;

struct Stack {
	started: bool,
	/// Live `Resources` guards. While non-zero the stack stays up.
	guards: usize,
}

static STACK: Mutex<Stack> = parking_lot::const_mutex(Stack { started: false, guards: 0 });

fn start(stack: &mut Stack) -> Result<()> {
	if stack.started {
		return Ok(());
	}
	sys::startup().map_err(|code| report(Error::Resources { code }))?;
	stack.started = true;
	log::debug!("native socket stack started");
	Ok(())
}

fn stop(stack: &mut Stack) -> Result<()> {
	if !stack.started {
		return Ok(());
	}
	sys::cleanup().map_err(|code| report(Error::Resources { code }))?;
	stack.started = false;
	log::debug!("native socket stack released");
	Ok(())
}

/// Starts the native socket stack. Call once from the program's entry point.
pub fn init_resources() -> Result<()> {
	start(&mut STACK.lock())
}

/// Releases the native socket stack. Call after the last socket is closed.
///
/// While a [`Resources`] guard is alive this does nothing; the last guard to
/// drop releases the stack instead.
pub fn close_resources() -> Result<()> {
	let mut stack = STACK.lock();
	if stack.guards > 0 {
		log::debug!("socket stack release deferred to {} live guard(s)", stack.guards);
		return Ok(());
	}
	stop(&mut stack)
}

/// Scoped form of [`init_resources`] / [`close_resources`].
///
/// Guards nest: the stack is released when the last one drops.
///
/// ```no_run
/// fn main() -> gsocket::Result<()> {
///     let _net = gsocket::Resources::acquire()?;
///     // sockets live here
///     Ok(())
/// }
/// ```
#[must_use = "resources are released when the guard is dropped"]
pub struct Resources {
	_priv: (),
}

impl Resources {
	pub fn acquire() -> Result<Self> {
		let mut stack = STACK.lock();
		start(&mut stack)?;
		stack.guards += 1;
		Ok(Self { _priv: () })
	}
}

impl Drop for Resources {
	fn drop(&mut self) {
		let mut stack = STACK.lock();
		stack.guards = stack.guards.saturating_sub(1);
		if stack.guards > 0 {
			return;
		}
		if let Err(err) = stop(&mut stack) {
			log::warn!("releasing socket resources failed: {}", err);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn started() -> bool {
		STACK.lock().started
	}

	// Winsock cleanup would pull the stack out from under parallel tests.
	#[cfg(unix)]
	#[test]
	fn init_and_close_are_idempotent() {
		init_resources().unwrap();
		init_resources().unwrap();
		close_resources().unwrap();
		close_resources().unwrap();
	}

	#[cfg(unix)]
	#[test]
	fn nested_guards_keep_the_stack_up() {
		let outer = Resources::acquire().unwrap();
		let inner = Resources::acquire().unwrap();
		assert!(STACK.lock().guards >= 2);

		close_resources().unwrap();
		assert!(started());

		drop(inner);
		assert!(started());
		drop(outer);
	}
}
