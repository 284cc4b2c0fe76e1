//! Diagnostic hook.
//!
//! Every error the crate returns is also passed to a process-wide hook as
//! `(code, message, line)`. The default hook prints one line to stderr;
//! callers can replace it, e.g. with [`log_hook`] or a no-op.
//!
//! Reporting never replaces the returned error: callers must still check
//! every `Result`.

use std::io::Write;
use std::panic::Location;

use parking_lot::RwLock;

use crate::error::Error;

/// Receives `(error code, message, source line)` for each reported error.
///
/// The code is the platform error code, or `-1` for errors that did not come
/// from a native call.
///
/// A hook may run while the failing socket is mid-operation. Formatting a
/// socket with `{:?}` or asking `is_closed` is fine; sending, receiving or
/// closing from inside the hook can deadlock.
pub type DiagnosticHook = fn(code: i32, message: &str, line: u32);

static HOOK: RwLock<DiagnosticHook> = parking_lot::const_rwlock(default_hook as DiagnosticHook);

/// Installs `hook` for every subsequent report.
pub fn set_diagnostic_hook(hook: DiagnosticHook) {
	*HOOK.write() = hook;
}

/// Restores [`default_hook`].
pub fn reset_diagnostic_hook() {
	set_diagnostic_hook(default_hook);
}

/// Builds the diagnostic line, tagged with the platform family.
pub fn format_diagnostic(code: i32, message: &str, line: u32) -> String {
	format!(
		"Platform: {} | Line Number: {} | Error Code: {} | Message: {}",
		std::env::consts::FAMILY,
		line,
		code,
		message
	)
}

/// Writes the diagnostic line to stderr.
pub fn default_hook(code: i32, message: &str, line: u32) {
	let mut stderr = std::io::stderr().lock();
	let _ = writeln!(stderr, "{}", format_diagnostic(code, message, line));
}

/// Forwards the diagnostic line to the `log` facade at error level.
pub fn log_hook(code: i32, message: &str, line: u32) {
	log::error!("{}", format_diagnostic(code, message, line));
}

/// Discards reports.
pub fn silent_hook(_code: i32, _message: &str, _line: u32) {}

#[track_caller]
pub(crate) fn report(err: &Error) {
	let line = Location::caller().line();
	let code = err.code().unwrap_or(-1);
	// Copy the fn pointer out so a hook may itself call set_diagnostic_hook.
	let hook = *HOOK.read();
	hook(code, &err.to_string(), line);
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	static SEEN: AtomicUsize = AtomicUsize::new(0);

	fn counting_hook(code: i32, message: &str, line: u32) {
		if code == -1 && message == "socket is closed" && line > 0 {
			SEEN.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn line_format_matches_expected_layout() {
		let line = format_diagnostic(111, "connection refused", 42);
		assert_eq!(
			line,
			format!(
				"Platform: {} | Line Number: 42 | Error Code: 111 | Message: connection refused",
				std::env::consts::FAMILY
			)
		);
	}

	#[test]
	fn replaced_hook_receives_reports() {
		set_diagnostic_hook(counting_hook);
		report(&Error::Closed);
		reset_diagnostic_hook();
		assert!(SEEN.load(Ordering::SeqCst) >= 1);
	}
}
