//! Diagnostic output for the launcher.
//!
//! The launcher's stdout belongs to the delegated tool, so every message the
//! shim itself produces goes to the diagnostic stream.

use std::io::Write;

/// Writes a single line to the diagnostic stream, ignoring write failures.
///
/// # Examples
///
/// ```
/// use minimal_shim::output::write_stderr_line;
///
/// let mut stderr = Vec::new();
/// write_stderr_line(&mut stderr, "Download complete.");
/// assert_eq!(stderr, b"Download complete.\n");
/// ```
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Formats the notice printed before a download starts.
#[must_use]
pub fn download_started_message(tool_name: &str, version: &str) -> String {
    format!("Downloading {tool_name} version {version}...")
}

/// The notice printed after a download completes.
pub const DOWNLOAD_COMPLETE_MESSAGE: &str = "Download complete.";
