//! Failure reporting through a container termination log.

use std::fs;
use std::io;
use std::path::Path;

/// Upper bound on the message size the kubelet reads back.
pub const MAX_MESSAGE_BYTES: usize = 4096;

/// Writes `message` to `path`, replacing previous content.
///
/// Messages longer than [`MAX_MESSAGE_BYTES`] are cut at a character boundary.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_termination_log(path: &Path, message: &str) -> io::Result<()> {
    fs::write(path, clip(message, MAX_MESSAGE_BYTES))
}

fn clip(message: &str, max: usize) -> &str {
    if message.len() <= max {
        return message;
    }
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
