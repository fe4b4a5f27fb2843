//! Errors from the editor's external collaborators.
//!
//! Editing and rendering never fail: boundary motions are no-ops and a bad
//! glyph reaching the raster is a bug, not an error. What *can* fail is
//! everything the editor reaches through a byte stream: opening a file,
//! running a command over the selection. Those failures are collected here
//! so the caller can show them, typically by inserting the message into a
//! buffer with [`Window::insert_error`](crate::window::Window::insert_error).

use thiserror::Error;

/// A failure reported by a file source or command runner.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The command ran but reported failure.
    #[error("command `{command}` failed{}", status_suffix(.status))]
    CommandFailed {
        /// The command line as given.
        command: String,
        /// Exit status, if the command exited normally.
        status: Option<i32>,
    },

    /// The command wrote to its standard error stream.
    #[error("command `{command}`: {stderr}")]
    CommandStderr {
        /// The command line as given.
        command: String,
        /// Everything the command wrote to standard error.
        stderr: String,
    },
}

fn status_suffix(status: &Option<i32>) -> String {
    status.map_or_else(String::new, |s| format!(" with status {s}"))
}

/// Result alias for collaborator operations.
pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
