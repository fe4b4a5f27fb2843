//! External collaborator contracts.
//!
//! The editor core never touches the outside world directly. Content comes
//! in through a [`FileSource`] and selections go out through a
//! [`CommandRunner`]; both are plain byte-stream contracts so the caller can
//! back them with a local filesystem, a remote session, or a test fake.
//!
//! Only [`LocalFs`] ships here. Command execution is left to the caller.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// What [`FileSource::stat`] reports about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Final path component.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the source knows it.
    pub modified: Option<SystemTime>,
}

/// An openable, statable source of file content.
pub trait FileSource {
    /// The byte stream returned by [`open`](Self::open).
    type File: Read;

    /// Open `path` for reading.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if nothing exists at `path`, [`Error::Io`] for
    /// any other failure.
    fn open(&self, path: &Path) -> Result<Self::File>;

    /// Describe the file at `path`.
    ///
    /// # Errors
    ///
    /// As for [`open`](Self::open).
    fn stat(&self, path: &Path) -> Result<FileInfo>;
}

/// [`FileSource`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSource for LocalFs {
    type File = fs::File;

    fn open(&self, path: &Path) -> Result<fs::File> {
        fs::File::open(path).map_err(|e| not_found_or_io(path, e))
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        let meta = fs::metadata(path).map_err(|e| not_found_or_io(path, e))?;
        Ok(FileInfo {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

fn not_found_or_io(path: &Path, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.display().to_string())
    } else {
        Error::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Everything a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Exit status; `None` if the command did not exit normally.
    pub status: Option<i32>,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a command line, feeding it `stdin` and collecting its output.
pub trait CommandRunner {
    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be started or its streams
    /// failed. A command that runs and exits non-zero is not an error here;
    /// check [`CommandOutput::success`].
    fn run(&self, command: &str, stdin: &mut dyn Read) -> Result<CommandOutput>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
