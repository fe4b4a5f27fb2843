// SPDX-License-Identifier: MIT
//
// Output buffering for the raster's byte stream.
//
// A frame is encoded into an `OutputBuffer` in one go, then handed out to
// the caller in however many pieces the caller asks for. The caller may
// read with a buffer smaller than one frame; the unread tail stays queued
// and the next read resumes exactly where the last one stopped. Only once
// the queue is empty does the raster encode the next frame.
//
// The backing Vec is reused across frames, so steady-state rendering does
// not allocate.

use std::io::{self, Write};

/// Default capacity: 4 KB, a full 80×25 frame with a few style switches.
const DEFAULT_CAPACITY: usize = 4096;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte queue: written at the back, drained from the front.
pub struct OutputBuffer {
    buf: Vec<u8>,
    /// Index of the first unread byte.
    pos: usize,
}

impl OutputBuffer {
    /// Create an empty buffer with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
            pos: 0,
        }
    }

    /// Number of bytes waiting to be read.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whether every queued byte has been read.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// The unread bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Append a character as UTF-8.
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Drop everything, read or not (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Copy as many unread bytes as fit into `out`, returning the count.
    ///
    /// When the last byte is consumed the storage is rewound so the next
    /// frame starts at the front of the allocation.
    pub fn read_into(&mut self, out: &mut [u8]) -> usize {
        let n = self.len().min(out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        if self.is_empty() {
            self.clear();
        }
        n
    }

    /// Write all unread output to an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. Nothing is consumed in
    /// that case, so the write can be retried.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.is_empty() {
            w.write_all(self.as_bytes())?;
            w.flush()?;
            self.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Nothing to do: bytes leave through read_into() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn write_trait() {
        let mut buf = OutputBuffer::new();
        write!(buf, "hello {}", 42).unwrap();
        assert_eq!(buf.as_bytes(), b"hello 42");
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn write_char_encodes_utf8() {
        let mut buf = OutputBuffer::new();
        buf.write_char('A');
        buf.write_char('中');
        assert_eq!(buf.as_bytes(), "A中".as_bytes());
    }

    // ── Partial reads ────────────────────────────────────────────────────

    #[test]
    fn read_into_small_buffer_resumes() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"abcdefg").unwrap();

        let mut out = [0u8; 3];
        assert_eq!(buf.read_into(&mut out), 3);
        assert_eq!(&out, b"abc");
        assert_eq!(buf.len(), 4);

        assert_eq!(buf.read_into(&mut out), 3);
        assert_eq!(&out, b"def");

        assert_eq!(buf.read_into(&mut out), 1);
        assert_eq!(out[0], b'g');
        assert!(buf.is_empty());

        assert_eq!(buf.read_into(&mut out), 0);
    }

    #[test]
    fn read_into_large_buffer_takes_all() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"xyz").unwrap();

        let mut out = [0u8; 16];
        assert_eq!(buf.read_into(&mut out), 3);
        assert_eq!(&out[..3], b"xyz");
        assert!(buf.is_empty());
    }

    #[test]
    fn write_after_partial_read_appends() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"ab").unwrap();
        let mut out = [0u8; 1];
        buf.read_into(&mut out);
        buf.write_all(b"c").unwrap();
        assert_eq!(buf.as_bytes(), b"bc");
    }

    // ── flush_to ─────────────────────────────────────────────────────────

    #[test]
    fn flush_to_writes_unread_and_clears() {
        let mut buf = OutputBuffer::new();
        buf.write_all(b"12345").unwrap();
        let mut out = [0u8; 2];
        buf.read_into(&mut out);

        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"345");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_writes_nothing() {
        let mut buf = OutputBuffer::new();
        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert!(sink.is_empty());
    }
}
