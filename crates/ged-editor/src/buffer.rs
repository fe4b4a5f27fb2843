//! Character buffer — the editable character sequence.
//!
//! A `Buffer` is a doubly-linked chain of characters, one node per Unicode
//! scalar value. Nodes live in an arena and are addressed by [`NodeId`]
//! handles, so a window can hold stable references to "this character"
//! across edits elsewhere in the chain.
//!
//! # Design choices
//!
//! - **Arena, not pointers.** Every node is a slot in a `Vec`; links are
//!   handles. Freed slots go on a free list and are reused. A handle to a
//!   removed node is a bug in the holder; the window retargets its handles
//!   before the node is removed (see [`crate::window`]).
//!
//! - **Lines are implicit.** There is no line table. An EOL node (`'\n'`)
//!   ends a line; everything else is found by walking the chain.
//!
//! - **Streaming input.** The buffer is an [`io::Write`] sink: bytes are
//!   decoded as UTF-8 as they arrive, an incomplete trailing sequence is
//!   held for the next write, and malformed bytes are dropped silently.
//!
//! - **Non-destructive output.** [`Buffer::reader`] returns a separate
//!   [`ContentReader`] with its own position. Reading never mutates the
//!   buffer, and any number of readers can be taken.

use std::fmt;
use std::io::{self, Read};
use std::str;

use crate::config::Config;

/// The character that terminates a line.
pub const EOL: char = '\n';

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Stable handle to one character node in a [`Buffer`].
///
/// Handles stay valid until their node is removed. After removal the slot
/// may be reused for a new node, so holders must drop or retarget handles
/// to removed nodes immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy)]
struct Node {
    ch: char,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// An editable chain of characters.
///
/// # Examples
///
/// ```
/// use ged_editor::buffer::Buffer;
/// use ged_editor::config::Config;
///
/// let mut buf = Buffer::new(Config::default());
/// buf.load("héllo\n".as_bytes());
/// assert_eq!(buf.len(), 6);
/// assert_eq!(buf.to_string(), "héllo\n");
/// ```
pub struct Buffer {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    config: Config,
    /// Undecoded bytes of a UTF-8 sequence split across writes.
    partial: Vec<u8>,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            config,
            partial: Vec::new(),
        }
    }

    /// Create a buffer holding `text`.
    #[must_use]
    pub fn from_text(text: &str, config: Config) -> Self {
        let mut buf = Self::new(config);
        buf.slots.reserve(text.len());
        for ch in text.chars() {
            buf.push(ch);
        }
        buf
    }

    /// Create a buffer from everything `source` yields.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from `source` fails. Decode failures are
    /// not errors: malformed bytes are dropped.
    pub fn from_reader(source: &mut impl Read, config: Config) -> io::Result<Self> {
        let mut buf = Self::new(config);
        let bytes = io::copy(source, &mut buf)?;
        tracing::debug!(bytes, chars = buf.len, "buffer loaded");
        Ok(buf)
    }

    // -- Queries ------------------------------------------------------------

    /// The buffer's configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of characters (EOLs included).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when the buffer holds no characters.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First node, or `None` if empty.
    #[inline]
    #[must_use]
    pub const fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// Last node, or `None` if empty.
    #[inline]
    #[must_use]
    pub const fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// The character at `id`, or `None` if the handle is not live.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<char> {
        self.node(id).map(|n| n.ch)
    }

    /// Whether `id` is the handle of a line-terminating node.
    #[inline]
    #[must_use]
    pub fn is_eol(&self, id: NodeId) -> bool {
        self.get(id) == Some(EOL)
    }

    /// The node after `id`.
    #[inline]
    #[must_use]
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next)
    }

    /// The node before `id`.
    #[inline]
    #[must_use]
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.prev)
    }

    /// Iterate `(handle, char)` pairs from `head` in chain order.
    #[must_use]
    pub const fn nodes(&self) -> Nodes<'_> {
        Nodes {
            buffer: self,
            pos: self.head,
        }
    }

    /// Iterate characters in chain order.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.nodes().map(|(_, ch)| ch)
    }

    /// Collect the characters of the half-open span `[from, to)`.
    ///
    /// `from = None` is an empty span; `to = None` runs to the end.
    #[must_use]
    pub fn text_between(&self, from: Option<NodeId>, to: Option<NodeId>) -> String {
        let mut text = String::new();
        let mut pos = from;
        while let Some(id) = pos {
            if Some(id) == to {
                break;
            }
            if let Some(ch) = self.get(id) {
                text.push(ch);
            }
            pos = self.next(id);
        }
        text
    }

    /// Verify the chain invariants: reachable from `head` without cycles,
    /// every adjacent pair linked both ways, `tail` is the last node, and
    /// the node count matches `len`.
    #[must_use]
    pub fn check_links(&self) -> bool {
        let mut count = 0;
        let mut prev: Option<NodeId> = None;
        let mut pos = self.head;
        while let Some(id) = pos {
            let Some(node) = self.node(id) else {
                return false;
            };
            if node.prev != prev {
                return false;
            }
            count += 1;
            if count > self.len {
                return false; // cycle, or len out of date
            }
            prev = Some(id);
            pos = node.next;
        }
        prev == self.tail && count == self.len
    }

    // -- Reading ------------------------------------------------------------

    /// A byte source over the whole buffer, encoded as UTF-8.
    ///
    /// The reader keeps its own position; the buffer is not consumed.
    #[must_use]
    pub const fn reader(&self) -> ContentReader<'_> {
        self.reader_between(self.head, None)
    }

    /// A byte source over the half-open span `[from, to)`.
    ///
    /// `from = None` reads nothing; `to = None` reads to the end.
    #[must_use]
    pub const fn reader_between(&self, from: Option<NodeId>, to: Option<NodeId>) -> ContentReader<'_> {
        ContentReader {
            buffer: self,
            pos: from,
            stop: to,
            pending: [0; 4],
            pending_start: 0,
            pending_end: 0,
        }
    }

    // -- Writing ------------------------------------------------------------

    /// Append `ch` at the tail. O(1) amortized.
    pub fn push(&mut self, ch: char) -> NodeId {
        self.insert_before(None, ch)
    }

    /// Decode `bytes` as UTF-8 and append each character.
    ///
    /// A multi-byte sequence split across calls is completed by the next
    /// call. Malformed sequences are skipped without a trace.
    pub fn load(&mut self, bytes: &[u8]) {
        if self.partial.is_empty() {
            self.decode(bytes);
        } else {
            let mut joined = std::mem::take(&mut self.partial);
            joined.extend_from_slice(bytes);
            self.decode(&joined);
        }
    }

    fn decode(&mut self, mut bytes: &[u8]) {
        loop {
            match str::from_utf8(bytes) {
                Ok(text) => {
                    text.chars().for_each(|ch| {
                        self.push(ch);
                    });
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    str::from_utf8(valid)
                        .unwrap_or_default()
                        .chars()
                        .for_each(|ch| {
                            self.push(ch);
                        });
                    match err.error_len() {
                        Some(bad) => bytes = &rest[bad..],
                        None => {
                            // Incomplete sequence at the end: wait for more.
                            self.partial.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    // -- Chain surgery ------------------------------------------------------

    /// Splice a new node holding `ch` immediately before `at`, or at the
    /// tail when `at` is `None`. Returns the new node's handle.
    pub(crate) fn insert_before(&mut self, at: Option<NodeId>, ch: char) -> NodeId {
        let prev = match at {
            Some(at) => self.prev(at),
            None => self.tail,
        };
        let node = Node { ch, prev, next: at };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.0] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        };

        match prev.and_then(|p| self.slots[p.0].as_mut()) {
            Some(p) => p.next = Some(id),
            None => self.head = Some(id),
        }
        match at.and_then(|a| self.slots[a.0].as_mut()) {
            Some(a) => a.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.len += 1;
        id
    }

    /// Unlink and free the node at `id`, returning its character.
    ///
    /// Returns `None` (and changes nothing) if `id` is not live.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<char> {
        let node = self.slots.get_mut(id.0)?.take()?;

        match node.prev.and_then(|p| self.slots[p.0].as_mut()) {
            Some(p) => p.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.slots[n.0].as_mut()) {
            Some(n) => n.prev = node.prev,
            None => self.tail = node.prev,
        }
        self.free.push(id);
        self.len -= 1;
        Some(node.ch)
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl io::Write for Buffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.load(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars().try_for_each(|ch| fmt::Write::write_char(f, ch))
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("chars", &self.len)
            .field("slots", &self.slots.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Iteration
// ---------------------------------------------------------------------------

/// Iterator over `(handle, char)` pairs, from [`Buffer::nodes`].
pub struct Nodes<'a> {
    buffer: &'a Buffer,
    pos: Option<NodeId>,
}

impl Iterator for Nodes<'_> {
    type Item = (NodeId, char);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.pos?;
        let node = self.buffer.node(id)?;
        self.pos = node.next;
        Some((id, node.ch))
    }
}

/// A byte source over a span of a buffer, from [`Buffer::reader`].
///
/// Characters are encoded as UTF-8 on the fly. A character whose encoding
/// does not fit the caller's buffer is carried over to the next read.
pub struct ContentReader<'a> {
    buffer: &'a Buffer,
    pos: Option<NodeId>,
    stop: Option<NodeId>,
    pending: [u8; 4],
    pending_start: usize,
    pending_end: usize,
}

impl Read for ContentReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < out.len() {
            if self.pending_start == self.pending_end {
                let Some(id) = self.pos.filter(|id| Some(*id) != self.stop) else {
                    break;
                };
                let Some(ch) = self.buffer.get(id) else {
                    break;
                };
                self.pending_end = ch.encode_utf8(&mut self.pending).len();
                self.pending_start = 0;
                self.pos = self.buffer.next(id);
            }
            let take = (self.pending_end - self.pending_start).min(out.len() - n);
            out[n..n + take]
                .copy_from_slice(&self.pending[self.pending_start..self.pending_start + take]);
            self.pending_start += take;
            n += take;
        }
        Ok(n)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn buf(text: &str) -> Buffer {
        Buffer::from_text(text, Config::default())
    }

    fn read_all(mut reader: impl Read) -> String {
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_buffer_is_empty() {
        let b = Buffer::default();
        assert!(b.is_empty());
        assert_eq!(b.len(), 0);
        assert_eq!(b.head(), None);
        assert_eq!(b.tail(), None);
        assert!(b.check_links());
    }

    #[test]
    fn from_text_builds_chain() {
        let b = buf("ab\ncd");
        assert_eq!(b.len(), 5);
        assert_eq!(b.to_string(), "ab\ncd");
        assert!(b.check_links());
    }

    #[test]
    fn from_reader_loads_everything() {
        let mut src: &[u8] = b"one\ntwo\n";
        let b = Buffer::from_reader(&mut src, Config::default()).unwrap();
        assert_eq!(b.to_string(), "one\ntwo\n");
    }

    // -- Links --------------------------------------------------------------

    #[test]
    fn head_and_tail_are_ends() {
        let b = buf("xyz");
        let head = b.head().unwrap();
        let tail = b.tail().unwrap();
        assert_eq!(b.get(head), Some('x'));
        assert_eq!(b.get(tail), Some('z'));
        assert_eq!(b.prev(head), None);
        assert_eq!(b.next(tail), None);
    }

    #[test]
    fn next_and_prev_are_mutual() {
        let b = buf("abc");
        let a = b.head().unwrap();
        let bb = b.next(a).unwrap();
        assert_eq!(b.prev(bb), Some(a));
        assert_eq!(b.get(bb), Some('b'));
    }

    #[test]
    fn is_eol_detects_line_ends() {
        let b = buf("a\n");
        assert!(!b.is_eol(b.head().unwrap()));
        assert!(b.is_eol(b.tail().unwrap()));
    }

    // -- Append / load ------------------------------------------------------

    #[test]
    fn push_appends_at_tail() {
        let mut b = Buffer::default();
        b.push('a');
        let id = b.push('b');
        assert_eq!(b.tail(), Some(id));
        assert_eq!(b.to_string(), "ab");
        assert!(b.check_links());
    }

    #[test]
    fn load_decodes_utf8() {
        let mut b = Buffer::default();
        b.load("naïve 中文".as_bytes());
        assert_eq!(b.to_string(), "naïve 中文");
        assert_eq!(b.len(), 8);
    }

    #[test]
    fn load_drops_malformed_bytes() {
        let mut b = Buffer::default();
        b.load(b"a\xffb\xc3(c");
        assert_eq!(b.to_string(), "ab(c");
    }

    #[test]
    fn load_completes_sequence_split_across_writes() {
        let mut b = Buffer::default();
        let bytes = "é".as_bytes();
        b.load(&bytes[..1]);
        assert_eq!(b.len(), 0);
        b.load(&bytes[1..]);
        assert_eq!(b.to_string(), "é");
    }

    #[test]
    fn write_sink_appends() {
        let mut b = buf("x");
        write!(b, "y{}", 1).unwrap();
        assert_eq!(b.to_string(), "xy1");
    }

    // -- Chain surgery ------------------------------------------------------

    #[test]
    fn insert_before_middle() {
        let mut b = buf("ac");
        let c = b.tail().unwrap();
        b.insert_before(Some(c), 'b');
        assert_eq!(b.to_string(), "abc");
        assert!(b.check_links());
    }

    #[test]
    fn insert_before_head_becomes_head() {
        let mut b = buf("bc");
        let head = b.head().unwrap();
        let id = b.insert_before(Some(head), 'a');
        assert_eq!(b.head(), Some(id));
        assert_eq!(b.to_string(), "abc");
        assert!(b.check_links());
    }

    #[test]
    fn remove_middle_relinks() {
        let mut b = buf("abc");
        let mid = b.next(b.head().unwrap()).unwrap();
        assert_eq!(b.remove(mid), Some('b'));
        assert_eq!(b.to_string(), "ac");
        assert_eq!(b.len(), 2);
        assert!(b.check_links());
    }

    #[test]
    fn remove_ends_updates_head_and_tail() {
        let mut b = buf("abc");
        b.remove(b.head().unwrap());
        b.remove(b.tail().unwrap());
        assert_eq!(b.to_string(), "b");
        assert_eq!(b.head(), b.tail());
        assert!(b.check_links());
    }

    #[test]
    fn remove_last_node_empties_buffer() {
        let mut b = buf("z");
        b.remove(b.head().unwrap());
        assert!(b.is_empty());
        assert_eq!(b.head(), None);
        assert_eq!(b.tail(), None);
        assert!(b.check_links());
    }

    #[test]
    fn remove_dead_handle_is_none() {
        let mut b = buf("ab");
        let head = b.head().unwrap();
        b.remove(head);
        assert_eq!(b.remove(head), None);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut b = buf("abc");
        let mid = b.next(b.head().unwrap()).unwrap();
        b.remove(mid);
        let id = b.push('d');
        assert_eq!(id, mid);
        assert_eq!(b.to_string(), "acd");
        assert!(b.check_links());
    }

    // -- Reading ------------------------------------------------------------

    #[test]
    fn reader_yields_contents() {
        let b = buf("line one\nline two\n");
        assert_eq!(read_all(b.reader()), "line one\nline two\n");
    }

    #[test]
    fn reader_is_not_destructive() {
        let b = buf("again");
        assert_eq!(read_all(b.reader()), "again");
        assert_eq!(read_all(b.reader()), "again");
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn reader_handles_tiny_output_buffers() {
        let b = buf("añb中");
        let mut reader = b.reader();
        let mut got = Vec::new();
        let mut byte = [0u8; 1];
        while reader.read(&mut byte).unwrap() == 1 {
            got.push(byte[0]);
        }
        assert_eq!(String::from_utf8(got).unwrap(), "añb中");
    }

    #[test]
    fn reader_between_is_half_open() {
        let b = buf("abcde");
        let from = b.next(b.head().unwrap());
        let to = from.and_then(|id| b.next(id)).and_then(|id| b.next(id));
        assert_eq!(read_all(b.reader_between(from, to)), "bc");
        assert_eq!(read_all(b.reader_between(from, None)), "bcde");
        assert_eq!(read_all(b.reader_between(None, None)), "");
    }

    #[test]
    fn text_between_matches_reader() {
        let b = buf("hello");
        let h = b.head();
        let l = b.tail().and_then(|t| b.prev(t));
        assert_eq!(b.text_between(h, l), "hel");
    }

    // -- Display / Debug ----------------------------------------------------

    #[test]
    fn debug_summarizes() {
        let dbg = format!("{:?}", buf("abc"));
        assert!(dbg.contains("chars: 3"));
    }
}
