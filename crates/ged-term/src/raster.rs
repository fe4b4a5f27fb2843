// SPDX-License-Identifier: MIT
//
// Raster — a diffed grid of styled cells, drained as a byte stream.
//
// The editor paints cells into the raster; the terminal reads bytes out of
// it. In between sits the diff: each row carries a dirty flag, set by any
// write to the row and cleared once the row has been through a drain. Only
// dirty rows are considered, so a keystroke that touches one line costs one
// line of output.
//
// Dirty tracking is per row, not per cell. A touched row is repainted in
// full: reposition, erase, then every cell left to right. Terminal rows are
// short and most edits touch one or two of them, so the simpler
// invalidation model wins over per-cell bookkeeping.
//
// The frame protocol per drain:
//
//   1. For each dirty row, top to bottom: `ESC[{row};1H ESC[2K`, then the
//      cells, emitting a style selector only where the style changes
//      (baseline Normal). A row that ends styled is closed with a reset.
//   2. If any row was dirty, place the cursor at the last `set_cursor`
//      coordinates. A cursor move with no accompanying cell write never
//      reaches the terminal on its own.
//   3. The bytes are queued and handed out across as many `read` calls as
//      the caller needs. When the queue is empty and nothing is dirty,
//      `read` returns 0 (end of stream).

use std::io::{self, Read, Write};

use crate::ansi;
use crate::cell::{is_printable, Cell, Style};
use crate::output::OutputBuffer;

// ─── Raster ──────────────────────────────────────────────────────────────────

/// A fixed `rows × cols` grid of cells with per-row dirty tracking.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use ged_term::cell::Style;
/// use ged_term::raster::Raster;
///
/// let mut ras = Raster::new(3, 10);
/// ras.put(0, 0, 'A', Style::Normal);
///
/// let mut frame = Vec::new();
/// ras.read_to_end(&mut frame).unwrap();
/// assert!(frame.starts_with(b"\x1b[1;1H\x1b[2KA"));
///
/// // Nothing changed since: the stream is empty.
/// let mut again = Vec::new();
/// ras.read_to_end(&mut again).unwrap();
/// assert!(again.is_empty());
/// ```
pub struct Raster {
    rows: usize,
    cols: usize,
    /// Current contents, row-major.
    cells: Vec<Cell>,
    dirty: Vec<bool>,
    cursor: (usize, usize),
    output: OutputBuffer,
}

impl Raster {
    /// Create a blank raster. Nothing is dirty until the first write.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        let size = rows * cols;
        Self {
            rows,
            cols,
            cells: vec![Cell::BLANK; size],
            dirty: vec![false; rows],
            cursor: (0, 0),
            output: OutputBuffer::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Number of rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The cell at `(i, j)`, or `None` if out of bounds.
    #[must_use]
    pub fn cell(&self, i: usize, j: usize) -> Option<Cell> {
        (i < self.rows && j < self.cols).then(|| self.cells[i * self.cols + j])
    }

    /// The glyphs of row `i` as a string (for tests and debugging).
    #[must_use]
    pub fn row_text(&self, i: usize) -> Option<String> {
        (i < self.rows).then(|| self.row(i).iter().map(|c| c.ch).collect())
    }

    /// Whether row `i` has been written since the last drain.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self, i: usize) -> bool {
        self.dirty.get(i).copied().unwrap_or(false)
    }

    /// The last cursor target set with [`set_cursor`](Self::set_cursor).
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    fn row(&self, i: usize) -> &[Cell] {
        &self.cells[i * self.cols..(i + 1) * self.cols]
    }

    fn row_mut(&mut self, i: usize) -> &mut [Cell] {
        &mut self.cells[i * self.cols..(i + 1) * self.cols]
    }

    // ─── Painting ────────────────────────────────────────────────────────

    /// Write one styled cell and mark row `i` dirty.
    ///
    /// Out-of-bounds coordinates are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `ch` is not printable. Control characters must be filtered
    /// before they reach the raster; one arriving here is a bug upstream.
    pub fn put(&mut self, i: usize, j: usize, ch: char, style: Style) {
        assert_printable(ch);
        if i >= self.rows || j >= self.cols {
            return;
        }
        self.cells[i * self.cols + j] = Cell::styled(ch, style);
        self.dirty[i] = true;
    }

    /// Write a horizontal run of text starting at column `j`.
    ///
    /// The first `skip` characters are consumed without being painted (a
    /// horizontal scroll offset). Painting stops at the right edge; the text
    /// is never wrapped. No-op if `i` is out of range or `text` is empty.
    ///
    /// # Panics
    ///
    /// Panics if a consumed character is not printable.
    pub fn put_str(&mut self, i: usize, mut j: usize, mut skip: usize, text: &str, style: Style) {
        if i >= self.rows || text.is_empty() {
            return;
        }
        self.dirty[i] = true;
        let cols = self.cols;
        let row = self.row_mut(i);
        for ch in text.chars() {
            if j >= cols {
                break;
            }
            assert_printable(ch);
            if skip > 0 {
                skip -= 1;
                continue;
            }
            row[j] = Cell::styled(ch, style);
            j += 1;
        }
    }

    /// Fill row `i` with normal-style `fill` and mark it dirty.
    ///
    /// # Panics
    ///
    /// Panics if `fill` is not printable.
    pub fn clear_line_with(&mut self, i: usize, fill: char) {
        assert_printable(fill);
        if i >= self.rows {
            return;
        }
        self.row_mut(i).fill(Cell::new(fill));
        self.dirty[i] = true;
    }

    /// Blank row `i` and mark it dirty.
    pub fn clear_line(&mut self, i: usize) {
        self.clear_line_with(i, ' ');
    }

    /// Fill every row with normal-style `fill` and mark them all dirty.
    ///
    /// # Panics
    ///
    /// Panics if `fill` is not printable.
    pub fn clear_with(&mut self, fill: char) {
        assert_printable(fill);
        self.cells.fill(Cell::new(fill));
        self.dirty.fill(true);
    }

    /// Blank every row and mark them all dirty.
    pub fn clear(&mut self) {
        self.clear_with(' ');
    }

    /// Record where the terminal cursor should land after the next frame.
    ///
    /// Does not dirty anything by itself.
    #[inline]
    pub const fn set_cursor(&mut self, i: usize, j: usize) {
        self.cursor = (i, j);
    }

    /// Mark every row dirty: the next drain repaints the whole grid.
    ///
    /// Use after something else has written to the terminal (a prompt, a
    /// shell escape) or after a manual refresh request.
    pub fn invalidate(&mut self) {
        self.dirty.fill(true);
    }

    // ─── Draining ────────────────────────────────────────────────────────

    /// Encode every dirty row into the output queue.
    fn encode_frame(&mut self) {
        let mut any_dirty = false;
        let mut emitted = 0usize;
        let mut active = Style::Normal;

        for i in 0..self.rows {
            if !self.dirty[i] {
                continue;
            }
            any_dirty = true;
            self.dirty[i] = false;

            ansi::row_start(&mut self.output, i).ok();
            ansi::clear_line(&mut self.output).ok();
            for cell in &self.cells[i * self.cols..(i + 1) * self.cols] {
                if cell.style != active {
                    ansi::style(&mut self.output, cell.style).ok();
                    active = cell.style;
                }
                self.output.write_char(cell.ch);
            }
            if active != Style::Normal {
                ansi::reset(&mut self.output).ok();
                active = Style::Normal;
            }

            emitted += 1;
        }

        if any_dirty {
            let (i, j) = self.cursor;
            ansi::cursor_to(&mut self.output, i, j).ok();
        }

        if !self.output.is_empty() {
            tracing::trace!(rows = emitted, bytes = self.output.len(), "raster frame encoded");
        }
    }

    /// Drain everything pending into `w`: the unread rest of the current
    /// frame, then a new frame for whatever is dirty now.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails; the unsent bytes stay
    /// queued for the next drain.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        self.output.flush_to(w)?;
        self.encode_frame();
        self.output.flush_to(w)
    }
}

impl Read for Raster {
    /// Hand out the pending frame, encoding a new one when the queue is
    /// empty. Returns `Ok(0)` once everything is drained and nothing is
    /// dirty.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.output.is_empty() {
            self.encode_frame();
        }
        Ok(self.output.read_into(buf))
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty.iter().filter(|d| **d).count())
            .field("pending", &self.output.len())
            .finish_non_exhaustive()
    }
}

fn assert_printable(ch: char) {
    assert!(
        is_printable(ch),
        "tried to render unprintable character {ch:?}"
    );
}

// ─── Tests ───────────────────────────────────────────────────────────────────
