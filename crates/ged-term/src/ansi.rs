// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; that's the raster's job. This module
// just knows the byte-level encoding of the handful of terminal commands a
// row-diffing renderer needs: absolute cursor placement, line clear, and
// the three style selectors.
//
// All positions are 0-indexed `(row, col)` in our API and converted to
// 1-indexed for the terminal (ANSI CUP uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

use crate::cell::Style;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(row, col)` using the CUP (Cursor Position) sequence.
#[inline]
pub fn cursor_to(w: &mut impl Write, row: usize, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// Move the cursor to the first column of `row`.
#[inline]
pub fn row_start(w: &mut impl Write, row: usize) -> io::Result<()> {
    cursor_to(w, row, 0)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Erase the entire line the cursor is on (EL 2).
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2K")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Style ───────────────────────────────────────────────────────────────────

/// Select a cell style.
///
/// Every selector starts with SGR 0, so switching between `Underline` and
/// `Highlight` never leaves the previous attribute active.
pub fn style(w: &mut impl Write, style: Style) -> io::Result<()> {
    match style {
        Style::Normal => reset(w),
        Style::Underline => w.write_all(b"\x1b[0;4m"),
        Style::Highlight => w.write_all(b"\x1b[0;7m"),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
