// SPDX-License-Identifier: MIT
//
// Cell — one styled glyph on the raster.
//
// The raster is a grid of these. A cell is a printable `char` plus one of
// three style tags; there are no colors and no per-attribute flags, because
// the editor only ever distinguishes plain text, underlined text, and the
// highlighted selection.
//
// Printability is decided once, here, so every layer agrees on it: a glyph
// is printable when it has a terminal display width. Control characters
// have none. Anything that reaches the raster must pass this test.

use unicode_width::UnicodeWidthChar;

// ─── Style ───────────────────────────────────────────────────────────────────

/// Visual style of a cell.
///
/// Each style maps to exactly one SGR selector (see [`crate::ansi::style`]).
/// The raster compresses runs of equal style so a row with one highlighted
/// word costs two style switches, not one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum Style {
    /// SGR 0: plain text. The baseline every row starts from.
    #[default]
    Normal = 0,
    /// SGR 4: underlined text.
    Underline = 1,
    /// SGR 7: reverse video, used for the selection.
    Highlight = 2,
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single raster cell: a glyph and its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The glyph to display. Always printable.
    pub ch: char,
    /// How to display it.
    pub style: Style,
}

impl Cell {
    /// A blank cell: space, normal style.
    pub const BLANK: Self = Self {
        ch: ' ',
        style: Style::Normal,
    };

    /// Create a normal-style cell.
    #[inline]
    #[must_use]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            style: Style::Normal,
        }
    }

    /// Create a cell with an explicit style.
    #[inline]
    #[must_use]
    pub const fn styled(ch: char, style: Style) -> Self {
        Self { ch, style }
    }

    /// Whether this cell is a normal-style space.
    #[inline]
    #[must_use]
    pub fn is_blank(self) -> bool {
        self == Self::BLANK
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::BLANK
    }
}

/// Whether `ch` can be painted into a cell.
///
/// Control characters (C0, DEL, C1) have no display width and are rejected.
/// NUL reports a width of zero but is rejected too. Zero-width marks are
/// accepted: the terminal composes them itself.
#[inline]
#[must_use]
pub fn is_printable(ch: char) -> bool {
    ch != '\0' && ch.width().is_some()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    // ── Layout ───────────────────────────────────────────────────────────

    #[test]
    fn style_is_1_byte() {
        assert_eq!(mem::size_of::<Style>(), 1);
    }

    #[test]
    fn cell_is_copy() {
        let a = Cell::new('x');
        let b = a;
        assert_eq!(a, b);
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn default_cell_is_blank() {
        assert_eq!(Cell::default(), Cell::BLANK);
        assert!(Cell::default().is_blank());
    }

    #[test]
    fn new_cell_is_normal() {
        let cell = Cell::new('A');
        assert_eq!(cell.ch, 'A');
        assert_eq!(cell.style, Style::Normal);
    }

    #[test]
    fn highlighted_space_is_not_blank() {
        assert!(!Cell::styled(' ', Style::Highlight).is_blank());
    }

    // ── Printability ─────────────────────────────────────────────────────

    #[test]
    fn ascii_letters_are_printable() {
        assert!(is_printable('a'));
        assert!(is_printable(' '));
        assert!(is_printable('~'));
    }

    #[test]
    fn unicode_is_printable() {
        assert!(is_printable('é'));
        assert!(is_printable('中'));
    }

    #[test]
    fn control_characters_are_not_printable() {
        assert!(!is_printable('\0'));
        assert!(!is_printable('\n'));
        assert!(!is_printable('\t'));
        assert!(!is_printable('\x1b'));
        assert!(!is_printable('\x7f'));
        assert!(!is_printable('\u{85}'));
    }
}
