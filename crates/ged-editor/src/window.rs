//! Edit window — a viewport, cursor and selection over a [`Buffer`].
//!
//! The window owns its buffer and holds three kinds of handle into it:
//!
//! - `top`: the first node of the first visible line (always a line start).
//!   `None` is the line that begins at the virtual tail: the whole of an
//!   empty buffer, or the empty line after a final EOL.
//! - `cursor`: the node the cursor sits on. `None` is the *virtual tail*,
//!   the append position just past the last character.
//! - `mark`: an optional selection anchor. Together with the cursor it
//!   defines the selection, resolved to a scan-ordered `(start, end)` pair
//!   every time either end moves.
//!
//! Every removal goes through one path that retargets these handles before
//! the node is freed, so no handle ever dangles.
//!
//! # Selection spans
//!
//! Highlighting and the selection reader use the half-open span
//! `[start, end)`: the far boundary is not part of the text handed out.
//! [`Window::delete`] and [`Window::yank`] remove the closed span
//! `[start, end]`, so the character under the cursor goes with them.
//!
//! # Columns
//!
//! [`Window::home`] counts characters, not display columns. Vertical motion
//! restores that character count on the destination line, clamped to the
//! line's length; a tab counts as one step even though it renders wider.

use std::io::Read;

use ged_term::cell::{is_printable, Style};
use ged_term::raster::Raster;
use regex::Regex;

use crate::buffer::{Buffer, ContentReader, NodeId, EOL};
use crate::collab::CommandRunner;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// A cursor and viewport attached to one buffer.
///
/// # Examples
///
/// ```
/// use ged_editor::buffer::Buffer;
/// use ged_editor::config::Config;
/// use ged_editor::window::Window;
///
/// let mut win = Window::new(Buffer::from_text("hello", Config::default()), 24, 80);
/// win.mark();
/// win.right();
/// win.right();
/// assert_eq!(win.yank(), "hel");
/// assert_eq!(win.buffer().to_string(), "lo");
/// ```
#[derive(Debug)]
pub struct Window {
    buffer: Buffer,
    rows: usize,
    cols: usize,
    top: Option<NodeId>,
    cursor: Option<NodeId>,
    mark: Option<NodeId>,
    /// Scan-ordered selection bounds; `end == None` runs through the tail.
    selection: Option<(NodeId, Option<NodeId>)>,
}

impl Window {
    /// Attach a `rows × cols` window to `buffer`, cursor at the start.
    #[must_use]
    pub const fn new(buffer: Buffer, rows: usize, cols: usize) -> Self {
        let head = buffer.head();
        Self {
            buffer,
            rows,
            cols,
            top: head,
            cursor: head,
            mark: None,
            selection: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// The buffer being edited.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Detach the buffer from the window.
    #[must_use]
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }

    /// Visible rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Visible columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// First node of the first visible line; `None` when the first visible
    /// line starts at the virtual tail.
    #[inline]
    #[must_use]
    pub const fn top(&self) -> Option<NodeId> {
        self.top
    }

    /// The node under the cursor; `None` at the virtual tail.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Option<NodeId> {
        self.cursor
    }

    /// The selection anchor, if set.
    #[inline]
    #[must_use]
    pub const fn marked(&self) -> Option<NodeId> {
        self.mark
    }

    /// The resolved selection: `(start, end)` in scan order. `end` is
    /// `None` when the selection runs to the virtual tail.
    #[inline]
    #[must_use]
    pub const fn selection(&self) -> Option<(NodeId, Option<NodeId>)> {
        self.selection
    }

    /// The cursor's `(row, column)` on screen, tabs expanded, or `None`
    /// when the cursor is outside the viewport.
    #[must_use]
    pub fn cursor_position(&self) -> Option<(usize, usize)> {
        if self.rows == 0 {
            return None;
        }
        let config = self.buffer.config();
        let (mut i, mut j) = (0, 0);
        let mut pos = self.top;
        loop {
            if pos == self.cursor {
                return Some((i, j));
            }
            let id = pos?;
            match self.buffer.get(id)? {
                EOL => {
                    i += 1;
                    j = 0;
                    if i >= self.rows {
                        return None;
                    }
                }
                '\t' => j = config.next_tab_stop(j),
                _ => j += 1,
            }
            pos = self.buffer.next(id);
        }
    }

    fn cursor_row(&self) -> Option<usize> {
        self.cursor_position().map(|(i, _)| i)
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `c` before the cursor.
    ///
    /// Control keys are interpreted: carriage return and newline insert an
    /// EOL, backspace and DEL remove the character before the cursor, tab
    /// inserts a tab. Other control characters are ignored.
    ///
    /// Inserting while the cursor sits on the first character of the
    /// buffer is not supported and does nothing.
    pub fn insert(&mut self, c: char) {
        if self.handle_control(c) {
            return;
        }
        self.splice(c);
    }

    /// [`insert`](Self::insert) each character of `s` in order.
    pub fn insert_string(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    /// Overwrite mode. Control keys behave as in [`insert`](Self::insert);
    /// printable characters are not applied (replacement is not
    /// implemented).
    pub fn overwrite(&mut self, c: char) {
        if !self.handle_control(c) {
            tracing::debug!(?c, "overwrite of printable input is not implemented");
        }
    }

    /// Remove the character before the cursor. The cursor stays put.
    pub fn backspace(&mut self) {
        let Some(target) = self.before(self.cursor) else {
            return;
        };
        self.remove_node(target);
        self.reveal_cursor();
    }

    /// Remove the selection, or the character under the cursor when no
    /// mark is set. Clears the mark.
    pub fn delete(&mut self) {
        self.cut();
    }

    /// Like [`delete`](Self::delete), returning the removed text in order.
    /// The cursor lands on the node that followed the last one removed.
    pub fn yank(&mut self) -> String {
        self.cut()
    }

    /// Set the mark at the cursor. At the virtual tail there is no node to
    /// mark and nothing happens.
    pub fn mark(&mut self) {
        if self.cursor.is_none() {
            tracing::debug!("mark at virtual tail ignored");
            return;
        }
        self.mark = self.cursor;
        self.resolve_selection();
    }

    /// Drop the mark and the selection.
    pub fn clear_mark(&mut self) {
        self.mark = None;
        self.selection = None;
    }

    /// Insert an error's message as plain text on its own line.
    pub fn insert_error(&mut self, err: &Error) {
        self.insert_string(&format!("error: {err}\n"));
    }

    fn handle_control(&mut self, c: char) -> bool {
        match c {
            '\r' | '\n' => self.splice(EOL),
            '\u{8}' | '\u{7f}' => self.backspace(),
            '\t' => self.splice('\t'),
            c if c.is_control() => {}
            _ => return false,
        }
        true
    }

    fn splice(&mut self, c: char) {
        if self.cursor.is_some() && self.cursor == self.buffer.head() {
            tracing::debug!(?c, "insert at buffer head is not supported");
            return;
        }
        let id = self.buffer.insert_before(self.cursor, c);
        if self.buffer.next(id) == self.top && self.is_line_start(id) {
            self.top = Some(id);
        }
        self.resolve_selection();
        self.reveal_cursor();
    }

    /// Remove the closed selection span (or the cursor node) and return
    /// its text.
    fn cut(&mut self) -> String {
        let span = match self.selection {
            Some((start, end)) => end.or_else(|| self.buffer.tail()).map(|last| (start, last)),
            None => self.cursor.map(|c| (c, c)),
        };
        self.clear_mark();
        let Some((first, last)) = span else {
            return String::new();
        };

        let mut doomed = Vec::new();
        let mut pos = Some(first);
        while let Some(id) = pos {
            doomed.push(id);
            if id == last {
                break;
            }
            pos = self.buffer.next(id);
        }

        self.cursor = self.buffer.next(last);
        let text: String = doomed.into_iter().filter_map(|id| self.remove_node(id)).collect();
        tracing::debug!(removed = text.chars().count(), "selection cut");
        self.reveal_cursor();
        text
    }

    /// Retarget every handle on `id`, then free it.
    fn remove_node(&mut self, id: NodeId) -> Option<char> {
        let next = self.buffer.next(id);
        let prev = self.buffer.prev(id);
        if self.top == Some(id) {
            self.top = next.or(prev);
        }
        if self.mark == Some(id) {
            self.mark = next.or(prev);
        }
        if self.cursor == Some(id) {
            self.cursor = next;
        }
        let ch = self.buffer.remove(id)?;
        self.snap_top();
        self.resolve_selection();
        Some(ch)
    }

    /// Put `top` back on a line start. A virtual `top` is only a line
    /// start while the buffer is empty or ends in an EOL.
    fn snap_top(&mut self) {
        self.top = match self.top {
            Some(top) => Some(self.line_start(top)),
            None => self
                .buffer
                .tail()
                .filter(|&tail| !self.buffer.is_eol(tail))
                .map(|tail| self.line_start(tail)),
        };
    }

    fn resolve_selection(&mut self) {
        self.selection = self.mark.map(|mark| match self.cursor {
            Some(cursor) if !self.reaches(mark, Some(cursor)) => (cursor, Some(mark)),
            _ => (mark, self.cursor),
        });
    }

    fn move_to(&mut self, pos: Option<NodeId>) {
        self.cursor = pos;
        if self.mark.is_some() {
            self.resolve_selection();
        }
    }

    // -- Navigation ---------------------------------------------------------

    /// Step the cursor back one character. Returns whether it moved.
    pub fn left(&mut self) -> bool {
        let Some(prev) = self.before(self.cursor) else {
            return false;
        };
        self.move_to(Some(prev));
        self.reveal_cursor();
        true
    }

    /// Step the cursor forward one character; from the last character
    /// this reaches the virtual tail. Returns whether it moved.
    pub fn right(&mut self) -> bool {
        let Some(id) = self.cursor else {
            return false;
        };
        self.move_to(self.buffer.next(id));
        self.reveal_cursor();
        true
    }

    /// Move to the start of the line, returning the number of characters
    /// stepped over.
    pub fn home(&mut self) -> usize {
        let (start, steps) = self.line_home(self.cursor);
        self.move_to(start);
        steps
    }

    /// Move onto the line's EOL, or the virtual tail on the last line.
    pub fn end(&mut self) {
        self.move_to(self.line_end(self.cursor));
    }

    /// Move to the same column on the previous line, clamped to its
    /// length. Scrolls when the cursor was on the first visible row, and
    /// brings an off-screen cursor back into view. No-op on the first line.
    pub fn up(&mut self) {
        let row = self.cursor_row();
        let (start, col) = self.line_home(self.cursor);
        let Some(prev_eol) = self.before(start) else {
            return;
        };
        let (prev_start, _) = self.line_home(Some(prev_eol));
        self.move_to(self.advance(prev_start, col));
        if row == Some(0) {
            self.scroll_up();
        }
        self.reveal_cursor();
    }

    /// Move to the same column on the next line, clamped to its length.
    /// Scrolls when the cursor was on the last visible row, and brings an
    /// off-screen cursor back into view. No-op on the last line.
    pub fn down(&mut self) {
        let row = self.cursor_row();
        let (_, col) = self.line_home(self.cursor);
        let Some(eol) = self.line_end(self.cursor) else {
            return;
        };
        self.move_to(self.advance(self.buffer.next(eol), col));
        if row.is_some_and(|r| r + 1 >= self.rows) {
            self.scroll_down();
        }
        self.reveal_cursor();
    }

    /// Shift the viewport up by one line.
    pub fn scroll_up(&mut self) {
        let Some(prev) = self.before(self.top) else {
            return;
        };
        self.top = Some(self.line_start(prev));
        tracing::debug!("scrolled up");
    }

    /// Shift the viewport down by one line. The empty line after a final
    /// EOL counts as a line.
    pub fn scroll_down(&mut self) {
        let Some(eol) = self.line_end(self.top) else {
            return;
        };
        self.top = self.buffer.next(eol);
        tracing::debug!("scrolled down");
    }

    /// Scroll up by a screenful.
    pub fn page_up(&mut self) {
        for _ in 0..self.rows {
            self.scroll_up();
        }
    }

    /// Scroll down by a screenful.
    pub fn page_down(&mut self) {
        for _ in 0..self.rows {
            self.scroll_down();
        }
    }

    /// Move to the start of the first line at or after the cursor's line
    /// whose text matches `pattern`. Returns whether one was found; on a
    /// miss the cursor does not move.
    pub fn find(&mut self, pattern: &Regex) -> bool {
        let (mut line, _) = self.line_home(self.cursor);
        loop {
            let end = self.line_end(line);
            if pattern.is_match(&self.buffer.text_between(line, end)) {
                self.jump_to(line);
                return true;
            }
            let Some(eol) = end else {
                return false;
            };
            line = self.buffer.next(eol);
        }
    }

    /// Like [`find`](Self::find), searching backward from the cursor's
    /// line.
    pub fn find_reverse(&mut self, pattern: &Regex) -> bool {
        let (mut line, _) = self.line_home(self.cursor);
        loop {
            if pattern.is_match(&self.buffer.text_between(line, self.line_end(line))) {
                self.jump_to(line);
                return true;
            }
            let Some(prev_eol) = self.before(line) else {
                return false;
            };
            line = self.line_home(Some(prev_eol)).0;
        }
    }

    fn jump_to(&mut self, pos: Option<NodeId>) {
        self.move_to(pos);
        self.reveal_cursor();
    }

    /// Scroll until the cursor is inside the viewport.
    fn reveal_cursor(&mut self) {
        if self.cursor_row().is_some() {
            return;
        }
        if self.top.is_some_and(|top| self.reaches(top, self.cursor)) {
            while self.cursor_row().is_none() {
                let before = self.top;
                self.scroll_down();
                if self.top == before {
                    break;
                }
            }
        } else if let Some(cursor) = self.cursor {
            self.top = Some(self.line_start(cursor));
        }
    }

    // -- Chain walking ------------------------------------------------------

    /// The node before `pos`; before the virtual tail is the last node.
    fn before(&self, pos: Option<NodeId>) -> Option<NodeId> {
        pos.map_or_else(|| self.buffer.tail(), |id| self.buffer.prev(id))
    }

    fn is_line_start(&self, id: NodeId) -> bool {
        self.buffer.prev(id).is_none_or(|p| self.buffer.is_eol(p))
    }

    fn line_start(&self, mut id: NodeId) -> NodeId {
        while !self.is_line_start(id) {
            match self.buffer.prev(id) {
                Some(prev) => id = prev,
                None => break,
            }
        }
        id
    }

    /// Walk back to the line start, counting steps.
    fn line_home(&self, mut pos: Option<NodeId>) -> (Option<NodeId>, usize) {
        let mut steps = 0;
        while let Some(prev) = self.before(pos) {
            if self.buffer.is_eol(prev) {
                break;
            }
            pos = Some(prev);
            steps += 1;
        }
        (pos, steps)
    }

    /// Walk forward to the line's EOL (`None` past the last line).
    fn line_end(&self, mut pos: Option<NodeId>) -> Option<NodeId> {
        while let Some(id) = pos {
            if self.buffer.is_eol(id) {
                break;
            }
            pos = self.buffer.next(id);
        }
        pos
    }

    /// Step forward up to `col` characters without leaving the line.
    fn advance(&self, mut pos: Option<NodeId>, col: usize) -> Option<NodeId> {
        for _ in 0..col {
            match pos {
                Some(id) if !self.buffer.is_eol(id) => pos = self.buffer.next(id),
                _ => break,
            }
        }
        pos
    }

    /// Whether scanning forward from `from` reaches `to` (`None` is the
    /// end of the chain, which every scan reaches).
    fn reaches(&self, from: NodeId, to: Option<NodeId>) -> bool {
        let mut pos = Some(from);
        loop {
            if pos == to {
                return true;
            }
            match pos {
                Some(id) => pos = self.buffer.next(id),
                None => return false,
            }
        }
    }

    // -- Rendering ----------------------------------------------------------

    /// Paint the viewport into `raster` and place its cursor.
    ///
    /// Every visible row is painted in full, content then blank fill. The
    /// selection is highlighted. Lines are clipped at the right edge,
    /// never wrapped.
    pub fn render(&self, raster: &mut Raster) {
        let rows = self.rows.min(raster.rows());
        let cols = self.cols.min(raster.cols());
        let config = self.buffer.config();
        let paint = |raster: &mut Raster, i: usize, j: usize, ch: char, style: Style| {
            if j < cols {
                raster.put(i, j, ch, style);
            }
        };

        let mut highlight = self.top_is_selected();
        let (mut i, mut j) = (0, 0);
        let mut pos = self.top;
        while i < rows {
            if pos == self.cursor {
                raster.set_cursor(i, j);
            }
            let Some(id) = pos else {
                break;
            };
            if let Some((start, end)) = self.selection {
                if id == start {
                    highlight = true;
                }
                if Some(id) == end {
                    highlight = false;
                }
            }
            let style = if highlight { Style::Highlight } else { Style::Normal };
            let Some(ch) = self.buffer.get(id) else {
                break;
            };

            match ch {
                EOL => {
                    paint(raster, i, j, ' ', style);
                    for fill in j + 1..cols {
                        paint(raster, i, fill, ' ', Style::Normal);
                    }
                    i += 1;
                    j = 0;
                }
                '\t' => {
                    let stop = config.next_tab_stop(j);
                    for col in j..stop.min(cols) {
                        paint(raster, i, col, ' ', style);
                    }
                    j = stop;
                }
                ch => {
                    let glyph = if is_printable(ch) { ch } else { ' ' };
                    paint(raster, i, j, glyph, style);
                    j += 1;
                }
            }
            pos = self.buffer.next(id);
        }

        if i < rows {
            for fill in j..cols {
                paint(raster, i, fill, ' ', Style::Normal);
            }
            for row in i + 1..rows {
                raster.clear_line(row);
            }
        }
    }

    /// Whether the first visible node lies inside `[start, end)`.
    fn top_is_selected(&self) -> bool {
        let (Some((start, end)), Some(top)) = (self.selection, self.top) else {
            return false;
        };
        let mut pos = Some(start);
        while let Some(id) = pos {
            if Some(id) == end {
                return false;
            }
            if id == top {
                return true;
            }
            pos = self.buffer.next(id);
        }
        false
    }

    // -- Selection I/O ------------------------------------------------------

    /// A byte source over the selection `[start, end)`. Empty when no mark
    /// is set. Reading does not change the buffer.
    #[must_use]
    pub fn selection_reader(&self) -> ContentReader<'_> {
        match self.selection {
            Some((start, end)) => self.buffer.reader_between(Some(start), end),
            None => self.buffer.reader_between(None, None),
        }
    }

    /// The selection `[start, end)` as a string.
    #[must_use]
    pub fn selection_text(&self) -> String {
        self.selection
            .map(|(start, end)| self.buffer.text_between(Some(start), end))
            .unwrap_or_default()
    }

    /// Run `command` with the selection as its standard input and return
    /// its standard output as text.
    ///
    /// # Errors
    ///
    /// Returns the runner's error, [`Error::CommandStderr`] if the command
    /// wrote to standard error, or [`Error::CommandFailed`] if it did not
    /// exit successfully.
    pub fn run_with_selection(
        &self,
        runner: &(impl CommandRunner + ?Sized),
        command: &str,
    ) -> Result<String> {
        let mut input = self.selection_reader();
        let output = runner.run(command, &mut input as &mut dyn Read)?;
        tracing::debug!(
            command,
            stdout = output.stdout.len(),
            stderr = output.stderr.len(),
            status = ?output.status,
            "command finished"
        );
        if !output.stderr.is_empty() {
            return Err(Error::CommandStderr {
                command: command.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        if !output.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                status: output.status,
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
