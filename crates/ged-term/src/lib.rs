// SPDX-License-Identifier: MIT
//
// ged-term — Screen raster for the ged editor.
//
// A fixed grid of styled cells that remembers which rows changed and turns
// those rows into terminal bytes on demand. The editor paints; the caller
// reads the raster like any other byte source and copies it to the
// terminal. Nothing here touches a file descriptor: raw mode, size queries
// and the actual write belong to whoever drives the editor.
//
// Every byte sent to the terminal is accounted for: untouched rows are never
// re-sent, and style escapes are emitted per style run, not per cell.

pub mod ansi;
pub mod cell;
pub mod output;
pub mod raster;
