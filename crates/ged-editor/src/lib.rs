//! # ged-editor — Editing core for ged
//!
//! This crate contains the editable document and the window onto it:
//!
//! - **[`buffer`]** — `Buffer`, a chain of characters addressed by stable
//!   `NodeId` handles, with a streaming UTF-8 write sink and
//!   non-destructive readers
//! - **[`window`]** — `Window`, the cursor, mark and viewport over a buffer,
//!   with motion, editing, search and rendering into a
//!   [`Raster`](ged_term::raster::Raster)
//! - **[`config`]** — per-buffer settings (tab width)
//! - **[`collab`]** — contracts for the file source and command runner the
//!   editor talks to
//! - **[`error`]** — errors those collaborators can report
//!
//! Editing and rendering never fail. Only collaborator calls return
//! [`error::Result`].

pub mod buffer;
pub mod collab;
pub mod config;
pub mod error;
pub mod window;
