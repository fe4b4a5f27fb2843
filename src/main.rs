// SPDX-License-Identifier: MIT
//
// ged — a terminal text-editing engine.
//
// This binary wires the two crates together for one non-interactive pass:
//
//   ged-editor → file source, character buffer, edit window
//   ged-term   → screen raster and its terminal byte stream
//
// The flow for one invocation:
//
//   path → FileSource::open → Buffer (UTF-8 sink) → Window
//   Window::render → Raster → drain → stdout
//
// Key dispatch, raw mode and terminal size queries are the job of an
// interactive front end and are not done here. Output is a single frame of
// escape sequences; pipe it to a terminal to see the viewport.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ged_editor::buffer::Buffer;
use ged_editor::collab::{FileSource, LocalFs};
use ged_editor::config::{Config, MAX_TAB_WIDTH};
use ged_editor::window::Window;
use ged_term::raster::Raster;

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ged", about = "Render a file through the ged editing core", version)]
struct Args {
    /// File to open
    path: PathBuf,

    /// Viewport height in rows
    #[arg(long, default_value_t = 24)]
    rows: usize,

    /// Viewport width in columns
    #[arg(long, default_value_t = 80)]
    cols: usize,

    /// Tab stop width (overrides GED_TAB_WIDTH)
    #[arg(long, value_parser = parse_tab_width)]
    tab_width: Option<usize>,

    /// Start at the first line matching this regular expression
    #[arg(long)]
    find: Option<String>,
}

fn parse_tab_width(s: &str) -> Result<usize, String> {
    let width = s.parse::<usize>().map_err(|e| e.to_string())?;
    if width > MAX_TAB_WIDTH {
        return Err(format!("must be at most {MAX_TAB_WIDTH}"));
    }
    Ok(width)
}

impl Args {
    /// Environment config with command-line overrides applied.
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(width) = self.tab_width {
            config.tab_width = width;
        }
        config
    }
}

// ─── Driver ─────────────────────────────────────────────────────────────────

/// Load `args.path` from `fs` and render one frame of it.
fn render_file(fs: &impl FileSource, args: &Args, config: Config) -> Result<Vec<u8>> {
    let path = args.path.display();
    let info = fs.stat(&args.path).with_context(|| format!("cannot stat {path}"))?;
    tracing::info!(name = %info.name, size = info.size, "opening file");

    let mut file = fs.open(&args.path).with_context(|| format!("cannot open {path}"))?;
    let buffer = Buffer::from_reader(&mut file, config).with_context(|| format!("cannot read {path}"))?;
    let mut window = Window::new(buffer, args.rows, args.cols);

    if let Some(pattern) = &args.find {
        let re = Regex::new(pattern).with_context(|| format!("invalid pattern {pattern:?}"))?;
        if !window.find(&re) {
            tracing::warn!(%pattern, "no line matches");
        }
    }

    let mut raster = Raster::new(args.rows, args.cols);
    window.render(&mut raster);

    let mut frame = Vec::new();
    raster.flush_to(&mut frame)?;
    Ok(frame)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let frame = render_file(&LocalFs, &args, args.config())?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&frame)?;
    stdout.flush()?;
    Ok(())
}

// ─── Tests ──────────────────────────────────────────────────────────────────
