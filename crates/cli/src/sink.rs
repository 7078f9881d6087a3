//! Display sinks for the command line

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use session::DisplaySink;
use tracing::warn;

/// Clear-and-redraw terminal display
pub struct TerminalSink<W: Write + Send + 'static> {
    out: W,
    title: String,
}

impl TerminalSink<io::Stdout> {
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::new(io::stdout(), title)
    }
}

impl<W: Write + Send + 'static> TerminalSink<W> {
    pub fn new(out: W, title: impl Into<String>) -> Self {
        Self {
            out,
            title: title.into(),
        }
    }

    fn redraw(&mut self, text: &str) -> io::Result<()> {
        // Clear screen, cursor home
        write!(self.out, "\x1b[2J\x1b[H")?;
        writeln!(self.out, "{}", self.title.dimmed())?;
        self.out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send + 'static> DisplaySink for TerminalSink<W> {
    fn set_text(&mut self, text: &str) {
        if let Err(e) = self.redraw(text) {
            warn!("Failed to redraw terminal: {}", e);
        }
    }
}

/// Writes each trace to a file, replacing it atomically
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplaySink for FileSink {
    fn set_text(&mut self, text: &str) {
        if let Err(e) = atomic_write(&self.path, text.as_bytes()) {
            warn!("Failed to write trace to {}: {}", self.path.display(), e);
        }
    }
}

/// Write to a temp file in the target's directory, fsync, then rename over the target
pub fn atomic_write(target: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
