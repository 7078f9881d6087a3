//! Per-file session locks
//!
//! Only one live session may trace a given source file. Each file gets its own
//! lock file, named by a BLAKE3 digest of its canonical path, holding the owner
//! process ID. The flock is what excludes; the content is only for reporting.
//! A lock file left by a dead owner is unlocked and simply taken over.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Who holds a session lock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockContent {
    pub pid: u32,
    /// Unix milliseconds
    pub started_at: u64,
    pub source: PathBuf,
}

impl LockContent {
    fn for_current_process(source: &Path) -> Self {
        let started_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            pid: std::process::id(),
            started_at,
            source: source.to_path_buf(),
        }
    }

    fn read_from(file: &mut File) -> Result<Self> {
        let mut raw = String::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_string(&mut raw)?;
        serde_json::from_str(&raw).context("Corrupt lock file")
    }

    fn write_to(&self, file: &mut File) -> Result<()> {
        let raw = serde_json::to_vec(self).context("Failed to serialize lock content")?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&raw)?;
        file.sync_all()?;
        Ok(())
    }

    /// Whether the owning process still exists
    pub fn is_live(&self) -> bool {
        is_process_alive(self.pid)
    }
}

/// Exclusive claim on live-tracing one source file
///
/// Released on drop; [`SessionLock::release`] reports removal errors.
pub struct SessionLock {
    path: PathBuf,
    // Holds the flock
    _file: File,
}

impl SessionLock {
    /// Claim `source`, failing if a live process already has it
    pub fn acquire(lock_dir: &Path, source: &Path) -> Result<Self> {
        std::fs::create_dir_all(lock_dir)
            .with_context(|| format!("Failed to create lock directory: {}", lock_dir.display()))?;
        let path = Self::lock_path(lock_dir, source);

        // Retry only when the file we locked was unlinked by its last owner
        for _ in 0..3 {
            let mut file = open_lock_file(&path)?;

            if !try_lock(&file)? {
                // A held flock means a live owner, whatever the file says
                return match LockContent::read_from(&mut file) {
                    Ok(holder) => Err(anyhow::anyhow!(
                        "A live session is already running for {} (pid {})",
                        source.display(),
                        holder.pid
                    )),
                    Err(_) => Err(anyhow::anyhow!(
                        "A live session is already running for {}",
                        source.display()
                    )),
                };
            }

            if !still_linked(&file, &path)? {
                tracing::debug!("Lock file replaced while locking, retrying");
                continue;
            }

            // Leftover content from a dead owner is overwritten
            LockContent::for_current_process(source).write_to(&mut file)?;
            return Ok(Self { path, _file: file });
        }

        anyhow::bail!("Could not lock {}", source.display())
    }

    /// Current live holder of the lock for `source`, if any
    pub fn inspect(lock_dir: &Path, source: &Path) -> Result<Option<LockContent>> {
        let path = Self::lock_path(lock_dir, source);
        if !path.exists() {
            return Ok(None);
        }

        let mut file = open_lock_file(&path)?;
        // Lock obtained means nobody holds it; closing the file drops it again
        if try_lock(&file)? {
            return Ok(None);
        }

        Ok(LockContent::read_from(&mut file)
            .ok()
            .filter(LockContent::is_live))
    }

    /// `<lock_dir>/<first 16 hex digits of blake3(source)>.lock`
    pub fn lock_path(lock_dir: &Path, source: &Path) -> PathBuf {
        let digest = blake3::hash(source.to_string_lossy().as_bytes());
        let hex = digest.to_hex();
        lock_dir.join(format!("{}.lock", &hex[..16]))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file and give up the claim
    pub fn release(self) -> Result<()> {
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove lock file: {}", self.path.display()))
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        // Already gone after release()
        let _ = std::fs::remove_file(&self.path);
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file: {}", path.display()))
}

/// Whether `path` still names the open `file`
#[cfg(unix)]
fn still_linked(file: &File, path: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let opened = file.metadata().context("Failed to stat lock file")?;
    match std::fs::metadata(path) {
        Ok(current) => Ok(current.dev() == opened.dev() && current.ino() == opened.ino()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).context("Failed to stat lock file"),
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Path) -> Result<bool> {
    Ok(true)
}

/// Non-blocking exclusive flock; false if someone else holds it
#[cfg(unix)]
fn try_lock(file: &File) -> Result<bool> {
    use nix::errno::Errno;
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(()) => Ok(true),
        Err(Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e).context("flock failed"),
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // No signal sent, existence check only; EPERM still means it exists
    !matches!(kill(Pid::from_raw(pid as i32), None), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}
