//! # Project Files
//!
//! `.emb` files are pretty-printed JSON of a [`Project`]. Writes go
//! through a sibling `.emb.tmp` that is synced and then renamed over the
//! target, so a reader never sees a half-written file.
//!
//! Shared project folders are guarded by [`FileLock`]: an OS-level lock
//! (fs2) on a `.emb.lock` sidecar that also records who holds it. A lock
//! whose process is gone, or that is older than [`STALE_LOCK_HOURS`], can
//! be taken over.
//!
//! ## Example
//!
//! ```rust,no_run
//! use carbon_core::file_io::{load_project, save_project, FileLock};
//! use carbon_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Harbour Offices", "26-014", "J. Assessor");
//! let path = Path::new("harbour.emb");
//!
//! let lock = FileLock::acquire(path, "assessor@example.com")?;
//! save_project(&project, path)?;
//! drop(lock);
//!
//! let reloaded = load_project(path)?;
//! assert_eq!(reloaded.meta.id, project.meta.id);
//! # Ok::<(), carbon_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::project::{Project, SCHEMA_VERSION};

/// Locks older than this are considered abandoned
pub const STALE_LOCK_HOURS: i64 = 24;

fn io_error(operation: &str, path: &Path, e: std::io::Error) -> CalcError {
    CalcError::file_error(operation, path.display().to_string(), e.to_string())
}

/// `project.emb` → `project.emb.<suffix>`
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => format!("{}.{suffix}", ext.to_string_lossy()),
        None => suffix.to_string(),
    };
    path.with_extension(extension)
}

// ============================================================================
// Locking
// ============================================================================

/// Who holds a lock, as written to the `.lock` sidecar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Holder of a lock whose sidecar could not be read
    fn unknown() -> Self {
        LockInfo {
            user_id: "unknown".to_string(),
            machine: "unknown".to_string(),
            pid: 0,
            locked_at: Utc::now(),
        }
    }

    /// True when the holder has gone away or the lock has aged out.
    pub fn is_stale(&self) -> bool {
        if Utc::now() - self.locked_at > chrono::Duration::hours(STALE_LOCK_HOURS) {
            return true;
        }
        match hostname() {
            Some(ours) if ours == self.machine => !process_alive(self.pid),
            _ => false,
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    std::process::Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(|e| io_error("read lock", lock_path, e))?;
    serde_json::from_str(&contents).map_err(|e| CalcError::serialization(e.to_string()))
}

/// Whether some open handle holds the OS lock on the sidecar.
fn os_lock_held(lock_path: &Path) -> bool {
    match File::open(lock_path) {
        // This handle's lock is released when it drops
        Ok(file) => file.try_lock_exclusive().is_err(),
        Err(_) => true,
    }
}

/// Exclusive lock on a project file, released on drop.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    // Holds the OS lock for the guard's lifetime
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock on `path` for `user_id`.
    ///
    /// Fails with `FileLocked` when a live holder exists.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        if let Some(holder) = Self::check(path) {
            return Err(CalcError::file_locked(
                path.display().to_string(),
                format!("{} ({})", holder.user_id, holder.machine),
                holder.locked_at.to_rfc3339(),
            ));
        }

        let lock_path = sidecar_path(path, "lock");
        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_error("create lock", &lock_path, e))?;

        // Only the OS lock holder may rewrite the holder record
        handle.try_lock_exclusive().map_err(|_| {
            CalcError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info).map_err(|e| CalcError::serialization(e.to_string()))?;
        handle
            .set_len(0)
            .and_then(|_| handle.write_all(json.as_bytes()))
            .and_then(|_| handle.sync_all())
            .map_err(|e| io_error("write lock", &lock_path, e))?;

        tracing::debug!(path = %path.display(), user = %info.user_id, "acquired project lock");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live holder of the lock on `path`, if any.
    ///
    /// A sidecar that cannot be read counts as held (owner `unknown`)
    /// while its OS lock is taken.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = sidecar_path(path, "lock");
        if !lock_path.exists() {
            return None;
        }
        let info = match read_lock_info(&lock_path) {
            Ok(info) => info,
            Err(e) if os_lock_held(&lock_path) => {
                tracing::warn!(path = %path.display(), error = %e, "lock record unreadable, treating as held");
                return Some(LockInfo::unknown());
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ignoring unreadable lock with no holder");
                return None;
            }
        };
        if info.is_stale() {
            tracing::warn!(path = %path.display(), holder = %info.user_id, "ignoring stale lock");
            None
        } else {
            Some(info)
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

// ============================================================================
// Save / load
// ============================================================================

/// Write `bytes` to `path` via a synced temp file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    let tmp_path = sidecar_path(path, "tmp");

    let result = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .map_err(|e| io_error("write temp file", &tmp_path, e))
        .and_then(|_| fs::rename(&tmp_path, path).map_err(|e| io_error("rename to final", path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Save a project with atomic write semantics.
pub fn save_project(project: &Project, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(project).map_err(|e| CalcError::serialization(e.to_string()))?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!(project = %project.meta.id, path = %path.display(), "project saved");
    Ok(())
}

/// Load a project and check its schema version.
///
/// # Errors
///
/// * `FileError` - the file cannot be read
/// * `SerializationError` - the contents are not a project
/// * `VersionMismatch` - the file was written by an incompatible schema
pub fn load_project(path: &Path) -> CalcResult<Project> {
    let contents = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    let project: Project = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid project file {}: {e}", path.display())))?;
    validate_version(&project.meta.version)?;
    tracing::debug!(project = %project.meta.id, path = %path.display(), "project loaded");
    Ok(project)
}

/// Load a project along with the current lock holder, if someone else has it open.
pub fn load_project_with_lock_check(path: &Path) -> CalcResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.').map(|p| p.parse::<u32>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().and_then(Result::ok).unwrap_or(0);
    Some((major, minor))
}

/// Majors must match; in 0.x a newer minor is also rejected.
pub fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let (file_major, file_minor) = parse_version(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse_version(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::MaterialEntry;
    use crate::registry::{MaterialCategory, MaterialUnit};

    #[test]
    fn test_sidecar_paths() {
        let path = Path::new("/jobs/harbour.emb");
        assert_eq!(sidecar_path(path, "lock"), Path::new("/jobs/harbour.emb.lock"));
        assert_eq!(sidecar_path(path, "tmp"), Path::new("/jobs/harbour.emb.tmp"));
        assert_eq!(sidecar_path(Path::new("bare"), "lock"), Path::new("bare.lock"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depot.emb");

        let mut project = Project::new("Depot", "26-002", "Assessor");
        project.add_material(MaterialEntry::new(
            MaterialCategory::Steel,
            "steel-rebar",
            12.0,
            MaterialUnit::Tonne,
        ));
        save_project(&project, &path).unwrap();

        assert!(!sidecar_path(&path, "tmp").exists());
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn test_load_rejects_garbage_and_newer_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.emb");

        fs::write(&path, "not json").unwrap();
        assert_eq!(load_project(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");

        let mut project = Project::default();
        project.meta.version = "0.9.0".to_string();
        save_project(&project, &path).unwrap();
        assert_eq!(load_project(&path).unwrap_err().error_code(), "VERSION_MISMATCH");

        let missing = dir.path().join("missing.emb");
        assert_eq!(load_project(&missing).unwrap_err().error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_version_rules() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.3").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("latest").is_err());
    }

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.emb");
        let lock_path = sidecar_path(&path, "lock");

        let lock = FileLock::acquire(&path, "first@example.com").unwrap();
        assert!(lock_path.exists());
        assert_eq!(lock.project_path(), path.as_path());

        let holder = FileLock::check(&path).unwrap();
        assert_eq!(holder.user_id, "first@example.com");
        let err = FileLock::acquire(&path, "second@example.com").err().unwrap();
        assert!(err.is_recoverable());

        drop(lock);
        assert!(!lock_path.exists());
        assert!(FileLock::check(&path).is_none());
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("away@example.com");
        assert!(!info.is_stale());
        info.locked_at = Utc::now() - chrono::Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abandoned.emb");

        let mut info = LockInfo::new("gone@example.com");
        info.locked_at = Utc::now() - chrono::Duration::hours(48);
        fs::write(sidecar_path(&path, "lock"), serde_json::to_string(&info).unwrap()).unwrap();

        let lock = FileLock::acquire(&path, "next@example.com").unwrap();
        assert_eq!(lock.info.user_id, "next@example.com");
    }

    #[test]
    fn test_second_acquire_keeps_first_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contended.emb");

        let first = FileLock::acquire(&path, "first@example.com").unwrap();
        let err = FileLock::acquire(&path, "second@example.com").err().unwrap();
        assert_eq!(err.error_code(), "FILE_LOCKED");

        let recorded = read_lock_info(&sidecar_path(&path, "lock")).unwrap();
        assert_eq!(recorded, first.info);
        assert_eq!(FileLock::check(&path).unwrap().user_id, "first@example.com");
    }

    // fs2 locks are advisory on unix, so the sidecar can be rewritten under a live lock
    #[cfg(unix)]
    #[test]
    fn test_os_lock_wins_over_sidecar_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("held.emb");
        let lock_path = sidecar_path(&path, "lock");
        let _first = FileLock::acquire(&path, "first@example.com").unwrap();

        // A record that looks abandoned must not be truncated by a failed takeover
        let mut old = LockInfo::new("first@example.com");
        old.locked_at = Utc::now() - chrono::Duration::hours(48);
        let old_json = serde_json::to_string(&old).unwrap();
        fs::write(&lock_path, &old_json).unwrap();
        assert_eq!(FileLock::acquire(&path, "second@example.com").err().unwrap().error_code(), "FILE_LOCKED");
        assert_eq!(fs::read_to_string(&lock_path).unwrap(), old_json);

        // An unreadable record is held by someone we cannot name
        fs::write(&lock_path, "{\"user_id\": \"fir").unwrap();
        assert_eq!(FileLock::check(&path).unwrap().user_id, "unknown");
    }

    #[test]
    fn test_unreadable_lock_without_holder_is_free() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crashed.emb");
        fs::write(sidecar_path(&path, "lock"), "").unwrap();

        assert!(FileLock::check(&path).is_none());
        let lock = FileLock::acquire(&path, "next@example.com").unwrap();
        assert_eq!(read_lock_info(&sidecar_path(&path, "lock")).unwrap(), lock.info);
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checked.emb");
        save_project(&Project::new("Checked", "J-1", "A"), &path).unwrap();

        let (_, holder) = load_project_with_lock_check(&path).unwrap();
        assert!(holder.is_none());

        let _lock = FileLock::acquire(&path, "editor@example.com").unwrap();
        let (_, holder) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(holder.unwrap().user_id, "editor@example.com");
    }
}
