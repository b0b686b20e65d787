//! PID file handling for `server.pid_file`.
//!
//! The file is held under an `fs2` exclusive lock for the life of the
//! server, so a second instance pointed at the same path refuses to start.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use fs2::FileExt;

/// Write the current PID to `path` and lock it.  Keep the returned handle
/// alive until shutdown; dropping it releases the lock.
pub fn write_pid_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .read(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("opening PID file {}: {e}", path.display()))?;

    file.try_lock_exclusive().map_err(|_| {
        anyhow::anyhow!(
            "another hellosvc instance holds the lock on {}",
            path.display()
        )
    })?;

    let pid = std::process::id();
    {
        let mut f = &file;
        writeln!(f, "{pid}")?;
        f.flush()?;
    }

    tracing::info!(path = %path.display(), pid, "PID file written");
    Ok(file)
}

/// Delete the PID file; the lock goes with `_handle`.
pub fn remove_pid_file(path: &Path, _handle: File) {
    match fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "PID file removed"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_instance_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("run").join("hellosvc.pid");

        let handle = write_pid_file(&pid_path).unwrap();
        let stored: u32 = fs::read_to_string(&pid_path).unwrap().trim().parse().unwrap();
        assert_eq!(stored, std::process::id());

        assert!(write_pid_file(&pid_path).is_err());

        remove_pid_file(&pid_path, handle);
        assert!(!pid_path.exists());
    }
}
