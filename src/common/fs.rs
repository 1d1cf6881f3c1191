use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Config(format!("Path exists but is not a directory: {}", path.display())));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

/// Remove a file if present. Returns whether anything was deleted.
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write `contents` to `path` through a temp file, so readers never see a partial file.
pub(crate) fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let mut pending = open_for_write(path)?;
    pending.write_all(contents.as_ref()).map_err(|e| Error::io(path, e))?;
    finalize_write(pending)
}

/// Write-then-rename wrapper for derived outputs.
pub(crate) struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

/// Open a temp file next to `target`; nothing is visible at `target` until [`finalize_write`].
pub(crate) fn open_for_write(target: &Path) -> Result<PendingWrite> {
    let parent = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    let tmp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;

    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }

    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

/// Flush and move the temp file over its target.
pub(crate) fn finalize_write(mut pending: PendingWrite) -> Result<()> {
    pending.tmp.flush().map_err(|e| Error::io(&pending.target, e))?;
    pending.tmp.as_file().sync_all().ok(); // best-effort fsync file
    pending.tmp.persist(&pending.target)
        .map_err(|e| Error::io(&pending.target, e.error))?;
    if let Some(dir) = pending.target.parent() {
        let _ = File::open(dir).and_then(|f| f.sync_all());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_file_replaces_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        write_file(&path, "first").unwrap();
        write_file(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn dropped_pending_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.geojson");
        {
            let mut pending = open_for_write(&path).unwrap();
            pending.write_all(b"{\"type\":").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn remove_if_exists_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.svg");
        assert!(!remove_if_exists(&path).unwrap());
        fs::write(&path, "<svg/>").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn ensure_dir_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("output");
        fs::write(&file, "").unwrap();
        assert!(ensure_dir_exists(&file).is_err());
        ensure_dir_exists(&dir.path().join("a/b")).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
