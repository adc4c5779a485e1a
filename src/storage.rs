//! Whole-file reads and crash-safe writes.

use anyhow::{Context, Result, bail};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file on disk that is read in one piece and replaced atomically.
#[derive(Clone, Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns `true` if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the entire file into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("failed to read {}", self.path.display()))
    }

    /// Writes `data` to the file using atomic replace.
    ///
    /// The data goes to a randomly named temporary file in the same
    /// directory, is synced, and is then renamed over the target. After a
    /// crash either the old or the new content is present, never a
    /// partial write.
    ///
    /// Creates parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        let tmp_path = self.write_tmp(data)?;

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        self.sync_parent()
    }

    /// Like [`save`](Self::save), but fails if the file already exists.
    ///
    /// The temporary file is hard-linked to the target, so the existence
    /// check and the write are one step: of several concurrent writers
    /// exactly one succeeds. Filesystems without hard links fall back to
    /// an exclusive create of the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists or cannot be written.
    pub fn save_new(&self, data: &[u8]) -> Result<()> {
        let tmp_path = self.write_tmp(data)?;
        let linked = fs::hard_link(&tmp_path, &self.path);
        let _ = fs::remove_file(&tmp_path);

        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("{} already exists", self.path.display());
            }
            Err(e) => {
                debug!(path = %self.path.display(), "hard link failed ({e}), creating in place");
                self.create_exclusive(data)?;
            }
        }

        self.sync_parent()
    }

    /// Writes `data` to a fresh temporary sibling and syncs it.
    fn write_tmp(&self, data: &[u8]) -> Result<PathBuf> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // fails if the name is already taken
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
            .context("failed to create temporary file")?;

        let written = tmp_file
            .write_all(data)
            .and_then(|()| tmp_file.sync_all());
        drop(tmp_file);

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e).context("failed to write temporary file");
        }

        Ok(tmp_path)
    }

    fn create_exclusive(&self, data: &[u8]) -> Result<()> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!("{} already exists", self.path.display());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to create {}", self.path.display()));
            }
        };

        if let Err(e) = file.write_all(data).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&self.path);
            return Err(e).with_context(|| format!("failed to write {}", self.path.display()));
        }

        Ok(())
    }

    /// Returns the path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Generates a unique temporary file path in the same directory.
    ///
    /// Format: `filename.tmp.<randomhex>`
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8]; // 64 bit entropy
        getrandom::fill(&mut buf)
            .map_err(|e| anyhow::anyhow!("OS random generator unavailable: {e}"))?;

        let file_name = self
            .path
            .file_name()
            .with_context(|| format!("{} has no file name", self.path.display()))?
            .to_string_lossy();

        let tmp_name = format!("{}.tmp.{}", file_name, hex::encode(buf));

        Ok(self.path.with_file_name(tmp_name))
    }

    #[cfg(not(target_os = "windows"))]
    fn sync_parent(&self) -> Result<()> {
        let dir = fs::File::open(self.parent().unwrap_or(Path::new(".")))?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(target_os = "windows")]
    fn sync_parent(&self) -> Result<()> {
        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
    /// when the target exists, a plain rename otherwise.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            let err = std::io::Error::last_os_error();
            return Err(err).context("atomic replace failed");
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_returns_written_data() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));

        storage.save(b"hello world").unwrap();

        assert_eq!(storage.load().unwrap(), b"hello world");
    }

    #[test]
    fn load_fails_if_file_does_not_exist() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("missing.enc"));

        let err = storage.load().unwrap_err();
        assert!(err.to_string().contains("missing.enc"));
    }

    #[test]
    fn exists_tracks_save() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));

        assert!(!storage.exists());
        storage.save(b"data").unwrap();
        assert!(storage.exists());
    }

    #[test]
    fn tmp_names_are_unique_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.enc");
        let storage = Storage::new(path.clone());

        let a = storage.random_tmp_path().unwrap();
        let b = storage.random_tmp_path().unwrap();

        assert_ne!(a, b);
        assert_ne!(a, path);
        assert_eq!(a.parent(), path.parent());
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.enc");
        let storage = Storage::new(path.clone());

        storage.save(b"first").unwrap();
        storage.save(b"second").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn save_handles_empty_data() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("empty"));

        storage.save(b"").unwrap();

        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn tmp_file_is_removed_after_success() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));
        storage.save(b"data").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        assert_eq!(entries, vec!["file.enc"]);
    }

    #[test]
    fn save_new_writes_missing_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));

        storage.save_new(b"data").unwrap();

        assert_eq!(storage.load().unwrap(), b"data");
    }

    #[test]
    fn save_new_never_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));
        storage.save(b"first").unwrap();

        let err = storage.save_new(b"second").unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(storage.load().unwrap(), b"first");
    }

    #[test]
    fn save_new_leaves_no_tmp_files() {
        let dir = tempdir().unwrap();
        let storage = Storage::new(dir.path().join("file.enc"));
        storage.save_new(b"first").unwrap();
        let _ = storage.save_new(b"second");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        assert_eq!(entries, vec!["file.enc"]);
    }

    #[test]
    fn concurrent_save_new_has_one_winner() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.enc");

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u8)
                .map(|i| {
                    let storage = Storage::new(path.clone());
                    s.spawn(move || storage.save_new(&[i; 64]).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        let winner = results.iter().position(|ok| *ok).unwrap() as u8;
        assert_eq!(fs::read(&path).unwrap(), vec![winner; 64]);
    }

    #[test]
    fn parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.enc");

        Storage::new(nested.clone()).save(b"data").unwrap();

        assert!(nested.exists());
    }
}
