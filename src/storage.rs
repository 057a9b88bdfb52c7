use crate::codec;
use crate::registry::{RegistryError, ShortcutRegistry};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: RegistryError,
    },
    #[error("failed to encode shortcuts for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: RegistryError,
    },
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no file to reload or save; use save_to_path")]
    NoSourcePath,
}

/// Read and decode a shortcuts file.
pub fn load(path: &Path) -> Result<ShortcutRegistry, StorageError> {
    Ok(ShortcutsDocument::load_path(path)?.registry)
}

/// Commit staged edits, encode, and atomically replace `path`.
pub fn save(path: &Path, registry: &mut ShortcutRegistry) -> Result<(), StorageError> {
    let bytes = encode_checked(path, registry)?;
    write_atomic(path, &bytes).map_err(|source| StorageError::WriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// A loaded shortcuts file, keeping the bytes it was read from so an
/// unmodified document saves byte-for-byte (trailing padding included).
#[derive(Debug, Clone)]
pub struct ShortcutsDocument {
    pub source_path: Option<PathBuf>,
    pub original_bytes: Vec<u8>,
    pub registry: ShortcutRegistry,
    pub dirty: bool,
}

impl ShortcutsDocument {
    pub fn load_path(path: &Path) -> Result<Self, StorageError> {
        let bytes = fs::read(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry =
            ShortcutRegistry::from_bytes(&bytes).map_err(|source| StorageError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            shortcuts = registry.len(),
            "loaded shortcuts"
        );

        Ok(Self {
            source_path: Some(path.to_path_buf()),
            original_bytes: bytes,
            registry,
            dirty: false,
        })
    }

    /// Re-read the source file, replacing the tree and dropping every edit.
    /// On failure the document is left as it was.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        let path = self.source_path.clone().ok_or(StorageError::NoSourcePath)?;
        *self = Self::load_path(&path)?;
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Recompute `dirty` from the tree alone. Staged edits count as dirty without being
    /// committed. Re-encoding is not compared with `original_bytes`: trailing padding,
    /// duplicate keys and non-UTF-8 keys all make an untouched file encode differently.
    pub fn refresh_dirty(&mut self) {
        self.dirty = self.registry.is_modified();
    }

    fn is_clean(&self) -> bool {
        !self.dirty && !self.registry.is_modified()
    }

    /// Bytes that a save would write. Commits staged edits.
    pub fn save_bytes(&mut self) -> Result<Vec<u8>, RegistryError> {
        if self.is_clean() {
            return Ok(self.original_bytes.clone());
        }
        self.registry.to_bytes()
    }

    pub fn save(&mut self) -> Result<(), StorageError> {
        let path = self.source_path.clone().ok_or(StorageError::NoSourcePath)?;
        self.save_to_path(&path)
    }

    pub fn save_to_path(&mut self, path: &Path) -> Result<(), StorageError> {
        let bytes = self
            .save_bytes()
            .map_err(|source| StorageError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
        check_decodes(path, &bytes)?;
        write_atomic(path, &bytes).map_err(|source| StorageError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })?;

        // Start a fresh session from what is now on disk.
        self.registry
            .reload(&bytes)
            .map_err(|source| StorageError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        self.source_path = Some(path.to_path_buf());
        self.original_bytes = bytes;
        self.dirty = false;
        Ok(())
    }
}

/// Commit, encode, and decode the result once more before anything touches the disk.
fn encode_checked(path: &Path, registry: &mut ShortcutRegistry) -> Result<Vec<u8>, StorageError> {
    let bytes = registry
        .to_bytes()
        .map_err(|source| StorageError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    check_decodes(path, &bytes)?;
    Ok(bytes)
}

fn check_decodes(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    codec::decode(bytes)
        .map(drop)
        .map_err(|e| StorageError::Encode {
            path: path.to_path_buf(),
            source: e.into(),
        })
}

/// Replace `path` with `bytes` all-or-nothing: write a temp file next to it, sync, then rename over.
/// An existing file keeps its permissions.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".shortcuts")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{StorageError, write_atomic};
    use crate::registry::ShortcutRegistry;
    use crate::value::PropertyValue;
    use std::fs;

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.vdf");
        fs::write(&path, b"old contents").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("shortcuts.vdf")]);
    }

    #[test]
    fn failed_encode_leaves_existing_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortcuts.vdf");
        let mut root = indexmap::IndexMap::new();
        let mut entries = indexmap::IndexMap::new();
        let mut entry = indexmap::IndexMap::new();
        entry.insert("Exe".to_string(), PropertyValue::text("ok"));
        entries.insert("0".to_string(), PropertyValue::Object(entry));
        root.insert("shortcuts".to_string(), PropertyValue::Object(entries));
        let mut reg = ShortcutRegistry::from_root(PropertyValue::Object(root)).unwrap();
        reg.stage_field_edit("0", "Exe", "bad\0path").unwrap();

        fs::write(&path, b"previous").unwrap();
        let err = super::save(&path, &mut reg).unwrap_err();
        assert!(matches!(err, StorageError::Encode { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn load_reports_path_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.vdf");
        match super::load(&path) {
            Err(StorageError::Read { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
