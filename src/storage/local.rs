//! Directory-backed object storage.
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::Error;
use crate::storage::{CorpusSource, ShardEntry, ShardSink};

/// Object storage where keys are paths relative to `root`.
///
/// Files whose name starts with a dot are ignored: they are in-flight writes.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map_or(true, |n| n.starts_with('.'))
    }

    fn check_name(name: &str) -> Result<(), Error> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(Error::Storage(format!("invalid shard name {:?}", name)));
        }
        Ok(())
    }
}

impl CorpusSource for LocalStorage {
    fn keys(&self) -> Result<Vec<String>, Error> {
        if !self.root.is_dir() {
            return Err(Error::Storage(format!(
                "corpus location {:?} is not a directory",
                self.root
            )));
        }

        let root = self
            .root
            .to_str()
            .ok_or_else(|| Error::Storage(format!("non utf-8 path {:?}", self.root)))?;
        let pattern = format!("{}/**/*", glob::Pattern::escape(root));

        let mut keys = Vec::new();
        for path in glob::glob(&pattern)? {
            let path = path?;
            if !path.is_file() || Self::is_hidden(&path) {
                continue;
            }
            let relative = path
                .strip_prefix(&self.root)
                .map_err(|e| Error::Storage(format!("{:?}: {}", path, e)))?;
            let key: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            keys.push(key.join("/"));
        }

        debug!("{} objects in {:?}", keys.len(), self.root);
        Ok(keys)
    }

    fn fetch(&self, key: &str) -> Result<Vec<u8>, Error> {
        fs::read(self.root.join(key))
            .map_err(|e| Error::Storage(format!("could not read object {}: {}", key, e)))
    }
}

impl ShardSink for LocalStorage {
    /// Write into a hidden temporary file next to the destination, then rename it.
    fn put(&self, name: &str, data: &[u8]) -> Result<(), Error> {
        Self::check_name(name)?;
        fs::create_dir_all(&self.root)?;

        let tmp = self
            .root
            .join(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()));
        let dst = self.root.join(name);

        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(data)?;
            f.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &dst)) {
            if let Err(rm) = fs::remove_file(&tmp) {
                warn!("could not remove temporary file {:?}: {}", tmp, rm);
            }
            return Err(Error::Storage(format!(
                "could not publish shard {}: {}",
                name, e
            )));
        }

        debug!("published {:?} ({} bytes)", dst, data.len());
        Ok(())
    }

    fn list(&self) -> Result<Vec<ShardEntry>, Error> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let metadata = entry.metadata()?;
            if !metadata.is_file() || Self::is_hidden(&path) {
                continue;
            }
            entries.push(ShardEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                checksum: None,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
