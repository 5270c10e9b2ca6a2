//! Read-only stores that config files are opened from.

use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// A read-only, named-blob store.
///
/// `read` must report a missing blob with [`io::ErrorKind::NotFound`]; the
/// loader uses that kind to tell an absent overlay from a broken one.
pub trait Source: Send + Sync {
    /// Read the blob stored under exactly `name`.
    fn read(&self, name: &str) -> io::Result<String>;
}

/// Files directly inside a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` to a path under the root, rejecting anything that is
    /// not a single plain file name.
    pub fn path_of(&self, name: &str) -> io::Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid config file name: {name:?}"),
            )),
        }
    }
}

impl Source for DirSource {
    fn read(&self, name: &str) -> io::Result<String> {
        let path = self.path_of(name)?;
        debug!("reading config file (path={})", path.display());
        fs::read_to_string(path)
    }
}

/// Blobs held in memory, keyed by file name.
///
/// Suited to configs compiled into the binary with `include_str!` and to
/// test fixtures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return the store.
    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(name.into(), contents.into());
    }

    /// Names of the stored files in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl<N: Into<String>, C: Into<String>> FromIterator<(N, C)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for (name, contents) in iter {
            source.insert(name, contents);
        }
        source
    }
}

impl Source for MemorySource {
    fn read(&self, name: &str) -> io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("open {name}: file does not exist"),
            )
        })
    }
}

impl<T: Source + ?Sized> Source for &T {
    fn read(&self, name: &str) -> io::Result<String> {
        (**self).read(name)
    }
}

impl<T: Source + ?Sized> Source for Arc<T> {
    fn read(&self, name: &str) -> io::Result<String> {
        (**self).read(name)
    }
}

impl<T: Source + ?Sized> Source for Box<T> {
    fn read(&self, name: &str) -> io::Result<String> {
        (**self).read(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn memory_source_reports_missing_as_not_found() {
        let source = MemorySource::new().with_file("config.yaml", "a: 1");
        assert_eq!(source.read("config.yaml").expect("read"), "a: 1");
        let err = source.read("config.prod.yaml").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn memory_source_collects_from_pairs() {
        let source: MemorySource = [("b.yaml", "b"), ("a.yaml", "a")].into_iter().collect();
        assert_eq!(source.names().collect::<Vec<_>>(), vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn dir_source_reads_files_under_root() {
        let temp = TempDir::new().expect("tmp");
        fs::write(temp.path().join("config.yaml"), "server: {}").expect("write");
        let source = DirSource::new(temp.path());
        assert_eq!(source.read("config.yaml").expect("read"), "server: {}");
        let err = source.read("config.dev.yaml").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn dir_source_rejects_paths_outside_root() {
        let temp = TempDir::new().expect("tmp");
        let source = DirSource::new(temp.path().join("conf"));
        for name in ["../config.yaml", "nested/config.yaml", "", "/etc/passwd"] {
            let err = source.read(name).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name}");
        }
    }
}
