use std::path::{Path, PathBuf};
use std::sync::Arc;

use lasr_lang_asr::HashMap;

use crate::result::{DriverError, DriverResult};

pub trait FileSource {
    /// Check if a file with the given path exists
    fn exists(&mut self, path: &Path) -> DriverResult<bool>;
    /// Read the contents of a file with the given path
    fn read_to_string(&mut self, path: &Path) -> DriverResult<String>;
    /// Write the contents of a file with the given path
    ///
    /// Depending on the source, this may write to disk or to memory
    fn write_string(&mut self, path: &Path, source: &str) -> DriverResult;
    /// Read a file, with `None` standing for a file that does not exist.
    ///
    /// Used by the module loader, which tries several names before giving up.
    fn read_file(&mut self, path: &Path) -> DriverResult<Option<String>> {
        match self.read_to_string(path) {
            Ok(source) => Ok(Some(source)),
            Err(DriverError::FileNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
    /// If a path is requested that is not managed by this source, fall back to another source
    fn fallback_to<S: FileSource>(self, fallback: S) -> OverlaySource<Self, S>
    where
        Self: Sized,
    {
        OverlaySource::new(self, fallback)
    }
}

/// A file source that reads from and writes to the file system
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl FileSource for FileSystemSource {
    fn exists(&mut self, path: &Path) -> DriverResult<bool> {
        Ok(self.root.join(path).is_file())
    }

    fn read_to_string(&mut self, path: &Path) -> DriverResult<String> {
        let full = self.root.join(path);
        match std::fs::read_to_string(&full) {
            Ok(source) => Ok(source),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(DriverError::FileNotFound(full))
            }
            Err(err) => Err(DriverError::Io(Arc::new(err))),
        }
    }

    fn write_string(&mut self, path: &Path, source: &str) -> DriverResult {
        let full = self.root.join(path);
        std::fs::write(&full, source).map_err(Arc::new).map_err(DriverError::Io)?;
        Ok(())
    }
}

/// A file source that keeps files in memory
#[derive(Default)]
pub struct InMemorySource {
    files: HashMap<PathBuf, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, source: String) {
        self.files.insert(path.into(), source);
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

impl FileSource for InMemorySource {
    fn exists(&mut self, path: &Path) -> DriverResult<bool> {
        Ok(self.files.contains_key(path))
    }

    fn read_to_string(&mut self, path: &Path) -> DriverResult<String> {
        self.files.get(path).cloned().ok_or_else(|| DriverError::FileNotFound(path.to_owned()))
    }

    fn write_string(&mut self, path: &Path, source: &str) -> DriverResult {
        self.files.insert(path.to_owned(), source.to_owned());
        Ok(())
    }
}

/// A source that first tries to access files from the first source, and falls back to the second
pub struct OverlaySource<S1, S2> {
    first: S1,
    second: S2,
}

impl<S1, S2> OverlaySource<S1, S2> {
    pub fn new(first: S1, second: S2) -> Self {
        Self { first, second }
    }
}

impl<S1, S2> FileSource for OverlaySource<S1, S2>
where
    S1: FileSource,
    S2: FileSource,
{
    fn exists(&mut self, path: &Path) -> DriverResult<bool> {
        Ok(self.first.exists(path)? || self.second.exists(path)?)
    }

    fn read_to_string(&mut self, path: &Path) -> DriverResult<String> {
        match self.first.read_to_string(path) {
            Ok(source) => Ok(source),
            Err(DriverError::FileNotFound(_)) => self.second.read_to_string(path),
            Err(err) => Err(err),
        }
    }

    fn write_string(&mut self, path: &Path, source: &str) -> DriverResult {
        if self.first.exists(path)? {
            self.first.write_string(path, source)
        } else {
            self.second.write_string(path, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_read_as_none() {
        let mut source = InMemorySource::new();
        source.insert("a.mod", "contents".to_owned());
        assert_eq!(source.read_file(Path::new("a.mod")).unwrap().as_deref(), Some("contents"));
        assert_eq!(source.read_file(Path::new("b.mod")).unwrap(), None);
    }

    #[test]
    fn overlay_prefers_the_first_source() {
        let mut first = InMemorySource::new();
        first.insert("a.mod", "first".to_owned());
        let mut second = InMemorySource::new();
        second.insert("a.mod", "second".to_owned());
        second.insert("b.mod", "only second".to_owned());

        let mut source = first.fallback_to(second);
        assert_eq!(source.read_to_string(Path::new("a.mod")).unwrap(), "first");
        assert_eq!(source.read_to_string(Path::new("b.mod")).unwrap(), "only second");
        assert!(!source.exists(Path::new("c.mod")).unwrap());
    }

    #[test]
    fn file_system_source_reads_relative_to_its_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileSystemSource::new(dir.path());
        source.write_string(Path::new("m.mod"), "text").unwrap();
        assert!(source.exists(Path::new("m.mod")).unwrap());
        assert_eq!(source.read_file(Path::new("m.mod")).unwrap().as_deref(), Some("text"));
        assert_eq!(source.read_file(Path::new("other.mod")).unwrap(), None);
    }
}
