//! Where parameters, databases and search results are read from, and where
//! reports are written to

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait Storage {
    fn exists(&self, path: &Path) -> bool;

    fn reader(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let mut contents = String::new();
        self.reader(path)?.read_to_string(&mut contents)?;
        Ok(contents)
    }

    /// Write `bytes` to `path`, creating missing parent directories
    fn write_bytes(&self, path: &Path, bytes: Vec<u8>) -> io::Result<()>;
}

/// The local filesystem
#[derive(Copy, Clone, Debug, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn reader(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
        let file = std::fs::File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn write_bytes(&self, path: &Path, bytes: Vec<u8>) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)
    }
}

/// Files held in memory, keyed by path
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<P: Into<PathBuf>, B: Into<Vec<u8>>>(&self, path: P, bytes: B) {
        self.lock().insert(path.into(), bytes.into());
    }

    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<Vec<u8>> {
        self.lock().get(path.as_ref()).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // A panic while holding the lock cannot leave the map half-written
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn reader(&self, path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
        match self.get(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn write_bytes(&self, path: &Path, bytes: Vec<u8>) -> io::Result<()> {
        self.lock().insert(path.into(), bytes);
        Ok(())
    }
}
