use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mmwave_traits::{BoxError, LimitStore};

use crate::error::{HwError, Result};

/// In-memory store. Clones share the same map, so a caller can keep a handle
/// and inspect what the tracker persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, f32>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: f32) -> Self {
        if let Ok(mut m) = self.values.lock() {
            m.insert(key.to_string(), value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.values.lock().ok()?.get(key).copied()
    }
}

impl LimitStore for MemoryStore {
    fn load(&self, key: &str) -> Option<f32> {
        self.get(key)
    }

    fn save(&mut self, key: &str, value: f32) -> std::result::Result<(), BoxError> {
        let mut m = self
            .values
            .lock()
            .map_err(|_| HwError::Encode("limit store lock poisoned".into()))?;
        m.insert(key.to_string(), value);
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// Limits persisted as a flat TOML table (`max_distance = 3.5`).
///
/// Every save rewrites the file atomically (temp file + rename).
#[derive(Debug)]
pub struct FileLimitStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
}

impl FileLimitStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str::<BTreeMap<String, f32>>(&s).map_err(|e| HwError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(HwError::Io(e)),
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "opened limit store");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let body = toml::to_string(&self.values).map_err(|e| HwError::Encode(e.to_string()))?;
        write_atomic(&self.path, body.as_bytes())?;
        Ok(())
    }
}

impl LimitStore for FileLimitStore {
    fn load(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn save(&mut self, key: &str, value: f32) -> std::result::Result<(), BoxError> {
        self.values.insert(key.to_string(), value);
        self.flush()?;
        tracing::debug!(key, value, path = %self.path.display(), "persisted limit");
        Ok(())
    }
}
