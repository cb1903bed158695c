// ── Fallback store ──
//
// Durable key -> JSON value file used when the catalog is unreachable.
// Values go through untyped JSON, so readers must re-cast them into
// their typed shape on load.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;

/// A JSON object on disk, mirrored in memory.
pub struct FallbackStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl FallbackStore {
    /// Open the store at `path`, creating an empty file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_error(&path, &e))?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| CoreError::Fallback {
                    message: format!("{} is not a JSON object: {e}", path.display()),
                })?
            }
        } else {
            let values = Map::new();
            write_file(&path, &values)?;
            values
        };
        debug!(path = %path.display(), keys = values.len(), "fallback store opened");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the raw JSON stored under `key`.
    pub fn get(&self, key: &str) -> Result<Value, CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::Fallback {
                message: format!("no fallback value for key {key:?}"),
            })
    }

    /// Store `value` under `key` and rewrite the file.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let value = serde_json::to_value(value).map_err(|e| CoreError::Fallback {
            message: format!("unable to serialize value for {key:?}: {e}"),
        })?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value);
        write_file(&self.path, &values)
    }
}

/// Write through a sibling temp file so a crash never leaves a torn file.
fn write_file(path: &Path, values: &Map<String, Value>) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
    }
    let json = serde_json::to_vec_pretty(values).map_err(|e| CoreError::Fallback {
        message: e.to_string(),
    })?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json).map_err(|e| io_error(&tmp, &e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_error(path, &e))
}

fn io_error(path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::Fallback {
        message: format!("{}: {err}", path.display()),
    }
}
