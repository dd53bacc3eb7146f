use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::patch::{apply_patch, PatchOp};
use crate::types::ProfileDoc;

/// On-disk + in-memory profile document.
///
/// The cache is the single source of truth for prompt assembly; the file
/// only exists so the document survives restarts. Writes go through a temp
/// file in the same directory followed by a rename, with a directory fsync
/// where the platform supports it.
pub struct ProfileStore {
    path: PathBuf,
    cache: Mutex<Value>,
}

impl ProfileStore {
    /// Load the profile, copying the empty template on first open.
    pub fn open(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let raw = fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&raw)?;
            ProfileDoc::validate(&value)?;
            value
        } else {
            let template = ProfileDoc::template();
            persist_atomic(path, &template)?;
            info!(path = %path.display(), "profile template written");
            template
        };
        Ok(Self {
            path: path.to_path_buf(),
            cache: Mutex::new(doc),
        })
    }

    /// Deep copy of the current document for prompt assembly. Never reads
    /// the disk.
    pub fn snapshot(&self) -> Value {
        self.cache.lock().unwrap().clone()
    }

    /// Apply a patch: validate the result against the profile shape, then
    /// update cache and disk together. On any failure the cache (and the
    /// file) keep the previous document.
    pub fn apply_patch(&self, ops: &[PatchOp]) -> Result<()> {
        let mut cache = self.cache.lock().unwrap();
        let patched = apply_patch(&cache, ops)?;
        ProfileDoc::validate(&patched)?;
        persist_atomic(&self.path, &patched)?;
        *cache = patched;
        info!(ops = ops.len(), "profile patch applied");
        Ok(())
    }
}

fn persist_atomic(path: &Path, value: &Value) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "profile".into())
    ));

    let rendered = serde_json::to_string_pretty(value)?;
    {
        use std::io::Write;
        let mut file = fs::File::create(&tmp)?;
        file.write_all(rendered.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    // Make the rename durable where the platform allows opening a directory.
    if let Ok(dir_handle) = fs::File::open(dir) {
        if let Err(e) = dir_handle.sync_all() {
            warn!(error = %e, "directory fsync failed after profile rename");
        }
    }
    Ok(())
}
