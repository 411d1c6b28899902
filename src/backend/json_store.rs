use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backend::RecordStore;
use crate::core::UserRecord;

/// Keeps the record sequence as a single JSON array in one file.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl AsRef<Path>) -> JsonStore {
        JsonStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl RecordStore for JsonStore {
    fn load(&self) -> Result<Vec<UserRecord>> {
        let file = fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let records = serde_json::from_reader(file)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        return Ok(records);
    }

    // Writes to a sibling temp file and renames it over the target, so a
    // crash mid-write cannot leave a truncated array behind.
    fn save(&self, records: &[UserRecord]) -> Result<()> {
        let tmp = self.tmp_path();
        let payload = serde_json::to_vec(records).context("failed to serialize records")?;
        fs::write(&tmp, payload).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        return Ok(());
    }
}
