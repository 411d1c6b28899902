use anyhow::Result;

use crate::core::UserRecord;

/// Loads and saves the full record sequence. The store rewrites the whole
/// sequence on every mutation; there is no partial-update format.
pub trait RecordStore {
    fn load(&self) -> Result<Vec<UserRecord>>;
    fn save(&self, records: &[UserRecord]) -> Result<()>;
}
