use anyhow::Context;

use crate::backend::RecordStore;
use crate::core::error::{StoreError, StoreResult};
use crate::core::record::{FieldMap, UserId, UserRecord, UPDATABLE_FIELDS};

/// The owned, ordered collection of user records plus its persistence
/// backend.
///
/// Every mutating operation rewrites the full sequence through the backend
/// before returning. A failed rewrite surfaces as
/// [`StoreError::Persistence`] but does not undo the in-memory change.
pub struct UserStore {
    records: Vec<UserRecord>,
    next_id: UserId,
    backend: Box<dyn RecordStore + Send + Sync>,
}

impl UserStore {
    /// Loads all records from the backend. The id counter starts one past
    /// the highest id on file and only ever grows, so ids are not reused
    /// within a process lifetime.
    pub fn open<B>(backend: B) -> anyhow::Result<UserStore>
    where
        B: RecordStore + Send + Sync + 'static,
    {
        let records = backend.load().context("failed to load user records")?;
        let next_id = records.iter().map(|record| record.id).max().unwrap_or(0) + 1;
        return Ok(UserStore {
            records,
            next_id,
            backend: Box::new(backend),
        });
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Linear scan; the roster is small and not ordered by id.
    pub fn find_by_id(&self, id: UserId) -> Option<&UserRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.records
            .iter()
            .find(|record| record.email() == Some(email))
    }

    /// Appends a new record built from `fields` under a freshly assigned id
    /// and persists the sequence. An email already on the roster is
    /// rejected; uniqueness is checked here and nowhere else.
    pub fn insert(&mut self, fields: FieldMap) -> StoreResult<UserRecord> {
        if fields.is_empty() {
            return Err(StoreError::EmptyBody("append"));
        }
        if let Some(email) = fields.get("email") {
            if self.find_by_email(email).is_some() {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let record = UserRecord::new(self.next_id, fields);
        self.next_id += 1;
        self.records.push(record.clone());
        self.persist()?;
        return Ok(record);
    }

    /// Overwrites the updatable fields present in `fields` on the matched
    /// record; unrecognised names are ignored. Returns the updated record.
    pub fn update(&mut self, id: UserId, fields: FieldMap) -> StoreResult<UserRecord> {
        if fields.is_empty() {
            return Err(StoreError::EmptyBody("edit"));
        }
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::UnknownId(id))?;

        for name in UPDATABLE_FIELDS {
            if let Some(value) = fields.get(name) {
                record.fields.insert(name.to_owned(), value.clone());
            }
        }
        let updated = record.clone();

        self.persist()?;
        return Ok(updated);
    }

    /// Removes the first record matching `id` and persists the sequence.
    pub fn remove(&mut self, id: UserId) -> StoreResult<()> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(StoreError::UnknownId(id))?;
        self.records.remove(position);
        self.persist()?;
        return Ok(());
    }

    fn persist(&self) -> StoreResult<()> {
        self.backend
            .save(&self.records)
            .map_err(StoreError::Persistence)
    }
}
