use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// Named string fields supplied by callers, e.g. a decoded request body.
pub type FieldMap = BTreeMap<String, String>;

/// Field names a partial update may overwrite. Names outside this set are
/// ignored by the edit path.
pub const UPDATABLE_FIELDS: [&str; 5] =
    ["first_name", "last_name", "email", "gender", "job_title"];

/// One user entity: a unique id plus arbitrary named string fields.
/// No schema is enforced beyond the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(flatten)]
    pub fields: FieldMap,
}

impl UserRecord {
    pub fn new(id: UserId, fields: FieldMap) -> UserRecord {
        UserRecord { id, fields }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.field("email")
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)?;
        for name in ["first_name", "last_name"] {
            if let Some(value) = self.field(name) {
                write!(f, " {}", value)?;
            }
        }
        if let Some(email) = self.email() {
            write!(f, " <{}>", email)?;
        }
        return Ok(());
    }
}
