mod backend;
mod core;

pub use crate::core::{StoreError, UserRecord, UserStore};
pub use crate::core::{error, record, store};
pub use crate::backend::{JsonStore, RecordStore};
