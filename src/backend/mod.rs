mod interface;
mod json_store;

pub use interface::RecordStore;
pub use json_store::JsonStore;
