//! Persistence — the shared JSON record file.

pub mod json_store;
pub mod records;

pub use json_store::RecordStore;
pub use records::EmailRecord;
