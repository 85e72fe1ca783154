//! Freight enquiry extractor — polls mailboxes, tags enquiry emails and
//! appends structured records to a shared JSON file.

pub mod channels;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod store;
