//! Storage abstractions for service layer
//!
//! Contains the file-backed map store used to persist small documents as JSON.

pub mod json_map_store;
