//! Persisted records for the portal.

pub mod errors;
pub mod user;
