//! Service layer for the top-up portal.
//! - Login through the identity provider and signed session tokens.
//! - File-backed user accounts.
//! - Simulated top-ups and their channel notifications.
//! - Signed slash-command interactions.

pub mod errors;
pub mod auth;
pub mod runtime;
pub mod storage;
pub mod users;
pub mod file;
pub mod notify;
pub mod topup;
pub mod interactions;
