//! Simulated top-up methods. Neither method verifies payment: a gift link is
//! accepted on a substring match and credited a random amount, a slip is
//! accepted as uploaded and credited the amount the client claims.

pub mod domain;
pub mod errors;
pub mod service;

pub use domain::{SlipUpload, TopupMethod, TopupReceipt};
pub use errors::TopupError;
pub use service::{TopupService, TopupSettings};
