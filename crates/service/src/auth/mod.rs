//! Auth module: identity provider bridge, signed session tokens and the
//! service tying them to the user repository.

pub mod discord;
pub mod domain;
pub mod errors;
pub mod provider;
pub mod service;
pub mod session;

pub use service::AuthService;
