//! User accounts: repository abstraction plus the file-backed implementation
//! in `crate::file::user_store`.

pub mod repository;

pub use repository::UserRepository;
