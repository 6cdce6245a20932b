//! Repository implementations module.
//!
//! - `local`: In-memory implementation for development, tests and single-node runs

pub mod local;

pub use local::LocalRepository;
