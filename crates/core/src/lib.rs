//! Core library for TaskVault
//!
//! This crate contains the core state management, including:
//! - Session handling (mock authentication)
//! - Per-user task storage with completion filtering
//! - Key-value persistence

pub mod error;
pub mod event;
pub mod session;
pub mod storage;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
