//! # learnhub-core
//!
//! Core crate for the LearnHub notification subsystem. Contains
//! configuration schemas, pagination types, the unified error system,
//! and logging setup.
//!
//! This crate has **no** internal dependencies on other LearnHub crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
