//! Core type definitions used across the LearnHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
