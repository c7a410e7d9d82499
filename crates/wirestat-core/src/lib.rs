//! # wirestat-core
//!
//! Core crate for WireStat. Contains configuration schemas, typed
//! identifiers, and the unified error system shared by the workspace.
//!
//! This crate has **no** internal dependencies on other WireStat crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
