//! # parlor-core
//!
//! Core crate for the Parlor chat gateway. Contains configuration schemas,
//! typed identifiers, domain records, the collaborator traits the gateway
//! consumes (identity resolution, channel access, message storage), and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Parlor crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
