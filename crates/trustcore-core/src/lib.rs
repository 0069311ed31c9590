//! # trustcore-core
//!
//! Core crate for trustcore. Contains the collaborator traits the managers
//! depend on, configuration schemas, bounded store calls, and the unified
//! error system.
//!
//! The only internal dependency is `trustcore-entity`, whose plain data
//! types appear in the trait signatures and configuration.

pub mod config;
pub mod deadline;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
