//! # trustcore-entity
//!
//! Domain entity models for trustcore. Every struct in this crate is a plain
//! value object: users, sessions, roles, overrides, policies and the request
//! contexts they are evaluated against. All entities derive `Debug`, `Clone`,
//! `Serialize` and `Deserialize`, so callers always hold their own copy.
//!
//! This crate has **no** internal dependencies on other trustcore crates.

pub mod identity;
pub mod policy;
pub mod role;
pub mod session;
pub mod user;
