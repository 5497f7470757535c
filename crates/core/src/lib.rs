//! Domain types shared by the store and API crates.

pub mod error;
pub mod roles;
pub mod types;
