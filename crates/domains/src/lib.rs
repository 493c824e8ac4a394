//! volunteer-hub/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for Volunteer Hub.

pub mod error;
pub mod models;
pub mod ports;
pub mod reputation;
pub mod workflow;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
