//! # storage-adapters
//!
//! Implementations of the repository ports. The in-memory store is always
//! compiled; the Postgres store sits behind the `db-postgres` feature.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
