//! Database connection and query utilities

pub use sea_orm;
mod connection;

pub use connection::{establish_connection, DbConnection, MEMORY_DATABASE_URL};

// Export test utilities for use by other crates in their tests
pub mod test_utils;
