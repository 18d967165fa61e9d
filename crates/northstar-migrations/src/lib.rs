//! Database migrations for the Northstar event store

pub use sea_orm_migration::prelude::*;

mod migration;

pub use migration::Migrator;
