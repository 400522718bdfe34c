//! Database migrations for the Pipewarden framework
//!
//! The migrations together form the schema initialization routine: schemas and
//! extensions, the tables of each schema, summary views, `updated_at` triggers,
//! seed rows and development grants. Every step guards its DDL so that running
//! it against an already initialized database changes nothing.

pub use sea_orm_migration::prelude::*;

mod migration;
pub use migration::{Migrator, EXAMPLE_PIPELINE, EXAMPLE_SCENARIO};
