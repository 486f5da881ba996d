//! # sqlmigrate
//!
//! A thin, typed facade for one-off schema and data statements.
//!
//! [`Migration`] fills fixed SQL templates (CREATE/ALTER/DROP TABLE, column changes,
//! INSERT/UPDATE, existence and row-count checks) and hands them to an injected
//! [`Database`]. It owns no connection, transaction or ordering logic.
//!
//! - **One escaping policy**: every identifier goes through [`Sanitizer::identifier`],
//!   every string literal through [`Sanitizer::literal`], every value is bound
//! - **Typed inputs**: [`ColumnDef`] for column definitions, [`Values`] for value maps
//! - **Named placeholders**: statements carry `:name` bindings; [`PgDatabase`] rewrites
//!   them to `$n` for `tokio-postgres`
//! - **Logging**: each statement is emitted as a `tracing` event (target `sqlmigrate.sql`)
//!
//! ```ignore
//! use sqlmigrate::{ColumnDef, Migration, PgDatabase, StrictSanitizer, Values};
//!
//! let migration = Migration::new(PgDatabase::new(client), StrictSanitizer::new());
//!
//! if !migration.check_if_table_exist("users").await? {
//!     migration
//!         .create_table("users", &[ColumnDef::new("id", "INT"), ColumnDef::new("name", "TEXT")])
//!         .await?;
//!     migration.is_primary("users", "id").await?;
//! }
//! migration
//!     .insert_value("users", &Values::new().set("id", 1).set("name", "alice"))
//!     .await?;
//! ```

pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod ident;
pub mod migration;
pub mod postgres;
pub mod sanitize;
pub mod statement;
pub mod value;

mod logging;

pub use column::{ColumnDef, Values};
pub use config::{LogLevel, MigrationConfig};
pub use database::{Database, Execution};
pub use error::{MigrationError, MigrationResult};
pub use ident::Ident;
pub use migration::Migration;
pub use postgres::PgDatabase;
pub use sanitize::{Sanitizer, StrictSanitizer};
pub use statement::{PositionalStatement, Statement, StatementKind};
pub use value::Value;
