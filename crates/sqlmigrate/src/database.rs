//! The database collaborator contract.

use crate::error::MigrationResult;
use crate::statement::Statement;
use std::sync::Arc;

/// Outcome of running a staged [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Execution {
    /// Whether the driver reported success.
    pub success: bool,
    /// Rows returned (for row-returning statements) or affected.
    pub row_count: u64,
}

impl Execution {
    pub fn succeeded(row_count: u64) -> Self {
        Self {
            success: true,
            row_count,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// A database connection the [`Migration`](crate::Migration) facade delegates to.
///
/// The facade owns no connection state: it formats SQL and hands it over. Connection
/// lifecycle, transactions and timeouts are the implementor's business.
pub trait Database: Send + Sync {
    /// Run raw SQL without parameters and return the number of affected rows.
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = MigrationResult<u64>> + Send;

    /// Run a staged statement with its bound values.
    ///
    /// For row-returning statements, [`Execution::row_count`] is the number of rows fetched.
    fn execute(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = MigrationResult<Execution>> + Send;

    /// Name matched against `information_schema.tables.table_schema`.
    fn database_name(&self) -> &str;
}

impl<T: Database> Database for &T {
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = MigrationResult<u64>> + Send {
        (**self).exec(sql)
    }

    fn execute(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = MigrationResult<Execution>> + Send {
        (**self).execute(statement)
    }

    fn database_name(&self) -> &str {
        (**self).database_name()
    }
}

impl<T: Database> Database for Arc<T> {
    fn exec(&self, sql: &str) -> impl std::future::Future<Output = MigrationResult<u64>> + Send {
        (**self).exec(sql)
    }

    fn execute(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = MigrationResult<Execution>> + Send {
        (**self).execute(statement)
    }

    fn database_name(&self) -> &str {
        (**self).database_name()
    }
}
