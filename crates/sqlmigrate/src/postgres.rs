//! [`Database`] implementation over `tokio-postgres`.
//!
//! ```ignore
//! let (client, connection) = tokio_postgres::connect(&url, tokio_postgres::NoTls).await?;
//! tokio::spawn(connection);
//!
//! let db = PgDatabase::new(client);
//! let migration = Migration::new(db, StrictSanitizer::new());
//! migration.create_table("users", &[ColumnDef::new("id", "INT")]).await?;
//! ```
//!
//! Statement templates are not translated between dialects. Templates that Postgres does
//! not understand (`AUTO_INCREMENT`, `MODIFY`, `AFTER`, `UNIQUE KEY`) fail with the
//! server's syntax error.

use crate::database::{Database, Execution};
use crate::error::{MigrationError, MigrationResult};
use crate::statement::{Statement, StatementKind};
use futures_util::{TryStream, TryStreamExt, future};
use tokio_postgres::SimpleQueryMessage;

const DEFAULT_SCHEMA: &str = "public";

/// A [`Database`] backed by a `tokio_postgres::Client` or `Transaction`.
pub struct PgDatabase<C> {
    client: C,
    database_name: String,
}

impl<C> PgDatabase<C>
where
    C: tokio_postgres::GenericClient + Send + Sync,
{
    /// Wrap a client; existence checks look in the `public` schema.
    pub fn new(client: C) -> Self {
        Self {
            client,
            database_name: DEFAULT_SCHEMA.to_string(),
        }
    }

    /// Schema reported by [`Database::database_name`].
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C> Database for PgDatabase<C>
where
    C: tokio_postgres::GenericClient + Send + Sync,
{
    /// Runs over the simple query protocol so that statements which refuse to run in a
    /// transaction block (`CREATE DATABASE`) work.
    ///
    /// Utility statements carry no row count; a completed one is reported as 1 affected row.
    async fn exec(&self, sql: &str) -> MigrationResult<u64> {
        let messages = self
            .client
            .client()
            .simple_query(sql)
            .await
            .map_err(MigrationError::from_db_error)?;

        Ok(affected_rows(sql, &messages))
    }

    async fn execute(&self, statement: &Statement) -> MigrationResult<Execution> {
        let positional = statement.to_positional()?;
        let params = positional.params_ref();

        let row_count = if statement.kind().returns_rows() {
            let rows = self
                .client
                .query_raw(positional.sql.as_str(), params.iter().copied())
                .await
                .map_err(MigrationError::from_db_error)?;
            count_streamed(rows)
                .await
                .map_err(MigrationError::from_db_error)?
        } else {
            self.client
                .execute(positional.sql.as_str(), &params)
                .await
                .map_err(MigrationError::from_db_error)?
        };

        Ok(Execution::succeeded(row_count))
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// Sum of the `CommandComplete` counts; a completed utility statement counts as 1.
fn affected_rows(sql: &str, messages: &[SimpleQueryMessage]) -> u64 {
    let mut affected = 0u64;
    let mut completed = false;
    for message in messages {
        if let SimpleQueryMessage::CommandComplete(n) = message {
            affected += n;
            completed = true;
        }
    }

    if completed && StatementKind::of(sql) == StatementKind::Other {
        affected = affected.max(1);
    }
    affected
}

/// Count rows as they arrive; each row is dropped before the next one is read.
async fn count_streamed<S: TryStream>(rows: S) -> Result<u64, S::Error> {
    rows.try_fold(0u64, |n, _row| future::ready(Ok(n + 1))).await
}
