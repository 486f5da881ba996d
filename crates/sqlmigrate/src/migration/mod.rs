//! The `Migration` facade: schema and data statements over an injected [`Database`].
//!
//! Each operation sanitizes its identifiers, fills a fixed SQL template, hands the result
//! to the database and returns what the database reports. Operations share no state.
//!
//! The `*_statement` methods build the exact statement an operation would run without
//! running it.

use crate::column::{ColumnDef, Values};
use crate::config::MigrationConfig;
use crate::database::{Database, Execution};
use crate::error::{MigrationError, MigrationResult};
use crate::ident::Ident;
use crate::logging::{StatementLogger, TARGET};
use crate::sanitize::{Sanitizer, StrictSanitizer};
use crate::statement::{Statement, is_placeholder_name};
use crate::value::Value;


/// Schema/data statement facade.
///
/// ```ignore
/// use sqlmigrate::{ColumnDef, Migration, StrictSanitizer, Values};
///
/// let migration = Migration::new(db, StrictSanitizer::new());
/// migration
///     .create_table("users", &[ColumnDef::new("id", "INT"), ColumnDef::new("name", "TEXT")])
///     .await?;
/// migration
///     .insert_value("users", &Values::new().set("id", 1).set("name", "alice"))
///     .await?;
/// assert_eq!(migration.count_rows("users").await?, 1);
/// ```
pub struct Migration<D, S = StrictSanitizer> {
    db: D,
    sanitizer: S,
    config: MigrationConfig,
    logger: StatementLogger,
}

impl<D, S> Migration<D, S>
where
    D: Database,
    S: Sanitizer,
{
    pub fn new(db: D, sanitizer: S) -> Self {
        let config = MigrationConfig::default();
        Self {
            db,
            sanitizer,
            logger: StatementLogger::new(&config),
            config,
        }
    }

    pub fn with_config(mut self, config: MigrationConfig) -> Self {
        self.logger = StatementLogger::new(&config);
        self.config = config;
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn sanitizer(&self) -> &S {
        &self.sanitizer
    }

    pub fn into_parts(self) -> (D, S) {
        (self.db, self.sanitizer)
    }

    fn ident(&self, input: &str) -> MigrationResult<String> {
        self.sanitizer.identifier(input)
    }

    async fn run(&self, op: &'static str, statement: Statement) -> MigrationResult<Execution> {
        statement.validate()?;
        self.logger.before_statement(op, &statement);
        let outcome = self.db.execute(&statement).await.inspect_err(|e| {
            tracing::warn!(target: TARGET, op, error = %e, "statement failed");
        })?;
        self.logger.after(op, &outcome);
        Ok(outcome)
    }

    async fn run_flag(&self, op: &'static str, statement: Statement) -> MigrationResult<bool> {
        Ok(self.run(op, statement).await?.success)
    }

    // ==================== Statement builders ====================

    pub fn create_database_sql(&self, database_name: &str) -> MigrationResult<String> {
        Ok(format!("CREATE DATABASE {}", self.ident(database_name)?))
    }

    pub fn create_table_statement(
        &self,
        table_name: &str,
        columns: &[ColumnDef],
    ) -> MigrationResult<Statement> {
        if columns.is_empty() {
            return Err(MigrationError::validation(format!(
                "table '{table_name}' needs at least one column"
            )));
        }
        let table = self.ident(table_name)?;
        let columns = columns
            .iter()
            .map(|c| c.render(&self.sanitizer))
            .collect::<MigrationResult<Vec<_>>>()?;
        Ok(Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            table,
            columns.join(", ")
        )))
    }

    pub fn is_primary_statement(
        &self,
        table_name: &str,
        column_name: &str,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD PRIMARY KEY ({});",
            self.ident(table_name)?,
            self.ident(column_name)?
        )))
    }

    pub fn is_autoinc_statement(
        &self,
        table_name: &str,
        column: &ColumnDef,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} MODIFY {} AUTO_INCREMENT;",
            self.ident(table_name)?,
            column.render(&self.sanitizer)?
        )))
    }

    pub fn is_unique_statement(
        &self,
        table_name: &str,
        column_name: &str,
    ) -> MigrationResult<Statement> {
        let column = self.ident(column_name)?;
        Ok(Statement::new(format!(
            "ALTER TABLE {} ADD UNIQUE KEY {} ({});",
            self.ident(table_name)?,
            column,
            column
        )))
    }

    pub fn create_column_statement(
        &self,
        table_name: &str,
        column: &ColumnDef,
        after: Option<&str>,
    ) -> MigrationResult<Statement> {
        let mut sql = format!(
            "ALTER TABLE {} ADD {}",
            self.ident(table_name)?,
            column.render(&self.sanitizer)?
        );
        if let Some(after) = after {
            sql.push_str(" AFTER ");
            sql.push_str(&self.ident(after)?);
        }
        sql.push(';');
        Ok(Statement::new(sql))
    }

    pub fn update_column_type_statement(
        &self,
        table_name: &str,
        column: &ColumnDef,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} MODIFY COLUMN {};",
            self.ident(table_name)?,
            column.render(&self.sanitizer)?
        )))
    }

    pub fn rename_table_statement(
        &self,
        old_table: &str,
        new_table: &str,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} RENAME TO {};",
            self.ident(old_table)?,
            self.ident(new_table)?
        )))
    }

    /// `INSERT INTO t (a, b) VALUES (:a,:b)` with one binding per column.
    ///
    /// Columns whose names are not usable as placeholder names (quoted or dotted) are bound
    /// to generated placeholders (`:p1`, `:p2`, ...).
    pub fn insert_value_statement(
        &self,
        table_name: &str,
        values: &Values,
    ) -> MigrationResult<Statement> {
        if values.is_empty() {
            return Err(MigrationError::validation(format!(
                "insert into '{table_name}' needs at least one value"
            )));
        }
        let table = self.ident(table_name)?;

        let mut columns = Vec::with_capacity(values.len());
        let mut placeholders: Vec<String> = Vec::with_capacity(values.len());
        for (i, (column, _)) in values.iter().enumerate() {
            columns.push(self.ident(column)?);
            let mut name = if is_placeholder_name(column) {
                column.to_string()
            } else {
                format!("p{}", i + 1)
            };
            while placeholders.contains(&name)
                || values.iter().any(|(c, _)| c != column && c == name)
            {
                name.push('_');
            }
            placeholders.push(name);
        }

        let mut statement = Statement::new(format!(
            "INSERT INTO {} ({}) VALUES (:{})",
            table,
            columns.join(", "),
            placeholders.join(",:")
        ));
        for (placeholder, (_, value)) in placeholders.iter().zip(values.iter()) {
            statement.push_bind(placeholder, value.clone());
        }
        Ok(statement)
    }

    pub fn update_value_statement(
        &self,
        table_name: &str,
        column_name: &str,
        value: impl Into<Value>,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "UPDATE {} SET {} = :value",
            self.ident(table_name)?,
            self.ident(column_name)?
        ))
        .bind(":value", value))
    }

    /// Looks the table up by the names the server stores: the last segment of the sanitized
    /// identifier (bare names lower-cased) and its schema segment, or
    /// [`Database::database_name`] when the name is not qualified.
    pub fn check_if_table_exist_statement(&self, table_name: &str) -> MigrationResult<Statement> {
        let ident = Ident::parse(&self.ident(table_name)?)?;
        let schema = match ident.schema() {
            Some(schema) => schema,
            None => self.db.database_name().to_string(),
        };
        Ok(Statement::new(format!(
            "SELECT * FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}' LIMIT 1;",
            self.sanitizer.literal(&schema)?,
            self.sanitizer.literal(&ident.name())?
        )))
    }

    pub fn count_rows_statement(&self, table_name: &str) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "SELECT * FROM {};",
            self.ident(table_name)?
        )))
    }

    pub fn drop_column_statement(
        &self,
        table_name: &str,
        column_name: &str,
    ) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.ident(table_name)?,
            self.ident(column_name)?
        )))
    }

    pub fn drop_table_statement(&self, table_name: &str) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "DROP TABLE {};",
            self.ident(table_name)?
        )))
    }

    pub fn truncate_table_statement(&self, table_name: &str) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "TRUNCATE TABLE {};",
            self.ident(table_name)?
        )))
    }

    pub fn drop_database_statement(&self, database_name: &str) -> MigrationResult<Statement> {
        Ok(Statement::new(format!(
            "DROP DATABASE {}",
            self.ident(database_name)?
        )))
    }

    // ==================== Operations ====================

    /// `CREATE DATABASE <name>`; true iff the database reports at least one affected row.
    pub async fn create_database(&self, database_name: &str) -> MigrationResult<bool> {
        let sql = self.create_database_sql(database_name)?;
        self.logger.before("create_database", &sql, 0);
        let affected = self.db.exec(&sql).await.inspect_err(|e| {
            tracing::warn!(target: TARGET, op = "create_database", error = %e, "statement failed");
        })?;
        let outcome = Execution {
            success: affected > 0,
            row_count: affected,
        };
        self.logger.after("create_database", &outcome);
        Ok(outcome.success)
    }

    /// Create a table if it does not exist yet.
    pub async fn create_table(
        &self,
        table_name: &str,
        columns: &[ColumnDef],
    ) -> MigrationResult<bool> {
        let statement = self.create_table_statement(table_name, columns)?;
        self.run_flag("create_table", statement).await
    }

    /// Make a column the table's primary key.
    pub async fn is_primary(&self, table_name: &str, column_name: &str) -> MigrationResult<bool> {
        let statement = self.is_primary_statement(table_name, column_name)?;
        self.run_flag("is_primary", statement).await
    }

    /// Redefine a column with `AUTO_INCREMENT`.
    pub async fn is_autoinc(&self, table_name: &str, column: &ColumnDef) -> MigrationResult<bool> {
        let statement = self.is_autoinc_statement(table_name, column)?;
        self.run_flag("is_autoinc", statement).await
    }

    /// Add a unique key named after the column.
    pub async fn is_unique(&self, table_name: &str, column_name: &str) -> MigrationResult<bool> {
        let statement = self.is_unique_statement(table_name, column_name)?;
        self.run_flag("is_unique", statement).await
    }

    /// Add a column, optionally positioned after an existing one.
    pub async fn create_column(
        &self,
        table_name: &str,
        column: &ColumnDef,
        after: Option<&str>,
    ) -> MigrationResult<bool> {
        let statement = self.create_column_statement(table_name, column, after)?;
        self.run_flag("create_column", statement).await
    }

    /// Change a column's definition.
    pub async fn update_column_type(
        &self,
        table_name: &str,
        column: &ColumnDef,
    ) -> MigrationResult<bool> {
        let statement = self.update_column_type_statement(table_name, column)?;
        self.run_flag("update_column_type", statement).await
    }

    pub async fn rename_table(&self, old_table: &str, new_table: &str) -> MigrationResult<bool> {
        let statement = self.rename_table_statement(old_table, new_table)?;
        self.run_flag("rename_table", statement).await
    }

    /// Insert one row from a column/value map.
    pub async fn insert_value(&self, table_name: &str, values: &Values) -> MigrationResult<bool> {
        let statement = self.insert_value_statement(table_name, values)?;
        self.run_flag("insert_value", statement).await
    }

    /// Set one column to a value on every row of the table.
    pub async fn update_value(
        &self,
        table_name: &str,
        column_name: &str,
        value: impl Into<Value>,
    ) -> MigrationResult<bool> {
        let statement = self.update_value_statement(table_name, column_name, value)?;
        self.run_flag("update_value", statement).await
    }

    /// Whether `information_schema.tables` lists the table.
    pub async fn check_if_table_exist(&self, table_name: &str) -> MigrationResult<bool> {
        let statement = self.check_if_table_exist_statement(table_name)?;
        let outcome = self.run("check_if_table_exist", statement).await?;
        Ok(outcome.row_count >= 1)
    }

    /// Number of rows returned by a full-table `SELECT *`.
    pub async fn count_rows(&self, table_name: &str) -> MigrationResult<u64> {
        let statement = self.count_rows_statement(table_name)?;
        let outcome = self.run("count_rows", statement).await?;
        Ok(outcome.row_count)
    }

    pub async fn drop_column(&self, table_name: &str, column_name: &str) -> MigrationResult<bool> {
        let statement = self.drop_column_statement(table_name, column_name)?;
        self.run_flag("drop_column", statement).await
    }

    pub async fn drop_table(&self, table_name: &str) -> MigrationResult<bool> {
        let statement = self.drop_table_statement(table_name)?;
        self.run_flag("drop_table", statement).await
    }

    pub async fn truncate_table(&self, table_name: &str) -> MigrationResult<bool> {
        let statement = self.truncate_table_statement(table_name)?;
        self.run_flag("truncate_table", statement).await
    }

    pub async fn drop_database(&self, database_name: &str) -> MigrationResult<bool> {
        let statement = self.drop_database_statement(database_name)?;
        self.run_flag("drop_database", statement).await
    }
}
