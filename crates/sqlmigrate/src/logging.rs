use crate::config::MigrationConfig;
use crate::database::Execution;
use crate::statement::Statement;
use tracing::Level;

pub(crate) const TARGET: &str = "sqlmigrate.sql";

/// Emits one `tracing` event per statement, before it is handed to the database.
#[derive(Debug, Clone)]
pub(crate) struct StatementLogger {
    enabled: bool,
    level: Level,
    max_sql_length: Option<usize>,
}

impl StatementLogger {
    pub(crate) fn new(config: &MigrationConfig) -> Self {
        Self {
            enabled: config.log_statements,
            level: config.log_level.into(),
            max_sql_length: config.max_sql_length,
        }
    }

    fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }

    pub(crate) fn before(&self, op: &'static str, sql: &str, param_count: usize) {
        if !self.enabled {
            return;
        }

        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        let kind = crate::statement::StatementKind::of(&sql);
        emit_at_level!(
            self.level,
            target: TARGET,
            op,
            kind = ?kind,
            param_count,
            sql = %sql,
        );
    }

    pub(crate) fn before_statement(&self, op: &'static str, statement: &Statement) {
        self.before(op, statement.sql(), statement.binds().len());
    }

    pub(crate) fn after(&self, op: &'static str, outcome: &Execution) {
        if !self.enabled {
            return;
        }
        if outcome.success {
            tracing::trace!(target: TARGET, op, success = true, row_count = outcome.row_count);
        } else {
            tracing::warn!(target: TARGET, op, "database reported failure");
        }
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
