//! Staged statements with named placeholders.
//!
//! A [`Statement`] is what the facade hands to a [`Database`](crate::Database): SQL text
//! using `:name` placeholders plus the values bound to them. Drivers that only understand
//! positional parameters call [`Statement::to_positional`].
//!
//! ```ignore
//! use sqlmigrate::Statement;
//!
//! let stmt = Statement::new("UPDATE users SET name = :value").bind(":value", "alice");
//! let positional = stmt.to_positional()?;
//! assert_eq!(positional.sql, "UPDATE users SET name = $1");
//! ```

use crate::error::{MigrationError, MigrationResult};
use crate::value::Value;
use std::fmt::Write;
use std::ops::Range;
use tokio_postgres::types::ToSql;

/// Coarse classification of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows (SELECT, WITH, SHOW, VALUES)
    Select,
    Insert,
    Update,
    Delete,
    /// DDL and everything else
    Other,
}

impl StatementKind {
    /// Classify by the first keyword, skipping comments and leading parentheses.
    pub fn of(sql: &str) -> Self {
        let s = strip_sql_prefix(sql);
        if ["SELECT", "WITH", "SHOW", "VALUES"]
            .iter()
            .any(|kw| starts_with_keyword(s, kw))
        {
            StatementKind::Select
        } else if starts_with_keyword(s, "INSERT") {
            StatementKind::Insert
        } else if starts_with_keyword(s, "UPDATE") {
            StatementKind::Update
        } else if starts_with_keyword(s, "DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }

    pub fn returns_rows(self) -> bool {
        self == StatementKind::Select
    }
}

/// SQL text plus the values bound to its `:name` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    binds: Vec<(String, Value)>,
}

/// A [`Statement`] rewritten to `$1, $2, ...` placeholders.
#[derive(Debug)]
pub struct PositionalStatement<'a> {
    pub sql: String,
    pub params: Vec<&'a Value>,
}

impl PositionalStatement<'_> {
    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|v| *v as &(dyn ToSql + Sync))
            .collect()
    }
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Bind a value to a placeholder (`":name"` or `"name"`), replacing any earlier value.
    pub fn bind(mut self, placeholder: &str, value: impl Into<Value>) -> Self {
        self.push_bind(placeholder, value);
        self
    }

    /// In-place variant of [`bind`](Self::bind).
    pub fn push_bind(&mut self, placeholder: &str, value: impl Into<Value>) -> &mut Self {
        let name = if placeholder.starts_with(':') {
            placeholder.to_string()
        } else {
            format!(":{placeholder}")
        };
        let value = value.into();
        match self.binds.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.binds.push((name, value)),
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound `(placeholder, value)` pairs in binding order.
    pub fn binds(&self) -> &[(String, Value)] {
        &self.binds
    }

    /// Look up the value bound to a placeholder.
    pub fn value(&self, placeholder: &str) -> Option<&Value> {
        let name = placeholder.strip_prefix(':').unwrap_or(placeholder);
        self.binds
            .iter()
            .find(|(n, _)| &n[1..] == name)
            .map(|(_, v)| v)
    }

    pub fn kind(&self) -> StatementKind {
        StatementKind::of(&self.sql)
    }

    /// Placeholders as they appear in the SQL, including repeats.
    pub fn placeholders(&self) -> Vec<&str> {
        scan_placeholders(&self.sql)
            .into_iter()
            .map(|r| &self.sql[r])
            .collect()
    }

    /// Check that every placeholder is bound and every binding is used.
    pub fn validate(&self) -> MigrationResult<()> {
        for (name, _) in &self.binds {
            if !is_placeholder_name(&name[1..]) {
                return Err(MigrationError::validation(format!(
                    "invalid placeholder name '{name}'"
                )));
            }
        }
        let used = self.placeholders();
        if let Some(missing) = used.iter().find(|p| self.value(p).is_none()) {
            return Err(MigrationError::validation(format!(
                "placeholder {missing} has no bound value"
            )));
        }
        if let Some((unused, _)) = self.binds.iter().find(|(n, _)| !used.contains(&n.as_str())) {
            return Err(MigrationError::validation(format!(
                "value bound to {unused} does not appear in the statement"
            )));
        }
        Ok(())
    }

    /// Rewrite named placeholders to positional ones; a repeated name reuses its index.
    pub fn to_positional(&self) -> MigrationResult<PositionalStatement<'_>> {
        self.validate()?;

        let mut sql = String::with_capacity(self.sql.len());
        let mut order: Vec<&str> = Vec::new();
        let mut params = Vec::new();
        let mut last = 0;

        for range in scan_placeholders(&self.sql) {
            let name = &self.sql[range.clone()];
            sql.push_str(&self.sql[last..range.start]);
            let idx = match order.iter().position(|n| *n == name) {
                Some(i) => i + 1,
                None => {
                    let value = self.value(name).ok_or_else(|| {
                        MigrationError::validation(format!("placeholder {name} has no bound value"))
                    })?;
                    order.push(name);
                    params.push(value);
                    order.len()
                }
            };
            let _ = write!(&mut sql, "${idx}");
            last = range.end;
        }
        sql.push_str(&self.sql[last..]);

        Ok(PositionalStatement { sql, params })
    }
}

pub(crate) fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Byte ranges of `:name` placeholders outside literals, quoted identifiers, comments and
/// `::` casts.
fn scan_placeholders(sql: &str) -> Vec<Range<usize>> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < len {
                    if bytes[i] == quote {
                        if i + 1 < len && bytes[i + 1] == quote {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < len && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
            }
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' => {
                let start = i;
                let mut j = i + 1;
                if j < len && (bytes[j] == b'_' || bytes[j].is_ascii_alphabetic()) {
                    j += 1;
                    while j < len && (bytes[j] == b'_' || bytes[j].is_ascii_alphanumeric()) {
                        j += 1;
                    }
                    out.push(start..j);
                }
                i = j;
            }
            _ => i += 1,
        }
    }
    out
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if let Some(rest) = s.strip_prefix("--") {
            match rest.find('\n') {
                Some(pos) => s = &rest[pos + 1..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => s = &rest[pos + 2..],
                None => return "",
            }
            continue;
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_normalizes_and_replaces() {
        let stmt = Statement::new("UPDATE t SET a = :value")
            .bind("value", 1)
            .bind(":value", 2);
        assert_eq!(stmt.binds().len(), 1);
        assert_eq!(stmt.binds()[0].0, ":value");
        assert_eq!(stmt.value(":value"), Some(&Value::Int(2)));
        assert_eq!(stmt.value("value"), Some(&Value::Int(2)));
    }

    #[test]
    fn placeholders_skip_literals_casts_and_comments() {
        let stmt = Statement::new(
            "SELECT ':nope', \"a:b\", x::text, :one -- :two\n FROM t WHERE y = :three /* :four */",
        );
        assert_eq!(stmt.placeholders(), vec![":one", ":three"]);
    }

    #[test]
    fn positional_rewrite_reuses_indices() {
        let stmt = Statement::new("INSERT INTO t (a, b, c) VALUES (:a,:b,:a)")
            .bind(":a", "x")
            .bind(":b", 2);
        let pos = stmt.to_positional().unwrap();
        assert_eq!(pos.sql, "INSERT INTO t (a, b, c) VALUES ($1,$2,$1)");
        assert_eq!(pos.params, vec![&Value::Text("x".into()), &Value::Int(2)]);
        assert_eq!(pos.params_ref().len(), 2);
    }

    #[test]
    fn positional_rewrite_without_placeholders() {
        let stmt = Statement::new("DROP TABLE users;");
        let pos = stmt.to_positional().unwrap();
        assert_eq!(pos.sql, "DROP TABLE users;");
        assert!(pos.params.is_empty());
    }

    #[test]
    fn unbound_placeholder_is_rejected() {
        let err = Statement::new("UPDATE t SET a = :value").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn unused_binding_is_rejected() {
        let err = Statement::new("DROP TABLE t;")
            .bind(":value", 1)
            .to_positional()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn invalid_placeholder_name_is_rejected() {
        let stmt = Statement::new("SELECT 1").bind(":bad name", 1);
        assert!(stmt.validate().is_err());
    }

    #[test]
    fn kind_detection() {
        assert_eq!(StatementKind::of("SELECT * FROM t;"), StatementKind::Select);
        assert_eq!(
            StatementKind::of("  -- note\n/* c */ (select 1)"),
            StatementKind::Select
        );
        assert_eq!(StatementKind::of("insert into t values (1)"), StatementKind::Insert);
        assert_eq!(StatementKind::of("UPDATE t SET a = 1"), StatementKind::Update);
        assert_eq!(StatementKind::of("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(StatementKind::of("ALTER TABLE t ADD x INT;"), StatementKind::Other);
        assert!(StatementKind::Select.returns_rows());
        assert!(!StatementKind::Other.returns_rows());
    }
}
