//! Column definitions and value maps.

use crate::error::{MigrationError, MigrationResult};
use crate::sanitize::Sanitizer;
use crate::value::Value;

/// A column definition: a name followed by clause fragments (type, constraints).
///
/// Rendered as the sanitized name and the fragments joined by single spaces:
///
/// ```ignore
/// let id = ColumnDef::new("id", "INT").clause("NOT NULL");
/// // id INT NOT NULL
/// ```
///
/// Fragments are SQL, not identifiers, so they cannot be escaped. They are checked for
/// statement separators and comment markers instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    clauses: Vec<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clauses: vec![sql_type.into()],
        }
    }

    /// Build from `[name, clause, clause, ...]`.
    pub fn from_parts<I, S>(parts: I) -> MigrationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = parts.into_iter().map(Into::into);
        let name = parts
            .next()
            .ok_or_else(|| MigrationError::validation("column definition is empty"))?;
        Ok(Self {
            name,
            clauses: parts.collect(),
        })
    }

    /// Append a clause fragment such as `NOT NULL` or `DEFAULT 0`.
    pub fn clause(mut self, fragment: impl Into<String>) -> Self {
        self.clauses.push(fragment.into());
        self
    }

    pub fn not_null(self) -> Self {
        self.clause("NOT NULL")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub(crate) fn render(&self, sanitizer: &impl Sanitizer) -> MigrationResult<String> {
        let mut out = sanitizer.identifier(&self.name)?;
        for clause in &self.clauses {
            check_fragment(clause)?;
            out.push(' ');
            out.push_str(clause.trim());
        }
        Ok(out)
    }
}

fn check_fragment(fragment: &str) -> MigrationResult<()> {
    if fragment.trim().is_empty() {
        return Err(MigrationError::validation("empty column clause"));
    }
    for marker in [";", "--", "/*", "*/", "\0"] {
        if fragment.contains(marker) {
            return Err(MigrationError::validation(format!(
                "column clause '{}' contains forbidden sequence '{}'",
                fragment.escape_debug(),
                marker.escape_debug()
            )));
        }
    }
    Ok(())
}

/// Column name to value mapping for INSERT, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, Value)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value; setting the same column again replaces the value in place.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Values
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}
