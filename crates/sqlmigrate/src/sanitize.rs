//! Identifier and literal sanitization.
//!
//! Every statement template goes through a [`Sanitizer`] for each piece of user text it
//! interpolates: [`Sanitizer::identifier`] for names in identifier position and
//! [`Sanitizer::literal`] for text placed inside a single-quoted string. Values are never
//! interpolated; they are bound as placeholders.

use crate::error::{MigrationError, MigrationResult};
use crate::ident::Ident;

/// Escaping policy injected into [`Migration`](crate::Migration).
pub trait Sanitizer: Send + Sync {
    /// Validate/escape text used as a table, column or database name.
    ///
    /// The returned text must itself parse as an [`Ident`].
    fn identifier(&self, input: &str) -> MigrationResult<String>;

    /// Escape text placed between single quotes in a SQL string literal.
    ///
    /// The returned value excludes the surrounding quotes.
    fn literal(&self, input: &str) -> MigrationResult<String>;
}

impl<T: Sanitizer> Sanitizer for &T {
    fn identifier(&self, input: &str) -> MigrationResult<String> {
        (**self).identifier(input)
    }

    fn literal(&self, input: &str) -> MigrationResult<String> {
        (**self).literal(input)
    }
}

/// Sanitizer that only accepts well-formed SQL identifiers.
///
/// Input is parsed with [`Ident::parse`], so `users`, `app.users` and `"Order Items"` pass
/// while anything containing whitespace, separators or comment markers outside quotes is
/// rejected. With [`always_quote`](Self::always_quote) every segment is emitted quoted.
#[derive(Debug, Clone, Default)]
pub struct StrictSanitizer {
    always_quote: bool,
}

impl StrictSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote every identifier segment on output (`users` becomes `"users"`).
    pub fn always_quote(mut self, enabled: bool) -> Self {
        self.always_quote = enabled;
        self
    }
}

impl Sanitizer for StrictSanitizer {
    fn identifier(&self, input: &str) -> MigrationResult<String> {
        let ident = Ident::parse(input.trim())?;
        Ok(if self.always_quote {
            ident.to_quoted_sql()
        } else {
            ident.to_sql()
        })
    }

    fn literal(&self, input: &str) -> MigrationResult<String> {
        escape_literal(input)
    }
}

/// Escape a string literal body by doubling single quotes.
///
/// Backslashes are rejected rather than escaped: their meaning inside a literal depends on
/// server settings (`standard_conforming_strings`, `NO_BACKSLASH_ESCAPES`).
pub fn escape_literal(input: &str) -> MigrationResult<String> {
    if input.contains('\0') {
        return Err(MigrationError::validation(
            "string literal cannot contain NUL character",
        ));
    }
    if input.contains('\\') {
        return Err(MigrationError::validation(format!(
            "string literal cannot contain backslash: '{input}'"
        )));
    }
    Ok(input.replace('\'', "''"))
}
