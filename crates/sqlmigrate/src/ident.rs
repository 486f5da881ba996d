//! SQL identifier parsing and rendering.
//!
//! [`Ident`] is what [`StrictSanitizer`](crate::sanitize::StrictSanitizer) checks every
//! table, column and database name against before it reaches a statement template.
//!
//! - Bare segments must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted segments (`"..."`) may hold anything but NUL; `"` is escaped as `""`
//! - Segments are joined with `.` (`schema.table`)

use crate::error::{MigrationError, MigrationResult};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Bare(String),
    Quoted(String),
}

impl Segment {
    /// The name as the server stores it: bare names fold to lower case, quoted names don't.
    fn stored_name(&self) -> String {
        match self {
            Segment::Bare(s) => s.to_ascii_lowercase(),
            Segment::Quoted(s) => s.clone(),
        }
    }
}

/// A validated SQL identifier such as `users`, `app.users` or `"Order Items"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    segments: Vec<Segment>,
}

impl Ident {
    /// Parse an identifier, accepting bare, quoted and dotted forms.
    pub fn parse(input: &str) -> MigrationResult<Self> {
        if input.is_empty() {
            return Err(MigrationError::validation("identifier cannot be empty"));
        }
        if input.contains('\0') {
            return Err(MigrationError::validation(
                "identifier cannot contain NUL character",
            ));
        }

        let mut chars = input.chars().peekable();
        let mut segments = Vec::new();

        loop {
            let segment = if chars.peek() == Some(&'"') {
                chars.next();
                read_quoted(&mut chars, input)?
            } else {
                read_bare(&mut chars, input)?
            };
            segments.push(segment);

            match chars.next() {
                None => break,
                Some('.') if chars.peek().is_some() => continue,
                Some('.') => {
                    return Err(MigrationError::validation(format!(
                        "trailing '.' in identifier '{input}'"
                    )));
                }
                Some(c) => {
                    return Err(MigrationError::validation(format!(
                        "unexpected '{c}' in identifier '{input}'"
                    )));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Build a single quoted segment from arbitrary text.
    pub fn quoted(name: &str) -> MigrationResult<Self> {
        if name.is_empty() {
            return Err(MigrationError::validation("empty quoted identifier"));
        }
        if name.contains('\0') {
            return Err(MigrationError::validation(
                "identifier cannot contain NUL character",
            ));
        }
        Ok(Self {
            segments: vec![Segment::Quoted(name.to_string())],
        })
    }

    /// Stored name of the last segment (`users` for `app.Users`, `Users` for `app."Users"`).
    pub fn name(&self) -> String {
        self.segments
            .last()
            .map(Segment::stored_name)
            .unwrap_or_default()
    }

    /// Stored name of the segment before the last one, if any (`app` for `app.users`).
    pub fn schema(&self) -> Option<String> {
        let n = self.segments.len();
        (n >= 2).then(|| self.segments[n - 2].stored_name())
    }

    /// Render as SQL, keeping bare segments bare.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, false);
        out
    }

    /// Render as SQL with every segment quoted.
    pub fn to_quoted_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, true);
        out
    }

    fn write_sql(&self, out: &mut String, quote_all: bool) {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match segment {
                Segment::Bare(s) if !quote_all => out.push_str(s),
                Segment::Bare(s) | Segment::Quoted(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, input: &str) -> MigrationResult<Segment> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some('"') if chars.peek() == Some(&'"') => {
                chars.next();
                name.push('"');
            }
            Some('"') => break,
            Some(c) => name.push(c),
            None => {
                return Err(MigrationError::validation(format!(
                    "unclosed quoted identifier '{input}'"
                )));
            }
        }
    }
    if name.is_empty() {
        return Err(MigrationError::validation("empty quoted identifier"));
    }
    Ok(Segment::Quoted(name))
}

fn read_bare(chars: &mut Peekable<Chars<'_>>, input: &str) -> MigrationResult<Segment> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' || c == '"' {
            break;
        }
        let allowed = if name.is_empty() {
            c == '_' || c.is_ascii_alphabetic()
        } else {
            c == '_' || c == '$' || c.is_ascii_alphanumeric()
        };
        if !allowed {
            return Err(MigrationError::validation(format!(
                "invalid character '{c}' in identifier '{input}'"
            )));
        }
        name.push(c);
        chars.next();
    }
    if name.is_empty() {
        return Err(MigrationError::validation(format!(
            "empty segment in identifier '{input}'"
        )));
    }
    Ok(Segment::Bare(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_identifier_renders_verbatim() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.schema(), None);
        assert_eq!(ident.to_sql(), "users");
        assert_eq!(ident.to_quoted_sql(), r#""users""#);
    }

    #[test]
    fn dotted_identifier() {
        let ident = Ident::parse("app.users").unwrap();
        assert_eq!(ident.schema().as_deref(), Some("app"));
        assert_eq!(ident.name(), "users");
        assert_eq!(ident.to_sql(), "app.users");
    }

    #[test]
    fn quoted_identifier_keeps_escapes() {
        let ident = Ident::parse(r#""Order ""Items""""#).unwrap();
        assert_eq!(ident.name(), r#"Order "Items""#);
        assert_eq!(ident.to_sql(), r#""Order ""Items""""#);
    }

    #[test]
    fn stored_names_fold_bare_segments_only() {
        assert_eq!(Ident::parse("Users").unwrap().name(), "users");
        assert_eq!(Ident::parse(r#""Users""#).unwrap().name(), "Users");

        let ident = Ident::parse(r#"db.Sales."Orders""#).unwrap();
        assert_eq!(ident.schema().as_deref(), Some("sales"));
        assert_eq!(ident.name(), "Orders");
    }

    #[test]
    fn mixed_segments() {
        let ident = Ident::parse(r#"app."UserTable".id"#).unwrap();
        assert_eq!(ident.to_sql(), r#"app."UserTable".id"#);
        assert_eq!(ident.to_quoted_sql(), r#""app"."UserTable"."id""#);
    }

    #[test]
    fn dollar_allowed_after_first_char() {
        assert_eq!(Ident::parse("col$1").unwrap().to_sql(), "col$1");
        assert!(Ident::parse("$col").is_err());
    }

    #[test]
    fn quoted_constructor() {
        let ident = Ident::quoted("my table").unwrap();
        assert_eq!(ident.to_sql(), r#""my table""#);
        assert!(Ident::quoted("").is_err());
    }

    #[test]
    fn rejects_injection_attempts() {
        for bad in [
            "",
            "1users",
            "users; DROP TABLE x",
            "users--",
            "a..b",
            "a.",
            r#""unclosed"#,
            r#""a"b"#,
            "nul\0byte",
        ] {
            let err = Ident::parse(bad).unwrap_err();
            assert!(err.is_validation(), "expected validation error for {bad:?}");
        }
    }
}
