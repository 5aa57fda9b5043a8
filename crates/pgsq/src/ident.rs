//! Safe SQL identifier quoting.
//!
//! Every identifier the renderer emits goes through [`write_ident`]:
//!
//! - dotted names (`user.name`) are split and each part is quoted separately
//! - each part must be non-empty and must not contain NUL
//! - the dialect quote character inside a part is escaped by doubling it

use crate::error::{OrmError, OrmResult};

/// Validate a single identifier part.
fn check_part(part: &str, full: &str) -> OrmResult<()> {
    if part.is_empty() {
        return Err(OrmError::validation(format!(
            "Identifier cannot be empty (in {full:?})"
        )));
    }
    if part.contains('\0') {
        return Err(OrmError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}

/// Quote one identifier part (no dot splitting).
///
/// Used for aliases such as `"user.id"` where the dot is part of the name.
pub(crate) fn write_quoted(out: &mut String, part: &str, quote: char) -> OrmResult<()> {
    check_part(part, part)?;
    out.push(quote);
    for c in part.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    Ok(())
}

/// Quote a possibly dotted identifier, part by part.
pub(crate) fn write_ident(out: &mut String, ident: &str, quote: char) -> OrmResult<()> {
    for (i, part) in ident.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        check_part(part, ident)?;
        write_quoted(out, part, quote)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(ident: &str, quote: char) -> OrmResult<String> {
        let mut out = String::new();
        write_ident(&mut out, ident, quote)?;
        Ok(out)
    }

    #[test]
    fn quotes_simple_and_dotted_names() {
        assert_eq!(quoted("name", '"').unwrap(), r#""name""#);
        assert_eq!(quoted("user.name", '"').unwrap(), r#""user"."name""#);
        assert_eq!(quoted("user.name", '`').unwrap(), "`user`.`name`");
    }

    #[test]
    fn escapes_embedded_quote() {
        assert_eq!(quoted(r#"we"ird"#, '"').unwrap(), r#""we""ird""#);
    }

    #[test]
    fn rejects_empty_parts_and_nul() {
        assert!(quoted("", '"').is_err());
        assert!(quoted("user.", '"').is_err());
        assert!(quoted(".name", '"').is_err());
        assert!(quoted("na\0me", '"').is_err());
    }

    #[test]
    fn alias_keeps_dot_inside_quotes() {
        let mut out = String::new();
        write_quoted(&mut out, "user.id", '"').unwrap();
        assert_eq!(out, r#""user.id""#);
    }
}
