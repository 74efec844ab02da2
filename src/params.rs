//! Client-side `:name` parameter substitution (spec §4.5). This crate does
//! not parse SQL; it rewrites the query text before sending a `COM_QUERY`.

use std::collections::HashMap;

use crate::error::{Error, ErrorKind};
use crate::value::BindValue;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("''"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Spec §4.5's rendering rule: null -> `NULL`; numeric -> decimal (bare);
/// boolean -> `TRUE`/`FALSE` (bare); everything else -> a quoted,
/// escaped string literal.
fn format_value(value: &BindValue) -> String {
    match value {
        BindValue::Null => "NULL".to_owned(),
        BindValue::Number(s) => s.clone(),
        BindValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_owned(),
        BindValue::Text(s) => quote(s),
    }
}

/// Substitute every active `:name` occurrence in `query` with its bound
/// value from `params`. An occurrence inside a single- or double-quoted
/// string literal is left untouched (it is "not active"), determined by
/// counting quote characters seen so far per spec §4.5.
pub(crate) fn substitute(query: &str, params: &HashMap<String, BindValue>) -> Result<String, Error> {
    let chars: Vec<char> = query.chars().collect();
    let mut out = String::with_capacity(query.len());

    let mut single_quotes = 0usize;
    let mut double_quotes = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '\'' => {
                single_quotes += 1;
                out.push(c);
                i += 1;
            }
            '"' => {
                double_quotes += 1;
                out.push(c);
                i += 1;
            }
            ':' if single_quotes % 2 == 0 && double_quotes % 2 == 0 => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }

                if end == start {
                    // Bare colon, not a placeholder (e.g. inside `::cast` or a literal).
                    out.push(c);
                    i += 1;
                    continue;
                }

                let name: String = chars[start..end].iter().collect();
                let value = params.get(&name).ok_or_else(|| {
                    Error::client(
                        ErrorKind::InvalidArgument,
                        format!("no value bound for parameter :{name}"),
                    )
                })?;

                out.push_str(&format_value(value));
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, BindValue)]) -> HashMap<String, BindValue> {
        pairs.iter().cloned().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn substitutes_simple_placeholder() {
        let p = params(&[("id", BindValue::Text("42".into()))]);
        let out = substitute("SELECT * FROM t WHERE id = :id", &p).unwrap();
        assert_eq!(out, "SELECT * FROM t WHERE id = '42'");
    }

    #[test]
    fn null_renders_unquoted() {
        let p = params(&[("x", BindValue::Null)]);
        let out = substitute("UPDATE t SET x = :x", &p).unwrap();
        assert_eq!(out, "UPDATE t SET x = NULL");
    }

    #[test]
    fn numeric_and_boolean_render_unquoted() {
        use crate::value::ToSqlText;
        let p = params(&[
            ("n", 42i64.to_sql_text()),
            ("flag", true.to_sql_text()),
        ]);
        let out = substitute("SELECT :n, :flag", &p).unwrap();
        assert_eq!(out, "SELECT 42, TRUE");
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        let p = params(&[("s", BindValue::Text("O'Brien\\".into()))]);
        let out = substitute("SELECT :s", &p).unwrap();
        assert_eq!(out, "SELECT 'O''Brien\\\\'");
    }

    #[test]
    fn ignores_placeholder_like_text_inside_string_literal() {
        let p = params(&[("id", BindValue::Text("1".into()))]);
        let out = substitute("SELECT ':id' , :id", &p).unwrap();
        assert_eq!(out, "SELECT ':id' , '1'");
    }

    #[test]
    fn unknown_parameter_is_invalid_argument() {
        let p = params(&[]);
        let err = substitute("SELECT :missing", &p).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
    }
}
