use std::borrow::Cow;

mod scanner;

use scanner::scan_digits;

/// The reserved positional placeholder emitted by the serializer.
pub const PLACEHOLDER: char = '?';

/// Native parameter-marker syntax of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    /// The marker for the `n`th (1-based) parameter.
    #[must_use]
    pub fn marker(self, n: usize) -> String {
        match self {
            PlaceholderStyle::Postgres => format!("${n}"),
            PlaceholderStyle::Sqlite => format!("?{n}"),
        }
    }
}

/// Rewrite every reserved `?` placeholder into the driver's numbered marker, left to right.
///
/// A `?` already followed by digits is driver marker text and is copied unchanged without
/// consuming a parameter number.
///
/// Warning: the scan does not know about string literals or comments, so a `?` inside a quoted
/// literal is rewritten too. The serializer never emits such literals when binding values;
/// callers that splice raw SQL fragments must avoid the reserved character in them:
/// ```rust
/// use sql_exec_engine::prelude::*;
///
/// let sql = replace_binding_arguments("select 'a?' where x = ?", PlaceholderStyle::Postgres);
/// assert_eq!(sql, "select 'a$1' where x = $2");
/// ```
/// Returns a borrowed `Cow` when no placeholder was found.
#[must_use]
pub fn replace_binding_arguments(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut counter = 1;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        if b == PLACEHOLDER as u8 {
            if let Some((digits_end, _)) = scan_digits(bytes, idx + 1) {
                if let Some(ref mut buf) = out {
                    buf.push_str(&sql[idx..digits_end]);
                }
                idx = digits_end;
                continue;
            }
            let buf = out.get_or_insert_with(|| sql[..idx].to_string());
            buf.push_str(&target.marker(counter));
            counter += 1;
            idx += 1;
            continue;
        }

        // copy the whole UTF-8 sequence so multi-byte characters survive
        let width = utf8_width(b);
        if let Some(ref mut buf) = out {
            buf.push_str(&sql[idx..idx + width]);
        }
        idx += width;
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(sql),
    }
}

/// Count the reserved placeholders that `replace_binding_arguments` would rewrite.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut idx = 0;
    let mut count = 0;
    while idx < bytes.len() {
        if bytes[idx] == PLACEHOLDER as u8 {
            if let Some((digits_end, _)) = scan_digits(bytes, idx + 1) {
                idx = digits_end;
                continue;
            }
            count += 1;
        }
        idx += 1;
    }
    count
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_to_postgres_markers() {
        let sql = "select * from t where a = ? and b = ?";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "select * from t where a = $1 and b = $2");
    }

    #[test]
    fn translates_to_sqlite_markers() {
        let sql = "insert into t values(?, ?, ?)";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Sqlite);
        assert_eq!(res, "insert into t values(?1, ?2, ?3)");
    }

    #[test]
    fn borrows_when_nothing_to_replace() {
        let sql = "select 1";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Postgres);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }

    #[test]
    fn leaves_existing_markers_alone() {
        let sql = "select ?1, ?, $1, ?";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Sqlite);
        assert_eq!(res, "select ?1, ?1, $1, ?2");
        assert_eq!(count_placeholders(sql), 2);
    }

    #[test]
    fn rewrites_inside_literals() {
        // known limitation: no literal awareness
        let sql = "select '?' from t where a = ?";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "select '$1' from t where a = $2");
    }

    #[test]
    fn preserves_multibyte_text() {
        let sql = "select 'żółw', ? from t";
        let res = replace_binding_arguments(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "select 'żółw', $1 from t");
    }

    #[test]
    fn marker_count_matches_placeholder_count() {
        for k in 0..20 {
            let sql = vec!["?"; k].join(",");
            let res = replace_binding_arguments(&sql, PlaceholderStyle::Postgres);
            assert_eq!(res.matches('$').count(), k);
            let expected: Vec<String> = (1..=k).map(|n| format!("${n}")).collect();
            assert_eq!(res, expected.join(","));
        }
    }
}
