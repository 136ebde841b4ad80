use std::borrow::Cow;

mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_escaped_quote,
    is_line_comment_start, matches_tag, try_start_dollar_quote,
};

use crate::schema::sql::PLACEHOLDER;

/// Positional-parameter convention of the driver a statement is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`; identifiers are double-quoted.
    Postgres,
    /// SQLite-style placeholders like `?1`; backtick identifiers are accepted as-is.
    Sqlite,
}

/// Rewrite portable `?` placeholders into the driver's numbered markers.
///
/// Placeholders are numbered left to right starting at 1. Question marks inside string
/// literals, quoted identifiers and comments are left alone. For [`PlaceholderStyle::Postgres`]
/// backtick-quoted identifiers are also rewritten to double quotes.
///
/// ```rust
/// use sql_model::translation::{PlaceholderStyle, to_vendor_dialect};
///
/// let sql = "update `users` set `name`=? where `id`=?";
/// assert_eq!(
///     to_vendor_dialect(sql, PlaceholderStyle::Sqlite),
///     "update `users` set `name`=?1 where `id`=?2"
/// );
/// assert_eq!(
///     to_vendor_dialect(sql, PlaceholderStyle::Postgres),
///     r#"update "users" set "name"=$1 where "id"=$2"#
/// );
/// ```
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn to_vendor_dialect(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut ordinal = 0_usize;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();
    let rewrite_quotes = matches!(target, PlaceholderStyle::Postgres);

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'`' => {
                    state = State::Backticked;
                    if rewrite_quotes {
                        splice(sql, &mut out, &mut copied, idx, 1, "\"");
                    }
                }
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                _ if b == PLACEHOLDER as u8 => {
                    ordinal += 1;
                    let marker = match target {
                        PlaceholderStyle::Postgres => format!("${ordinal}"),
                        PlaceholderStyle::Sqlite => format!("?{ordinal}"),
                    };
                    splice(sql, &mut out, &mut copied, idx, 1, &marker);
                }
                _ => {}
            },
            State::SingleQuoted => {
                if is_escaped_quote(bytes, idx, b'\'') {
                    idx += 1;
                } else if b == b'\'' {
                    state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                if is_escaped_quote(bytes, idx, b'"') {
                    idx += 1;
                } else if b == b'"' {
                    state = State::Normal;
                }
            }
            State::Backticked => {
                if is_escaped_quote(bytes, idx, b'`') {
                    if rewrite_quotes {
                        splice(sql, &mut out, &mut copied, idx, 2, "`");
                    }
                    idx += 1;
                } else if b == b'`' {
                    state = State::Normal;
                    if rewrite_quotes {
                        splice(sql, &mut out, &mut copied, idx, 1, "\"");
                    }
                } else if b == b'"' && rewrite_quotes {
                    splice(sql, &mut out, &mut copied, idx, 1, "\"\"");
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

/// Replace `sql[idx..idx + consumed]` with `replacement` in the lazily created output.
fn splice(
    sql: &str,
    out: &mut Option<String>,
    copied: &mut usize,
    idx: usize,
    consumed: usize,
    replacement: &str,
) {
    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
    buf.push_str(&sql[*copied..idx]);
    buf.push_str(replacement);
    *copied = idx + consumed;
}
