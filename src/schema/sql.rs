//! Pure SQL text builders used once, at schema-binding time.
//!
//! Every template uses the portable placeholder [`PLACEHOLDER`]; dialect translation
//! happens right before dispatch (see [`crate::translation::to_vendor_dialect`]).

/// Portable token meaning "one positional parameter".
pub const PLACEHOLDER: char = '?';

/// `n` placeholders joined by commas: `placeholder_list(3) == "?,?,?"`.
#[must_use]
pub fn placeholder_list(n: usize) -> String {
    vec![PLACEHOLDER.to_string(); n].join(",")
}

/// Quote an identifier with backticks, doubling any embedded backtick.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn quoted_list(columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| quote_ident(c)).collect()
}

/// `select `K`,`F1`,...,`Fn` from `T``
#[must_use]
pub fn select_template(table: &str, primary_key: &str, fields: &[String]) -> String {
    let mut columns = vec![quote_ident(primary_key)];
    columns.extend(quoted_list(fields));
    format!("select {} from {}", columns.join(","), quote_ident(table))
}

/// `insert into `T` (`F1`,...,`Fn`,`K`) values (?,...,?)` with `n + 1` placeholders.
#[must_use]
pub fn insert_template(table: &str, primary_key: &str, fields: &[String]) -> String {
    let mut columns = quoted_list(fields);
    columns.push(quote_ident(primary_key));
    format!(
        "insert into {} ({}) values ({})",
        quote_ident(table),
        columns.join(","),
        placeholder_list(fields.len() + 1)
    )
}

/// `update `T` set `F1`=?,...,`Fn`=? where `K`=?`
#[must_use]
pub fn update_template(table: &str, primary_key: &str, fields: &[String]) -> String {
    let assignments: Vec<String> = fields
        .iter()
        .map(|f| format!("{}={PLACEHOLDER}", quote_ident(f)))
        .collect();
    format!(
        "update {} set {} where {}={PLACEHOLDER}",
        quote_ident(table),
        assignments.join(","),
        quote_ident(primary_key)
    )
}

/// `delete from `T` where `K`=?`
#[must_use]
pub fn delete_template(table: &str, primary_key: &str) -> String {
    format!(
        "delete from {} where {}={PLACEHOLDER}",
        quote_ident(table),
        quote_ident(primary_key)
    )
}
