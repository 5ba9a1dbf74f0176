//! Shared SQL text building for the update plan compilers.
//!
//! Every compiler writes through [`SqlBuilder`], which appends a `?` placeholder
//! and its bound value in the same call. Placeholder order and parameter order
//! therefore cannot drift apart, no matter how often a value is repeated.

use crate::instruction::{KeyValue, SqlValue};

/// Quotes an identifier with backticks, doubling any embedded backtick.
#[inline]
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Formats a table name, handling `schema.table` format.
pub fn format_table_name(table_name: &str) -> String {
    match table_name.split_once('.') {
        Some((schema, table)) if !table.contains('.') => {
            let schema = schema.trim_matches('`');
            let table = table.trim_matches('`');
            format!("{}.{}", quote_identifier(schema), quote_identifier(table))
        }
        _ => quote_identifier(table_name.trim_matches('`')),
    }
}

/// A parameterized statement ready to be prepared and executed.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlCommand {
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        SqlBuilder::default()
    }

    pub fn with_capacity(sql: usize, params: usize) -> Self {
        SqlBuilder { sql: String::with_capacity(sql), params: Vec::with_capacity(params) }
    }

    pub fn push_str(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&quote_identifier(name));
        self
    }

    pub fn push_param(&mut self, value: &SqlValue) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.clone());
        self
    }

    /// Writes `` `col` = ? `` for each pair, joined by `separator`.
    pub fn push_assignments(&mut self, pairs: &[KeyValue], separator: &str) -> &mut Self {
        self.push_separated(pairs, separator, |builder, kv| {
            builder.push_identifier(&kv.column).push_str(" = ").push_param(&kv.value);
        })
    }

    /// Writes each item with `write`, putting `separator` between items.
    pub fn push_separated<T, F>(&mut self, items: &[T], separator: &str, mut write: F) -> &mut Self
    where
        F: FnMut(&mut Self, &T),
    {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            write(self, item);
        }
        self
    }

    pub fn finish(self) -> SqlCommand {
        SqlCommand { sql: self.sql, params: self.params }
    }
}

/// Shortens a statement for log lines and error messages.
pub fn statement_preview(sql: &str) -> String {
    const MAX_PREVIEW_CHARS: usize = 160;

    let char_count = sql.chars().count();
    if char_count <= MAX_PREVIEW_CHARS {
        return sql.to_string();
    }

    let head: String = sql.chars().take(MAX_PREVIEW_CHARS).collect();
    format!("{}... ({} chars)", head, char_count)
}
