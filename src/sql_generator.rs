use std::collections::HashMap;
use std::path::Path;

use crate::error::LoadError;
use crate::normalize::{check_identifier, normalize_identifier, normalize_value};
use crate::utils::file_stem_of;

/// generates a `create table` statement with one text column per header.
pub fn build_create<S: AsRef<str>>(table: &str, headers: &[S]) -> String {
    create_sql(table, &normalize_all(headers))
}

/// generates an `insert` for one row. column `i` pairs with value `i`; the caller
/// guarantees both slices have the same length.
pub fn build_insert<H: AsRef<str>, V: AsRef<str>>(table: &str, headers: &[H], values: &[V]) -> String {
    insert_sql(table, &normalize_all(headers), values)
}

fn normalize_all<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    headers
        .iter()
        .map(|header| normalize_identifier(header.as_ref()))
        .collect()
}

// both take identifiers that are already normalized
fn create_sql(table: &str, columns: &[String]) -> String {
    let lines: Vec<String> = columns
        .iter()
        .map(|column| format!("  {column} TEXT"))
        .collect();

    format!("CREATE TABLE {} (\n{}\n);", table, lines.join(",\n"))
}

fn insert_sql<V: AsRef<str>>(table: &str, columns: &[String], values: &[V]) -> String {
    let literals: Vec<String> = values
        .iter()
        .map(|value| normalize_value(value.as_ref()))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        columns.join(","),
        literals.join(",")
    )
}

pub fn build_drop(table: &str) -> String {
    format!("DROP TABLE {};", table)
}

/// the force-mode variant of [`build_drop`]; a missing table is not an error.
pub fn build_drop_if_exists(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", table)
}

/// the validated shape of the table a load will create.
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    /// normalized table name, derived from the input file name.
    pub table: String,
    /// header row as read from the input.
    pub headers: Vec<String>,
    /// normalized column identifiers, in header order.
    pub columns: Vec<String>,
}

impl TablePlan {
    /// derives the table name from `input` and checks that every identifier can be
    /// spliced into a statement unquoted, and that no two headers collide.
    pub fn new(input: &Path, headers: &[String]) -> Result<Self, LoadError> {
        let stem = file_stem_of(input).ok_or_else(|| {
            LoadError::MalformedInput(format!("cannot derive a table name from {}", input.display()))
        })?;
        let table = normalize_identifier(&stem);
        check_identifier(&table)
            .map_err(|reason| LoadError::MalformedInput(format!("table name: {reason}")))?;

        if headers.is_empty() {
            return Err(LoadError::MalformedInput("header row has no columns".to_string()));
        }

        let mut columns = Vec::with_capacity(headers.len());
        // the server folds only ascii letters of unquoted identifiers, so compare folded the same way
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let column = normalize_identifier(header);
            check_identifier(&column).map_err(|reason| {
                LoadError::MalformedInput(format!("header {} ({header:?}): {reason}", index + 1))
            })?;
            if let Some(first) = seen.insert(column.to_ascii_lowercase(), index) {
                return Err(LoadError::MalformedInput(format!(
                    "headers {} ({:?}) and {} ({header:?}) both map to column `{column}`",
                    first + 1,
                    headers[first],
                    index + 1
                )));
            }
            columns.push(column);
        }

        Ok(Self {
            table,
            headers: headers.to_vec(),
            columns,
        })
    }

    pub fn create_statement(&self) -> String {
        create_sql(&self.table, &self.columns)
    }

    pub fn insert_statement<V: AsRef<str>>(&self, values: &[V]) -> String {
        insert_sql(&self.table, &self.columns, values)
    }

    pub fn drop_statement(&self) -> String {
        build_drop(&self.table)
    }
}
