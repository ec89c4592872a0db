//! SQL generation
//!
//! Pure builders for every statement the connector sends. Identifiers are
//! sanitized and spliced inline (the query endpoint does not bind
//! identifiers); record values are always bound as numbered parameters.
//!
//! # Upsert shape
//!
//! ```text
//! MERGE INTO Orders AS target
//! USING (SELECT * FROM VALUES (:1, :2), (:3, :4)) AS source (Id, Name)
//!   ON (target.OriginEntityCode = source.OriginEntityCode)
//! WHEN MATCHED THEN
//!   UPDATE SET target.Id = source.Id, target.Name = source.Name
//! WHEN NOT MATCHED THEN
//!   INSERT (Id, Name)
//!   VALUES (source.Id, source.Name);
//! ```

use std::fmt::Write as _;

use crate::error::ConnectorError;
use crate::model::ContainerModel;
use crate::sanitize::sanitize;
use crate::value::{Record, Value};

/// Business key column the upsert matches on
pub const ORIGIN_ENTITY_CODE: &str = "OriginEntityCode";

/// A bound parameter
///
/// `position` is the 1-based bind index referenced as `:position` in the
/// statement text. Upsert parameters also record the column and row they
/// were generated for.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub position: usize,
    pub column: String,
    pub row: usize,
    pub value: Value,
}

impl Parameter {
    /// Placeholder text for this parameter
    pub fn placeholder(&self) -> String {
        format!(":{}", self.position)
    }
}

/// Statement text plus its bound parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: Vec<Parameter>,
}

impl Statement {
    /// Statement without parameters
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter at the next position and return its placeholder
    fn bind(&mut self, column: &str, row: usize, value: Value) -> String {
        let param = Parameter {
            position: self.params.len() + 1,
            column: column.to_string(),
            row,
            value,
        };
        let placeholder = param.placeholder();
        self.params.push(param);
        placeholder
    }
}

/// `CREATE TABLE IF NOT EXISTS` for a container model.
///
/// Every column is created as a nullable `varchar`. A model without columns
/// produces DDL the warehouse will reject; callers validate that first.
pub fn build_create_table_sql(model: &ContainerModel) -> Statement {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", sanitize(&model.name));

    let count = model.columns.len();
    for (index, column) in model.columns.iter().enumerate() {
        let separator = if index + 1 < count { "," } else { "" };
        let _ = writeln!(
            sql,
            "{} {} NULL{}",
            sanitize(&column.name),
            column.data_type.column_type(),
            separator
        );
    }

    sql.push_str(");");
    Statement::new(sql)
}

/// `MERGE` upsert of a batch of rows into `container`.
///
/// Columns come from the first row. Each (column, row) pair is bound as its
/// own parameter; a row lacking one of the columns binds NULL, and columns
/// only present in later rows are ignored.
///
/// # Errors
///
/// Returns [`ConnectorError::EmptyBatch`] for an empty slice and
/// [`ConnectorError::InvalidModel`] if the first row has no columns.
pub fn build_upsert_sql(container: &str, rows: &[Record]) -> Result<Statement, ConnectorError> {
    let first = rows.first().ok_or(ConnectorError::EmptyBatch)?;
    if first.is_empty() {
        return Err(ConnectorError::invalid_model("record has no columns"));
    }

    let raw_columns: Vec<&str> = first.columns().collect();
    let columns: Vec<String> = raw_columns.iter().map(|c| sanitize(c)).collect();

    let mut statement = Statement::default();
    statement.params.reserve(rows.len() * columns.len());

    let mut groups = Vec::with_capacity(rows.len());
    for (row_index, row) in rows.iter().enumerate() {
        let placeholders: Vec<String> = raw_columns
            .iter()
            .zip(&columns)
            .map(|(raw, column)| {
                let value = row.get(raw).cloned().unwrap_or(Value::Null);
                statement.bind(column, row_index, value)
            })
            .collect();
        groups.push(format!("({})", placeholders.join(", ")));
    }

    let field_list = columns.join(", ");
    let update_list = columns
        .iter()
        .map(|c| format!("target.{c} = source.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let insert_list = columns
        .iter()
        .map(|c| format!("source.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = String::new();
    let _ = writeln!(sql, "MERGE INTO {} AS target", sanitize(container));
    let _ = writeln!(
        sql,
        "USING (SELECT * FROM VALUES {}) AS source ({})",
        groups.join(", "),
        field_list
    );
    let _ = writeln!(
        sql,
        "  ON (target.{key} = source.{key})",
        key = ORIGIN_ENTITY_CODE
    );
    sql.push_str("WHEN MATCHED THEN\n");
    let _ = writeln!(sql, "  UPDATE SET {}", update_list);
    sql.push_str("WHEN NOT MATCHED THEN\n");
    let _ = writeln!(sql, "  INSERT ({})", field_list);
    let _ = write!(sql, "  VALUES ({});", insert_list);

    statement.text = sql;
    Ok(statement)
}

/// `ALTER TABLE ... RENAME TO`
pub fn build_rename_sql(old_name: &str, new_name: &str) -> Statement {
    Statement::new(format!(
        "ALTER TABLE IF EXISTS {} RENAME TO {}",
        sanitize(old_name),
        sanitize(new_name)
    ))
}

/// `DROP TABLE`
pub fn build_drop_sql(name: &str) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {}", sanitize(name)))
}

/// `TRUNCATE TABLE`
pub fn build_truncate_sql(name: &str) -> Statement {
    Statement::new(format!("TRUNCATE TABLE IF EXISTS {}", sanitize(name)))
}

/// Base tables in the session's current schema
pub fn build_list_tables_sql() -> Statement {
    Statement::new(
        "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_SCHEMA = CURRENT_SCHEMA() AND TABLE_TYPE = 'BASE TABLE' \
         ORDER BY TABLE_NAME",
    )
}

/// Columns of one table in the session's current schema.
///
/// The table name is bound, not spliced.
pub fn build_list_columns_sql(table: &str) -> Statement {
    let mut statement = Statement::default();
    let placeholder = statement.bind("TABLE_NAME", 0, Value::String(table.to_string()));
    statement.text = format!(
        "SELECT COLUMN_NAME, DATA_TYPE FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = CURRENT_SCHEMA() AND TABLE_NAME = UPPER({}) \
         ORDER BY ORDINAL_POSITION",
        placeholder
    );
    statement
}

#[cfg(test)]
#[path = "sql_test.rs"]
mod sql_test;
