//! Container (table) models

use std::fmt;
use std::str::FromStr;

use crate::error::ConnectorError;

/// Logical column type requested by the host
///
/// Storage is untyped: every logical type maps to the same `varchar`
/// column, and every warehouse type reads back as [`DataType::Text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataType {
    #[default]
    Text,
    Integer,
    Number,
    Boolean,
    DateTime,
    Guid,
    Json,
}

impl DataType {
    /// Warehouse column type for this logical type
    pub fn column_type(&self) -> &'static str {
        "varchar"
    }

    /// Logical type for a raw warehouse type
    pub fn from_raw(_raw: &str) -> Self {
        Self::Text
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Guid => "guid",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "number" | "decimal" | "float" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "datetime" | "timestamp" => Ok(Self::DateTime),
            "guid" | "uuid" => Ok(Self::Guid),
            "json" => Ok(Self::Json),
            other => Err(ConnectorError::invalid_model(format!(
                "unknown data type '{}'",
                other
            ))),
        }
    }
}

/// A column in a container model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
}

/// Table to create: name plus ordered columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerModel {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl ContainerModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column
    pub fn with_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            data_type,
        });
        self
    }
}

/// An existing container as reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
}

/// An existing column as reported by the warehouse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDataType {
    pub name: String,
    pub raw_data_type: String,
    pub data_type: DataType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_is_varchar() {
        for data_type in [
            DataType::Text,
            DataType::Integer,
            DataType::Number,
            DataType::Boolean,
            DataType::DateTime,
            DataType::Guid,
            DataType::Json,
        ] {
            assert_eq!(data_type.column_type(), "varchar");
        }
    }

    #[test]
    fn test_raw_types_read_back_as_text() {
        assert_eq!(DataType::from_raw("NUMBER"), DataType::Text);
        assert_eq!(DataType::from_raw("TEXT"), DataType::Text);
    }

    #[test]
    fn test_parse_data_type() {
        assert_eq!("Integer".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!(" timestamp ".parse::<DataType>().unwrap(), DataType::DateTime);
        assert!("blob".parse::<DataType>().is_err());
    }

    #[test]
    fn test_model_builder_keeps_order() {
        let model = ContainerModel::new("Orders")
            .with_column("Id", DataType::Integer)
            .with_column("Name", DataType::Text);
        let names: Vec<_> = model.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Name"]);
    }
}
