use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::types::{DataType, Value},
};

/// One named, typed output column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataColumn {
    pub name: String,
    pub data_type: DataType,
}

impl DataColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column descriptor; column positions define value binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSchema {
    pub columns: Vec<DataColumn>,
}

impl DataSchema {
    pub fn new(columns: Vec<DataColumn>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the position of the named column
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like `index_of`, but a missing column is an error
    pub fn must_index_of(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or(Error::NotFound(format!("column {} does not exist", name)))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// One row of typed values, positionally bound to a DataSchema
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub values: Vec<Value>,
}

impl DataRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// A batch of result rows sharing one schema. Rows are only appended.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChunk {
    schema: DataSchema,
    rows: Vec<DataRow>,
}

impl DataChunk {
    pub fn new(schema: DataSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(schema: DataSchema, rows: Vec<DataRow>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &DataSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DataRow> {
        self.rows
    }

    pub fn append_row(&mut self, row: DataRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.column_names()
    }
}
