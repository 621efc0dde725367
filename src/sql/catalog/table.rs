use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        catalog::{ObjectId, ObjectMap},
        types::{DataColumn, DataSchema, DataType},
    },
};

/// Table definition: columns, indexes, primary key and row sequence
///
/// Columns and indexes draw their ids from one shared counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub id: ObjectId,
    pub name: String,
    next_id: ObjectId,
    columns: ObjectMap<Column>,
    indexes: ObjectMap<Index>,
    primary_keys: Vec<ObjectId>,
    sequence_value: u64,
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ObjectId,
    pub name: String,
    pub data_type: DataType,
    pub constraint: ColumnConstraint,
}

/// Constraints stored on a column. PRIMARY KEY lives on the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnConstraint {
    pub unique: bool,
    pub not_null: bool,
}

/// Index definition over a table's columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub id: ObjectId,
    pub name: String,
    pub column_ids: Vec<ObjectId>,
    pub unique: bool,
}

impl Table {
    pub(crate) fn new(id: ObjectId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            next_id: 0,
            columns: ObjectMap::default(),
            indexes: ObjectMap::default(),
            primary_keys: Vec::new(),
            sequence_value: 0,
        }
    }

    fn allocate_id(&mut self) -> ObjectId {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_column(
        &mut self,
        name: &str,
        data_type: DataType,
        constraint: ColumnConstraint,
    ) -> Result<&mut Column> {
        self.columns.ensure_vacant("column", name)?;
        let id = self.allocate_id();
        let column = Column {
            id,
            name: name.to_string(),
            data_type,
            constraint,
        };
        Ok(self.columns.insert(id, name, column))
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn get_column_by_id(&self, id: ObjectId) -> Option<&Column> {
        self.columns.get_by_id(id)
    }

    /// Removes a column, dropping it from the primary key if it was part of it
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let column = self.columns.remove("column", name)?;
        self.primary_keys.retain(|id| *id != column.id);
        Ok(column)
    }

    /// Columns in id (declaration) order
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().map(|c| c.name.clone()).collect()
    }

    /// Adds an index over the named columns, which must already exist
    pub fn add_index(&mut self, name: &str, column_names: &[String], unique: bool) -> Result<&mut Index> {
        self.indexes.ensure_vacant("index", name)?;
        let column_ids = self.resolve_columns(column_names)?;
        let id = self.allocate_id();
        debug!(table = %self.name, index = name, id, "adding index");
        let index = Index {
            id,
            name: name.to_string(),
            column_ids,
            unique,
        };
        Ok(self.indexes.insert(id, name, index))
    }

    pub fn get_index(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    pub fn remove_index(&mut self, name: &str) -> Result<Index> {
        self.indexes.remove("index", name)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.indexes.iter()
    }

    /// Replaces the primary key. Every name must be a column of this table.
    pub fn set_primary_keys(&mut self, column_names: &[String]) -> Result<()> {
        let ids = self.resolve_columns(column_names)?;
        let mut seen = Vec::with_capacity(ids.len());
        for (id, name) in ids.iter().zip(column_names) {
            if seen.contains(id) {
                return Err(Error::Duplicate(format!(
                    "column {} appears twice in the primary key of {}",
                    name, self.name
                )));
            }
            seen.push(*id);
        }
        self.primary_keys = ids;
        Ok(())
    }

    pub fn primary_keys(&self) -> &[ObjectId] {
        &self.primary_keys
    }

    /// Last row id handed out; 0 before the first insert
    pub fn sequence_value(&self) -> u64 {
        self.sequence_value
    }

    /// Bumps and returns the row sequence
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence_value += 1;
        self.sequence_value
    }

    /// Row layout: the table's columns, in id order
    pub fn data_schema(&self) -> DataSchema {
        DataSchema::new(
            self.columns()
                .map(|c| DataColumn::new(c.name.clone(), c.data_type))
                .collect(),
        )
    }

    fn resolve_columns(&self, column_names: &[String]) -> Result<Vec<ObjectId>> {
        column_names
            .iter()
            .map(|name| {
                self.get_column(name).map(|c| c.id).ok_or_else(|| {
                    Error::NotFound(format!("column {} does not exist in table {}", name, self.name))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnConstraint, Table};
    use crate::{
        error::{Error, Result},
        sql::types::{DataColumn, DataSchema, DataType},
    };

    fn users() -> Result<Table> {
        let mut table = Table::new(1, "users");
        table.add_column("id", DataType::Int, ColumnConstraint::default())?;
        table.add_column(
            "name",
            DataType::Text,
            ColumnConstraint {
                unique: false,
                not_null: true,
            },
        )?;
        Ok(table)
    }

    #[test]
    fn test_columns_and_indexes_share_ids() -> Result<()> {
        let mut table = users()?;
        let index = table.add_index("by_name", &["name".to_string()], true)?;
        assert_eq!(index.id, 3);
        assert_eq!(index.column_ids, vec![2]);
        let column = table.add_column("age", DataType::Int, ColumnConstraint::default())?;
        assert_eq!(column.id, 4);

        assert!(matches!(
            table.add_column("id", DataType::Bool, ColumnConstraint::default()),
            Err(Error::Duplicate(_))
        ));
        assert!(matches!(
            table.add_index("by_name", &["id".to_string()], false),
            Err(Error::Duplicate(_))
        ));
        assert!(matches!(
            table.add_index("bad", &["nope".to_string()], false),
            Err(Error::NotFound(_))
        ));
        assert_eq!(table.indexes().count(), 1);
        table.remove_index("by_name")?;
        assert!(table.get_index("by_name").is_none());
        Ok(())
    }

    #[test]
    fn test_primary_keys() -> Result<()> {
        let mut table = users()?;
        table.set_primary_keys(&["name".to_string(), "id".to_string()])?;
        assert_eq!(table.primary_keys(), &[2, 1]);

        assert!(table.set_primary_keys(&["ghost".to_string()]).is_err());
        assert!(table.set_primary_keys(&["id".to_string(), "id".to_string()]).is_err());
        assert_eq!(table.primary_keys(), &[2, 1]);

        table.remove_column("name")?;
        assert_eq!(table.primary_keys(), &[1]);
        assert!(table.remove_column("name").is_err());
        Ok(())
    }

    #[test]
    fn test_data_schema_and_sequence() -> Result<()> {
        let mut table = users()?;
        assert_eq!(
            table.data_schema(),
            DataSchema::new(vec![
                DataColumn::new("id", DataType::Int),
                DataColumn::new("name", DataType::Text),
            ])
        );
        assert_eq!(table.sequence_value(), 0);
        assert_eq!(table.next_sequence(), 1);
        assert_eq!(table.next_sequence(), 2);
        assert_eq!(table.get_column_by_id(2).map(|c| c.name.as_str()), Some("name"));
        Ok(())
    }
}
