use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::catalog::{ObjectId, ObjectMap, Table},
};

/// A namespace of tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub id: ObjectId,
    pub name: String,
    next_id: ObjectId,
    tables: ObjectMap<Table>,
}

impl Schema {
    pub(crate) fn new(id: ObjectId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            next_id: 0,
            tables: ObjectMap::default(),
        }
    }

    pub fn add_table(&mut self, name: &str) -> Result<&mut Table> {
        self.create_table(name, |_| Ok(()))
    }

    /// Builds a table with `init` and adds it only if `init` succeeds, so a
    /// failed definition leaves no trace (not even a used id).
    pub fn create_table<F>(&mut self, name: &str, init: F) -> Result<&mut Table>
    where
        F: FnOnce(&mut Table) -> Result<()>,
    {
        self.tables.ensure_vacant("table", name)?;
        let id = self.next_id + 1;
        let mut table = Table::new(id, name);
        init(&mut table)?;
        self.next_id = id;
        debug!(schema = %self.name, table = name, id, "adding table");
        Ok(self.tables.insert(id, name, table))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains(name)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn get_table_by_id(&self, id: ObjectId) -> Option<&Table> {
        self.tables.get_by_id(id)
    }

    pub fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| self.table_not_found(name))
    }

    pub fn must_get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        let err = self.table_not_found(name);
        self.get_table_mut(name).ok_or(err)
    }

    pub fn remove_table(&mut self, name: &str) -> Result<Table> {
        let table = self
            .tables
            .remove("table", name)
            .map_err(|_| self.table_not_found(name))?;
        debug!(schema = %self.name, table = name, id = table.id, "removed table");
        Ok(table)
    }

    /// Tables in id order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn table_not_found(&self, name: &str) -> Error {
        Error::NotFound(format!("table {}.{} does not exist", self.name, name))
    }
}

#[cfg(test)]
mod tests {
    use super::Schema;
    use crate::{
        error::{Error, Result},
        sql::{catalog::ColumnConstraint, types::DataType},
    };

    #[test]
    fn test_table_ids() -> Result<()> {
        let mut schema = Schema::new(1, "s");
        assert_eq!(schema.add_table("a")?.id, 1);
        assert_eq!(schema.add_table("b")?.id, 2);
        assert_eq!(schema.add_table("c")?.id, 3);
        assert_eq!(schema.table_count(), 3);
        Ok(())
    }

    #[test]
    fn test_table_lookup_and_removal() -> Result<()> {
        let mut schema = Schema::new(1, "s");
        schema.add_table("t")?;
        assert!(matches!(schema.add_table("t"), Err(Error::Duplicate(_))));
        assert!(schema.has_table("t"));
        assert_eq!(schema.get_table_by_id(1).map(|t| t.name.as_str()), Some("t"));

        assert!(matches!(
            schema.remove_table("missing"),
            Err(Error::NotFound(msg)) if msg == "table s.missing does not exist"
        ));
        assert_eq!(schema.table_count(), 1);

        schema.remove_table("t")?;
        assert!(schema.get_table("t").is_none());
        assert!(schema.must_get_table("t").is_err());
        Ok(())
    }

    #[test]
    fn test_create_table_is_atomic() -> Result<()> {
        let mut schema = Schema::new(1, "s");
        let result = schema.create_table("t", |table| {
            table.add_column("a", DataType::Int, ColumnConstraint::default())?;
            table.set_primary_keys(&["b".to_string()])
        });
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!schema.has_table("t"));

        let table = schema.create_table("t", |table| {
            table.add_column("a", DataType::Int, ColumnConstraint::default())?;
            Ok(())
        })?;
        assert_eq!(table.id, 1);
        assert_eq!(table.column_names(), ["a"]);
        Ok(())
    }
}
