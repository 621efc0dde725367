//! information_schema: read-only tables describing the catalog itself.
//!
//! The tables are registered in the catalog like any other, but their rows
//! are never stored; scans synthesize them from the live catalog.

use crate::{
    error::Result,
    sql::{
        catalog::{ColumnConstraint, RootCatalog},
        types::{DataRow, DataType, Value},
    },
};

pub const INFORMATION_SCHEMA: &str = "information_schema";

/// Built-in tables of information_schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTable {
    /// schemas(id INT, name TEXT)
    Schemas,
    /// tables(id INT, name TEXT, schema_id INT, sequence_value INT)
    Tables,
}

impl SystemTable {
    pub fn lookup(schema: &str, table: &str) -> Option<SystemTable> {
        if schema != INFORMATION_SCHEMA {
            return None;
        }
        match table {
            "schemas" => Some(SystemTable::Schemas),
            "tables" => Some(SystemTable::Tables),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SystemTable::Schemas => "schemas",
            SystemTable::Tables => "tables",
        }
    }

    fn columns(&self) -> &'static [(&'static str, DataType)] {
        match self {
            SystemTable::Schemas => &[("id", DataType::Int), ("name", DataType::Text)],
            SystemTable::Tables => &[
                ("id", DataType::Int),
                ("name", DataType::Text),
                ("schema_id", DataType::Int),
                ("sequence_value", DataType::Int),
            ],
        }
    }

    /// Current contents, in the table's column order
    pub fn rows(&self, root: &RootCatalog) -> Vec<DataRow> {
        match self {
            SystemTable::Schemas => root
                .schemas()
                .map(|s| DataRow::new(vec![Value::Int(s.id.into()), Value::Text(s.name.clone())]))
                .collect(),
            SystemTable::Tables => root
                .schemas()
                .flat_map(|s| {
                    s.tables().map(move |t| {
                        DataRow::new(vec![
                            Value::Int(t.id.into()),
                            Value::Text(t.name.clone()),
                            Value::Int(s.id.into()),
                            Value::Int(t.sequence_value() as i64),
                        ])
                    })
                })
                .collect(),
        }
    }
}

/// Registers information_schema and its tables
pub fn seed(root: &mut RootCatalog) -> Result<()> {
    let schema = root.add_schema(INFORMATION_SCHEMA)?;
    for system in [SystemTable::Schemas, SystemTable::Tables] {
        let table = schema.add_table(system.name())?;
        for (name, data_type) in system.columns() {
            table.add_column(name, *data_type, ColumnConstraint::default())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SystemTable, INFORMATION_SCHEMA};
    use crate::{
        error::Result,
        sql::{
            catalog::Catalog,
            types::{DataRow, Value},
        },
    };

    #[test]
    fn test_lookup() {
        assert_eq!(
            SystemTable::lookup(INFORMATION_SCHEMA, "tables"),
            Some(SystemTable::Tables)
        );
        assert_eq!(SystemTable::lookup("public", "tables"), None);
        assert_eq!(SystemTable::lookup(INFORMATION_SCHEMA, "columns"), None);
    }

    #[test]
    fn test_seeded_columns() -> Result<()> {
        let catalog = Catalog::new()?;
        let root = catalog.lock()?;
        let tables = root
            .must_get_schema(INFORMATION_SCHEMA)?
            .must_get_table("tables")?;
        assert_eq!(
            tables.column_names(),
            ["id", "name", "schema_id", "sequence_value"]
        );
        Ok(())
    }

    #[test]
    fn test_rows() -> Result<()> {
        let catalog = Catalog::new()?;
        let mut root = catalog.lock()?;
        root.add_schema("app")?.add_table("users")?.next_sequence();

        assert_eq!(
            SystemTable::Schemas.rows(&root),
            vec![
                DataRow::new(vec![Value::Int(1), Value::Text(INFORMATION_SCHEMA.into())]),
                DataRow::new(vec![Value::Int(2), Value::Text("app".into())]),
            ]
        );
        let rows = SystemTable::Tables.rows(&root);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            DataRow::new(vec![
                Value::Int(1),
                Value::Text("users".into()),
                Value::Int(2),
                Value::Int(1),
            ])
        );
        Ok(())
    }
}
