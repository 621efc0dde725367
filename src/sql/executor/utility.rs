//! DDL execution. Every statement here holds the catalog lock from its
//! existence check to its last mutation.

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    sql::{
        catalog::{Catalog, ColumnConstraint, system::INFORMATION_SCHEMA},
        keys::KeyPrefix,
        plan::LogicalPlan,
    },
    storage::{Storage, engine::Engine},
};

pub(super) fn execute<E: Engine>(
    plan: LogicalPlan,
    catalog: &Catalog,
    storage: &Storage<E>,
) -> Result<()> {
    let mut root = catalog.lock()?;
    match plan {
        LogicalPlan::CreateSchema {
            name,
            if_not_exists,
        } => {
            if if_not_exists && root.has_schema(&name) {
                debug!(schema = %name, "schema exists, skipping");
                return Ok(());
            }
            let id = root.add_schema(&name)?.id;
            info!(schema = %name, id, "schema created");
        }
        LogicalPlan::DropSchema { name } => {
            ensure_writable(&name)?;
            let schema = root.must_get_schema(&name)?;
            let mut deleted = 0;
            for table in schema.tables() {
                deleted += storage.delete_prefix(&KeyPrefix::Row(schema.id, table.id).encode()?)?;
            }
            root.remove_schema(&name)?;
            info!(schema = %name, rows = deleted, "schema dropped");
        }
        LogicalPlan::CreateTable {
            schema,
            name,
            columns,
            primary_keys,
            if_not_exists,
        } => {
            ensure_writable(&schema)?;
            let s = root.must_get_schema_mut(&schema)?;
            if if_not_exists && s.has_table(&name) {
                debug!(schema = %schema, table = %name, "table exists, skipping");
                return Ok(());
            }
            if columns.is_empty() {
                return Err(Error::Execution(format!("table {} has no columns", name)));
            }
            let table = s.create_table(&name, |table| {
                for column in &columns {
                    let constraint = ColumnConstraint {
                        unique: column.constraint.unique,
                        not_null: column.constraint.not_null || column.constraint.primary_key,
                    };
                    table.add_column(&column.name, column.data_type, constraint)?;
                }
                table.set_primary_keys(&primary_keys)
            })?;
            info!(schema = %schema, table = %name, id = table.id, "table created");
        }
        LogicalPlan::DropTable { schema, name } => {
            ensure_writable(&schema)?;
            let s = root.must_get_schema_mut(&schema)?;
            let table_id = s.must_get_table(&name)?.id;
            let deleted = storage.delete_prefix(&KeyPrefix::Row(s.id, table_id).encode()?)?;
            s.remove_table(&name)?;
            info!(schema = %schema, table = %name, rows = deleted, "table dropped");
        }
        plan => {
            return Err(Error::Execution(format!(
                "{} is not a utility statement",
                plan.kind()
            )));
        }
    }
    Ok(())
}

fn ensure_writable(schema: &str) -> Result<()> {
    if schema == INFORMATION_SCHEMA {
        return Err(Error::Execution(format!("{} is read-only", INFORMATION_SCHEMA)));
    }
    Ok(())
}
