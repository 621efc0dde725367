use tracing::info;

use crate::{
    context::CancellationToken,
    error::{Error, Result},
    sql::{
        catalog::{Catalog, Table},
        executor::eval::evaluate,
        keys::{Key, KeyPrefix},
        optimizer::InsertExec,
        types::{DataRow, DataSchema, DataType, Record, Value},
    },
    storage::{Storage, engine::Engine},
};

impl InsertExec {
    /// Writes every row in one storage batch, returning the row count.
    ///
    /// The catalog lock is held throughout, so uniqueness checks and row id
    /// allocation cannot interleave with another insert into the same table.
    pub(super) fn execute<E: Engine>(
        &self,
        catalog: &Catalog,
        storage: &Storage<E>,
        token: &CancellationToken,
    ) -> Result<usize> {
        let rows = self.evaluate_rows(token)?;

        let mut root = catalog.lock()?;
        let table = root
            .must_get_schema_mut(&self.schema_name)?
            .must_get_table_mut(&self.table_name)?;
        if table.id != self.table_id || table.data_schema() != self.layout {
            return Err(Error::Execution(format!(
                "table {}.{} changed while the insert was planned",
                self.schema_name, self.table_name
            )));
        }

        self.check_unique(table, storage, &rows)?;

        let mut writes = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = Record::new(&self.layout);
            for (i, value) in row.values.iter().enumerate() {
                record.set(i, value.clone())?;
            }
            let key = Key::Row(self.schema_id, self.table_id, table.next_sequence());
            writes.push((key.encode()?, record.encode()?));
        }
        storage.batch(|batch| {
            for (key, value) in writes {
                batch.set(key, value);
            }
            Ok(())
        })?;

        info!(table = %self.table_name, rows = rows.len(), "rows inserted");
        Ok(rows.len())
    }

    /// Evaluates the row expressions, widening INT into FLOAT columns
    fn evaluate_rows(&self, token: &CancellationToken) -> Result<Vec<DataRow>> {
        let empty_schema = DataSchema::default();
        let empty_row = DataRow::new(Vec::new());
        let mut rows = Vec::with_capacity(self.rows.len());
        for exprs in &self.rows {
            token.check()?;
            let mut values = Vec::with_capacity(exprs.len());
            for (expr, column) in exprs.iter().zip(&self.layout.columns) {
                let value = match (evaluate(expr, &empty_row, &empty_schema)?, column.data_type) {
                    (Value::Int(i), DataType::Float) => Value::Float(i as f64),
                    (value, data_type) if value.datatype() != data_type => {
                        return Err(Error::TypeMismatch(format!(
                            "column {} is {}, got {}",
                            column.name,
                            data_type,
                            value.datatype()
                        )));
                    }
                    (value, _) => value,
                };
                values.push(value);
            }
            rows.push(DataRow::new(values));
        }
        Ok(rows)
    }

    /// Rejects rows that repeat a UNIQUE column value or a primary key,
    /// whether against stored rows or earlier rows of the same insert
    fn check_unique<E: Engine>(
        &self,
        table: &Table,
        storage: &Storage<E>,
        rows: &[DataRow],
    ) -> Result<()> {
        let unique: Vec<usize> = table
            .columns()
            .enumerate()
            .filter(|(_, c)| c.constraint.unique)
            .map(|(i, _)| i)
            .collect();
        let primary: Vec<usize> = table
            .primary_keys()
            .iter()
            .filter_map(|id| table.columns().position(|c| c.id == *id))
            .collect();
        if unique.is_empty() && primary.is_empty() {
            return Ok(());
        }

        let mut seen: Vec<DataRow> = Vec::new();
        let prefix = KeyPrefix::Row(self.schema_id, self.table_id).encode()?;
        let mut cursor = storage.scan(&prefix)?;
        let decoded = cursor.by_ref().try_for_each(|(_, value)| {
            let mut record = Record::new(&self.layout);
            record.decode(&value)?;
            seen.push(record.into_row()?);
            Ok::<_, Error>(())
        });
        cursor.close();
        decoded?;

        for row in rows {
            for &i in &unique {
                if seen.iter().any(|s| s.values[i] == row.values[i]) {
                    return Err(Error::Execution(format!(
                        "duplicate value {} for unique column {}",
                        row.values[i], self.layout.columns[i].name
                    )));
                }
            }
            if !primary.is_empty()
                && seen
                    .iter()
                    .any(|s| primary.iter().all(|&i| s.values[i] == row.values[i]))
            {
                return Err(Error::Execution(format!(
                    "duplicate primary key in table {}",
                    self.table_name
                )));
            }
            seen.push(row.clone());
        }
        Ok(())
    }
}
