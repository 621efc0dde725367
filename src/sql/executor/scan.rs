use tracing::trace;

use crate::{
    context::CancellationToken,
    error::Result,
    sql::{
        catalog::Catalog,
        keys::KeyPrefix,
        optimizer::ScanExec,
        types::{DataChunk, Record},
    },
    storage::{ScanCursor, Storage, engine::Engine},
};

impl ScanExec {
    pub(super) fn execute<E: Engine>(
        &self,
        catalog: &Catalog,
        storage: &Storage<E>,
        token: &CancellationToken,
    ) -> Result<DataChunk> {
        let mut chunk = DataChunk::new(self.output.clone());

        if let Some(system) = self.system {
            let rows = {
                let root = catalog.lock()?;
                system.rows(&root)
            };
            for row in rows {
                token.check()?;
                chunk.append_row(row);
            }
            return Ok(chunk);
        }

        let prefix = KeyPrefix::Row(self.schema_id, self.table_id).encode()?;
        let mut cursor = storage.scan(&prefix)?;
        let result = self.read(&mut cursor, &mut chunk, token);
        cursor.close();
        result?;

        trace!(table = %self.table_name, rows = chunk.len(), "table scanned");
        Ok(chunk)
    }

    fn read(
        &self,
        cursor: &mut ScanCursor,
        chunk: &mut DataChunk,
        token: &CancellationToken,
    ) -> Result<()> {
        for (_, value) in cursor {
            token.check()?;
            let mut record = Record::new(&self.output);
            record.decode(&value)?;
            chunk.append_row(record.into_row()?);
        }
        Ok(())
    }
}
