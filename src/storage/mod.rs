//! Storage collaborator
//!
//! `Storage` wraps a byte-level [`Engine`] behind a shared lock and exposes
//! the operations the SQL layer needs: point reads and writes, prefix scans
//! through a cursor that must be released, and atomic write batches.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use tracing::trace;

use crate::error::Result;

pub mod engine;
pub mod keycode;
pub mod memory;

use engine::Engine;

/// Shared handle to a storage engine. Clones share the engine.
pub struct Storage<E: Engine> {
    engine: Arc<Mutex<E>>,
    open_scans: Arc<AtomicUsize>,
}

impl<E: Engine> Clone for Storage<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            open_scans: self.open_scans.clone(),
        }
    }
}

impl<E: Engine> Storage<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            open_scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.engine.lock()?.get(key.to_vec())
    }

    pub fn set(&self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.engine.lock()?.set(key, value)
    }

    pub fn delete(&self, key: Vec<u8>) -> Result<()> {
        self.engine.lock()?.delete(key)
    }

    /// Opens a cursor over every key starting with `prefix`, in key order.
    ///
    /// The cursor reads a consistent view taken when it is opened. It counts
    /// as open until `close` is called or it is dropped.
    pub fn scan(&self, prefix: &[u8]) -> Result<ScanCursor> {
        let entries = self
            .engine
            .lock()?
            .scan_prefix(prefix.to_vec())
            .collect::<Result<Vec<_>>>()?;
        let open = self.open_scans.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(entries = entries.len(), open, "scan opened");
        Ok(ScanCursor {
            entries: entries.into_iter(),
            open_scans: self.open_scans.clone(),
            released: false,
        })
    }

    /// Runs `f` to collect writes, then applies them all under one engine
    /// lock. If `f` fails nothing is written.
    pub fn batch<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut WriteBatch) -> Result<()>,
    {
        let mut batch = WriteBatch::default();
        f(&mut batch)?;

        let mut engine = self.engine.lock()?;
        let ops = batch.ops.len();
        for op in batch.ops {
            match op {
                WriteOp::Set(key, value) => engine.set(key, value)?,
                WriteOp::Delete(key) => engine.delete(key)?,
            }
        }
        trace!(ops, "batch applied");
        Ok(())
    }

    /// Deletes every key under `prefix`, returning how many were removed
    pub fn delete_prefix(&self, prefix: &[u8]) -> Result<usize> {
        let mut cursor = self.scan(prefix)?;
        let mut count = 0;
        let result = self.batch(|batch| {
            for (key, _) in cursor.by_ref() {
                batch.delete(key);
                count += 1;
            }
            Ok(())
        });
        cursor.close();
        result.map(|_| count)
    }

    /// Number of cursors currently open
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }
}

/// Writes collected for `Storage::batch`
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

#[derive(Debug)]
enum WriteOp {
    Set(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

impl WriteBatch {
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(WriteOp::Set(key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(WriteOp::Delete(key));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Cursor over a prefix scan, yielding `(key, value)` pairs
pub struct ScanCursor {
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
    open_scans: Arc<AtomicUsize>,
    released: bool,
}

impl ScanCursor {
    /// Releases the cursor
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.open_scans.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Iterator for ScanCursor {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl Drop for ScanCursor {
    fn drop(&mut self) {
        self.release();
    }
}
