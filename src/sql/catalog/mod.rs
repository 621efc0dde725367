//! Schema catalog
//!
//! Three nested levels: the root owns schemas, a schema owns tables, a table
//! owns columns and indexes. Every level stores its children in an
//! id-keyed arena plus a name index, and allocates ids from a counter kept on
//! the owning object. The whole graph sits behind one mutex; anything that
//! must be atomic (check, then mutate) holds the guard across both steps.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

mod schema;
pub mod system;
mod table;

pub use schema::Schema;
pub use table::{Column, ColumnConstraint, Index, Table};

/// Catalog object identifier, unique within the immediate parent only
pub type ObjectId = u32;

/// Named objects of one catalog level, addressable by name or id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ObjectMap<T> {
    by_id: BTreeMap<ObjectId, T>,
    by_name: HashMap<String, ObjectId>,
}

impl<T> Default for ObjectMap<T> {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T> ObjectMap<T> {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Fails with a duplicate error when `name` is taken
    pub(crate) fn ensure_vacant(&self, kind: &str, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(Error::Duplicate(format!("{} {} already exists", kind, name)));
        }
        Ok(())
    }

    /// Inserts under a freshly allocated id. Callers check the name first.
    pub(crate) fn insert(&mut self, id: ObjectId, name: &str, object: T) -> &mut T {
        self.by_name.insert(name.to_string(), id);
        self.by_id.entry(id).or_insert(object)
    }

    fn id_of(&self, name: &str) -> Option<ObjectId> {
        let id = *self.by_name.get(name)?;
        if !self.by_id.contains_key(&id) {
            panic!("catalog corruption: {} is mapped to id {} which does not exist", name, id);
        }
        Some(id)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        let id = self.id_of(name)?;
        self.by_id.get(&id)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let id = self.id_of(name)?;
        self.by_id.get_mut(&id)
    }

    pub(crate) fn get_by_id(&self, id: ObjectId) -> Option<&T> {
        self.by_id.get(&id)
    }

    pub(crate) fn remove(&mut self, kind: &str, name: &str) -> Result<T> {
        let id = self
            .id_of(name)
            .ok_or_else(|| Error::NotFound(format!("{} {} does not exist", kind, name)))?;
        self.by_name.remove(name);
        self.by_id
            .remove(&id)
            .ok_or_else(|| Error::Internal(format!("{} {} vanished during removal", kind, name)))
    }

    /// Objects in id (creation) order
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.by_id.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// Top of the catalog graph: every schema in the database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootCatalog {
    next_id: ObjectId,
    schemas: ObjectMap<Schema>,
}

impl RootCatalog {
    /// An empty catalog with no system schema
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_schema(&mut self, name: &str) -> Result<&mut Schema> {
        self.schemas.ensure_vacant("schema", name)?;
        self.next_id += 1;
        let id = self.next_id;
        debug!(schema = name, id, "adding schema");
        Ok(self.schemas.insert(id, name, Schema::new(id, name)))
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains(name)
    }

    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn get_schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(name)
    }

    pub fn get_schema_by_id(&self, id: ObjectId) -> Option<&Schema> {
        self.schemas.get_by_id(id)
    }

    /// Like `get_schema`, but a missing schema is an error
    pub fn must_get_schema(&self, name: &str) -> Result<&Schema> {
        self.get_schema(name)
            .ok_or_else(|| Error::NotFound(format!("schema {} does not exist", name)))
    }

    pub fn must_get_schema_mut(&mut self, name: &str) -> Result<&mut Schema> {
        self.get_schema_mut(name)
            .ok_or_else(|| Error::NotFound(format!("schema {} does not exist", name)))
    }

    /// Removes the schema object only; its tables' stored rows are the
    /// caller's to clean up.
    pub fn remove_schema(&mut self, name: &str) -> Result<Schema> {
        let schema = self.schemas.remove("schema", name)?;
        debug!(schema = name, id = schema.id, "removed schema");
        Ok(schema)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.iter()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}

/// Lock-guarded catalog shared by every session of a database
#[derive(Debug)]
pub struct Catalog {
    inner: Mutex<RootCatalog>,
}

impl Catalog {
    /// A fresh catalog holding only `information_schema`
    pub fn new() -> Result<Self> {
        let mut root = RootCatalog::empty();
        system::seed(&mut root)?;
        Ok(Self::from_root(root))
    }

    pub fn from_root(root: RootCatalog) -> Self {
        Self {
            inner: Mutex::new(root),
        }
    }

    /// Acquires the catalog's single exclusive lock
    pub fn lock(&self) -> Result<MutexGuard<'_, RootCatalog>> {
        Ok(self.inner.lock()?)
    }

    /// Serializes the whole catalog to JSON
    pub fn snapshot(&self) -> Result<String> {
        let root = self.lock()?;
        let json = serde_json::to_string_pretty(&*root)?;
        info!(schemas = root.schema_count(), "catalog snapshot taken");
        Ok(json)
    }

    /// Rebuilds a catalog from a `snapshot`
    pub fn restore(json: &str) -> Result<Self> {
        let mut root: RootCatalog = serde_json::from_str(json)?;
        if !root.has_schema(system::INFORMATION_SCHEMA) {
            system::seed(&mut root)?;
        }
        info!(schemas = root.schema_count(), "catalog restored");
        Ok(Self::from_root(root))
    }
}
