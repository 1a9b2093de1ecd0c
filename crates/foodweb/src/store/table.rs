//! Per-table CRUD over an append-only row list with tombstones.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::decode::{Decoder, ErrorTree};
use crate::error::StoreError;
use crate::model::Table;
use crate::report::report_tree;

/// One slot of a table: a live row, or the marker a soft delete leaves.
///
/// Row identity is the slot index; slots are never reused or compacted, so
/// a deleted row id stays resolvable as deleted instead of aliasing a
/// later row.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRow {
    Live(Map<String, Value>),
    Tombstone,
}

/// Schema-validated CRUD for one entity table.
///
/// Rows are stored as raw JSON objects and re-decoded against the live
/// schema on every read, so schema drift surfaces as a rejection instead
/// of silently corrupt data.
///
/// Mutations take `&mut self`: single-writer access is enforced by the
/// borrow checker within a thread. Embedding in a multi-threaded runtime
/// requires a mutex around the table (or the owning database).
pub struct EntityTable<T, P> {
    table: Table,
    schema: Decoder<T>,
    patch_schema: Decoder<P>,
    rows: Vec<EntityRow>,
}

impl<T: 'static, P: Serialize + 'static> EntityTable<T, P> {
    pub fn new(table: Table, schema: Decoder<T>, patch_schema: Decoder<P>) -> Self {
        Self {
            table,
            schema,
            patch_schema,
            rows: Vec::new(),
        }
    }

    /// Validates and appends a row, returning its id.
    pub fn create(&mut self, value: &Value) -> Result<u64, StoreError> {
        self.schema
            .decode(value)
            .map_err(|tree| self.rejected("create", &tree))?;
        let Some(map) = value.as_object() else {
            let tree = ErrorTree::leaf(value.clone(), "object");
            return Err(self.rejected("create", &tree));
        };
        self.rows.push(EntityRow::Live(map.clone()));
        let row = (self.rows.len() - 1) as u64;
        tracing::debug!(table = self.table.name(), row, "row created");
        Ok(row)
    }

    /// Fetches a row, re-validating the stored value against the schema.
    pub fn get(&self, row: u64) -> Result<T, StoreError> {
        match self.rows.get(row as usize) {
            Some(EntityRow::Live(map)) => self.decode_stored(row, map),
            _ => Err(StoreError::NotFound {
                table: self.table,
                row,
            }),
        }
    }

    /// Validates a patch, shallow-merges its present fields over the stored
    /// row, and returns the merged value.
    ///
    /// Fields absent from the patch are untouched.
    pub fn update(&mut self, row: u64, patch: &Value) -> Result<T, StoreError> {
        let patch = self
            .patch_schema
            .decode(patch)
            .map_err(|tree| self.rejected("update", &tree))?;
        let fields = match serde_json::to_value(&patch) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let map = match self.rows.get_mut(row as usize) {
            Some(EntityRow::Live(map)) => map,
            _ => {
                return Err(StoreError::NotFound {
                    table: self.table,
                    row,
                })
            }
        };
        for (key, value) in fields {
            map.insert(key, value);
        }
        let merged = map.clone();
        tracing::debug!(table = self.table.name(), row, "row patched");
        self.decode_stored(row, &merged)
    }

    /// Soft-deletes a row. Idempotent: deleting an absent or already
    /// deleted row reports `false`.
    pub fn delete(&mut self, row: u64) -> bool {
        match self.rows.get_mut(row as usize) {
            Some(slot @ EntityRow::Live(_)) => {
                *slot = EntityRow::Tombstone;
                tracing::debug!(table = self.table.name(), row, "row tombstoned");
                true
            }
            _ => false,
        }
    }

    /// Live rows with their ids, each re-validated.
    pub fn all(&self) -> Result<Vec<(u64, T)>, StoreError> {
        let mut out = Vec::new();
        for (i, slot) in self.rows.iter().enumerate() {
            if let EntityRow::Live(map) = slot {
                out.push((i as u64, self.decode_stored(i as u64, map)?));
            }
        }
        Ok(out)
    }

    /// Whether the row exists and is live.
    pub fn contains(&self, row: u64) -> bool {
        matches!(self.rows.get(row as usize), Some(EntityRow::Live(_)))
    }

    pub fn table(&self) -> Table {
        self.table
    }

    fn decode_stored(&self, row: u64, map: &Map<String, Value>) -> Result<T, StoreError> {
        let value = Value::Object(map.clone());
        self.schema.decode(&value).map_err(|tree| {
            tracing::warn!(
                table = self.table.name(),
                row,
                "stored row no longer matches the schema"
            );
            StoreError::Rejected {
                errors: report_tree(&tree),
            }
        })
    }

    fn rejected(&self, op: &'static str, tree: &ErrorTree) -> StoreError {
        let errors = report_tree(tree);
        tracing::warn!(
            table = self.table.name(),
            op,
            count = errors.len(),
            "input rejected"
        );
        StoreError::Rejected { errors }
    }
}
