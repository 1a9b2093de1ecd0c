//! Composition root: the entity tables plus the diet graph.

use serde_json::Value;

use crate::decode::Decoder;
use crate::error::DbError;
use crate::model::{
    Animal, AnimalRowPatch, GlobalId, LivingThing, LivingThingInput, LivingThingPatch, Plant,
    PlantRowPatch, Relations, RelationsPatch, Table,
};
use crate::report::report_tree;
use crate::schema;
use crate::store::graph::{DietGraph, NodeLookup};
use crate::store::table::EntityTable;

/// The two entity tables, separated from the graph so referential checks
/// can borrow them while the graph is being mutated.
pub struct Tables {
    pub animals: EntityTable<Animal, AnimalRowPatch>,
    pub plants: EntityTable<Plant, PlantRowPatch>,
}

impl NodeLookup for Tables {
    fn contains(&self, id: &GlobalId) -> bool {
        match id.table() {
            Table::Animal => self.animals.contains(id.row()),
            Table::Plant => self.plants.contains(id.row()),
        }
    }
}

/// In-memory food-web database.
///
/// Single-writer by construction: every mutation takes `&mut self` and the
/// borrow checker serializes access within a thread. That assumption is
/// load-bearing — a multi-threaded embedding must wrap the database in a
/// mutex or an actor, because multi-step writes are not atomic and a
/// concurrent reader could observe a half-applied update.
pub struct Database {
    tables: Tables,
    diet: DietGraph,
}

impl Database {
    pub fn new() -> Self {
        Self {
            tables: Tables {
                animals: EntityTable::new(
                    Table::Animal,
                    schema::animal_row(),
                    schema::animal_row_patch(),
                ),
                plants: EntityTable::new(
                    Table::Plant,
                    schema::plant_row(),
                    schema::plant_row_patch(),
                ),
            },
            diet: DietGraph::new(),
        }
    }

    /// Validates and persists a new living thing, then attaches its
    /// relations.
    ///
    /// The row write and the edge write hit independent stores with no
    /// shared transaction: when a relation references a row that does not
    /// exist, the entity row stays persisted and the error reports only
    /// the failed edge attachment. Callers needing atomicity must layer
    /// their own compensation on top.
    pub fn add_living_thing(&mut self, input: &Value) -> Result<GlobalId, DbError> {
        let input = decode_args(&schema::living_thing_input(), input)?;
        let (id, relations) = match input {
            LivingThingInput::Animal(animal) => {
                let row_value = serde_json::to_value(animal.row())
                    .expect("row serialization cannot fail");
                let row = self.tables.animals.create(&row_value)?;
                (GlobalId::new(Table::Animal, row), animal.relations())
            }
            LivingThingInput::Plant(plant) => {
                let row_value = serde_json::to_value(plant.row())
                    .expect("row serialization cannot fail");
                let row = self.tables.plants.create(&row_value)?;
                (GlobalId::new(Table::Plant, row), plant.relations())
            }
        };
        self.diet.set(&id, &relations, &self.tables)?;
        Ok(id)
    }

    /// Typed node fetch.
    pub fn living_thing(&self, id: &GlobalId) -> Result<LivingThing, DbError> {
        let node = match id.table() {
            Table::Animal => LivingThing::Animal {
                id: id.clone(),
                animal: self.tables.animals.get(id.row())?,
            },
            Table::Plant => LivingThing::Plant {
                id: id.clone(),
                plant: self.tables.plants.get(id.row())?,
            },
        };
        Ok(node)
    }

    /// Decodes `{ id, patch }`, patches the row, and replaces the supplied
    /// relation sides.
    ///
    /// The whole argument object is validated before any store is touched,
    /// so a bad id anywhere in the patch rejects the write outright.
    pub fn update_living_thing(&mut self, args: &Value) -> Result<LivingThing, DbError> {
        let args = decode_args(&schema::update_living_thing_args(), args)?;
        match (&args.patch, args.id.table()) {
            (LivingThingPatch::Animal(patch), Table::Animal) => {
                let row_patch = serde_json::to_value(patch.row_patch())
                    .expect("patch serialization cannot fail");
                self.tables.animals.update(args.id.row(), &row_patch)?;
                self.apply_relations(&args.id, patch.relations_patch())?;
                self.living_thing(&args.id)
            }
            (LivingThingPatch::Plant(patch), Table::Plant) => {
                let row_patch = serde_json::to_value(patch.row_patch())
                    .expect("patch serialization cannot fail");
                self.tables.plants.update(args.id.row(), &row_patch)?;
                self.apply_relations(&args.id, patch.relations_patch())?;
                self.living_thing(&args.id)
            }
            _ => Err(DbError::PatchTableMismatch {
                table: args.id.table(),
            }),
        }
    }

    /// Idempotent soft delete. Graph edges referencing the row are left in
    /// place; reads through them fail at the table.
    pub fn delete_living_thing(&mut self, args: &Value) -> Result<bool, DbError> {
        let args = decode_args(&schema::delete_living_thing_args(), args)?;
        let deleted = match args.id.table() {
            Table::Animal => self.tables.animals.delete(args.id.row()),
            Table::Plant => self.tables.plants.delete(args.id.row()),
        };
        Ok(deleted)
    }

    /// All live nodes across both tables.
    pub fn all_living_things(&self) -> Result<Vec<LivingThing>, DbError> {
        let mut out = Vec::new();
        for (row, animal) in self.tables.animals.all()? {
            out.push(LivingThing::Animal {
                id: GlobalId::new(Table::Animal, row),
                animal,
            });
        }
        for (row, plant) in self.tables.plants.all()? {
            out.push(LivingThing::Plant {
                id: GlobalId::new(Table::Plant, row),
                plant,
            });
        }
        Ok(out)
    }

    /// Relations recorded for a node.
    pub fn relations(&self, id: &GlobalId) -> Result<Relations, DbError> {
        Ok(self.diet.get(id)?)
    }

    /// Additively attaches relations, with referential checks.
    pub fn set_relations(&mut self, id: &GlobalId, relations: &Relations) -> Result<(), DbError> {
        Ok(self.diet.set(id, relations, &self.tables)?)
    }

    /// Replaces the supplied relation sides, with referential checks.
    pub fn update_relations(
        &mut self,
        id: &GlobalId,
        patch: &RelationsPatch,
    ) -> Result<(), DbError> {
        Ok(self.diet.update(id, patch, &self.tables)?)
    }

    /// Direct table access for embedders.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    fn apply_relations(&mut self, id: &GlobalId, patch: RelationsPatch) -> Result<(), DbError> {
        if patch.diet.is_none() && patch.eaten_by.is_none() {
            return Ok(());
        }
        Ok(self.diet.update(id, &patch, &self.tables)?)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_args<T: 'static>(decoder: &Decoder<T>, input: &Value) -> Result<T, DbError> {
    decoder.decode(input).map_err(|tree| DbError::Rejected {
        errors: report_tree(&tree),
    })
}
