//! Data model types for the food-web store.
//!
//! This module contains the core types shared across the crate:
//! - Global ids (table-discriminated opaque tokens)
//! - Row shapes (what the entity tables persist)
//! - Input and patch shapes (what clients submit)
//! - Relations (the diet graph's view of a node)

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::IdError;

pub mod id;

pub use id::{decode_values, encode_values, from_global_id, to_global_id, Table};

/// An opaque, table-discriminated identifier.
///
/// Identity is the `(table, row)` pair: two ids naming the same row compare
/// equal even when their token spellings differ (the codec accepts some
/// spellings it never emits).
#[derive(Debug, Clone)]
pub struct GlobalId {
    table: Table,
    row: u64,
    token: String,
}

impl GlobalId {
    /// Builds the id for a `(table, row)` pair, encoding its token.
    pub fn new(table: Table, row: u64) -> Self {
        Self {
            table,
            row,
            token: id::to_global_id(table, row),
        }
    }

    /// Parses a token, keeping the spelling that was supplied.
    pub fn parse(token: &str) -> Result<Self, IdError> {
        let (table, row) = id::from_global_id(token)?;
        Ok(Self {
            table,
            row,
            token: token.to_string(),
        })
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn row(&self) -> u64 {
        self.row
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl PartialEq for GlobalId {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.row == other.row
    }
}

impl Eq for GlobalId {}

impl Hash for GlobalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
        self.row.hash(state);
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl Serialize for GlobalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

/// Plant lifecycle classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlantLifecycle {
    Evergreen,
    Deciduous,
    SemiDeciduous,
}

/// Stored animal row. Relationship fields live in the diet graph, not on
/// the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub name: String,
    /// Days.
    pub lifespan: i64,
    /// Pounds.
    pub weight: f64,
}

/// Stored plant row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub name: String,
    pub lifespan: i64,
    pub weight: f64,
    pub lifecycle: PlantLifecycle,
}

/// Validated animal input, including the graph-only relationship fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalInput {
    pub name: String,
    pub lifespan: i64,
    pub weight: f64,
    pub eaten_by: Vec<GlobalId>,
    pub diet: Vec<GlobalId>,
}

impl AnimalInput {
    /// The row shape the animal table persists.
    pub fn row(&self) -> Animal {
        Animal {
            name: self.name.clone(),
            lifespan: self.lifespan,
            weight: self.weight,
        }
    }

    /// The relations the diet graph attaches.
    pub fn relations(&self) -> Relations {
        Relations {
            diet: self.diet.clone(),
            eaten_by: self.eaten_by.clone(),
        }
    }
}

/// Validated plant input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantInput {
    pub name: String,
    pub lifespan: i64,
    pub weight: f64,
    pub lifecycle: PlantLifecycle,
    pub eaten_by: Vec<GlobalId>,
}

impl PlantInput {
    pub fn row(&self) -> Plant {
        Plant {
            name: self.name.clone(),
            lifespan: self.lifespan,
            weight: self.weight,
            lifecycle: self.lifecycle,
        }
    }

    /// Plants eat nothing; only the eaten-by side carries edges.
    pub fn relations(&self) -> Relations {
        Relations {
            diet: Vec::new(),
            eaten_by: self.eaten_by.clone(),
        }
    }
}

/// Exactly one living-thing variant, as decoded from client input.
#[derive(Debug, Clone, PartialEq)]
pub enum LivingThingInput {
    Animal(AnimalInput),
    Plant(PlantInput),
}

/// Patch over an animal, all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet: Option<Vec<GlobalId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eaten_by: Option<Vec<GlobalId>>,
}

impl AnimalPatch {
    /// The row-level part of the patch.
    pub fn row_patch(&self) -> AnimalRowPatch {
        AnimalRowPatch {
            name: self.name.clone(),
            lifespan: self.lifespan,
            weight: self.weight,
        }
    }

    /// The graph-level part of the patch.
    pub fn relations_patch(&self) -> RelationsPatch {
        RelationsPatch {
            diet: self.diet.clone(),
            eaten_by: self.eaten_by.clone(),
        }
    }
}

/// Patch over a plant, all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<PlantLifecycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eaten_by: Option<Vec<GlobalId>>,
}

impl PlantPatch {
    pub fn row_patch(&self) -> PlantRowPatch {
        PlantRowPatch {
            name: self.name.clone(),
            lifespan: self.lifespan,
            weight: self.weight,
            lifecycle: self.lifecycle,
        }
    }

    pub fn relations_patch(&self) -> RelationsPatch {
        RelationsPatch {
            diet: None,
            eaten_by: self.eaten_by.clone(),
        }
    }
}

/// Row-level animal patch: exactly the fields the table shallow-merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Row-level plant patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifespan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<PlantLifecycle>,
}

/// Patch over either living-thing variant.
#[derive(Debug, Clone, PartialEq)]
pub enum LivingThingPatch {
    Animal(AnimalPatch),
    Plant(PlantPatch),
}

/// Arguments for an update: which node, and what to change.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateLivingThingArgs {
    pub id: GlobalId,
    pub patch: LivingThingPatch,
}

/// Arguments for a typed node fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct LivingThingArgs {
    pub id: GlobalId,
}

/// Arguments for a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteLivingThingArgs {
    pub id: GlobalId,
}

/// Arguments for listing, page-numbered from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AllLivingThingsArgs {
    pub page: i64,
}

/// A node's relations as recorded by the diet graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relations {
    /// Producers this node eats (out-edges).
    pub diet: Vec<GlobalId>,
    /// Consumers that eat this node (in-edges).
    pub eaten_by: Vec<GlobalId>,
}

/// Partial relations update; a supplied side fully replaces that side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationsPatch {
    pub diet: Option<Vec<GlobalId>>,
    pub eaten_by: Option<Vec<GlobalId>>,
}

/// A typed node fetched through the store surface.
#[derive(Debug, Clone, PartialEq)]
pub enum LivingThing {
    Animal { id: GlobalId, animal: Animal },
    Plant { id: GlobalId, plant: Plant },
}

impl LivingThing {
    pub fn id(&self) -> &GlobalId {
        match self {
            LivingThing::Animal { id, .. } | LivingThing::Plant { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LivingThing::Animal { animal, .. } => &animal.name,
            LivingThing::Plant { plant, .. } => &plant.name,
        }
    }
}
