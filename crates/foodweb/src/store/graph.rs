//! Directed diet/eaten-by relationship graph over global id tokens.

use rustc_hash::FxHashMap;

use crate::error::GraphError;
use crate::model::{GlobalId, Relations, RelationsPatch};

/// Liveness probe for referential-integrity checks.
pub trait NodeLookup {
    /// Whether the id references a live row in its table.
    fn contains(&self, id: &GlobalId) -> bool;
}

/// Directed graph of who-eats-whom.
///
/// Both directions of every edge are stored: a consumer's out-edge list
/// (its diet) and a producer's in-edge list (its eaters) are kept in sync
/// on every mutation. Keys are id tokens, the same identity space the
/// entity tables are addressed through.
///
/// The graph shares no transaction with the entity tables; see
/// [`Database::add_living_thing`](crate::store::Database::add_living_thing)
/// for the composition-level consequence.
#[derive(Debug, Default)]
pub struct DietGraph {
    out_edges: FxHashMap<String, Vec<GlobalId>>,
    in_edges: FxHashMap<String, Vec<GlobalId>>,
}

impl DietGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relations recorded for a node.
    ///
    /// Fails with `NotFound` for a node that was never initialized by a
    /// `set` or `update`.
    pub fn get(&self, id: &GlobalId) -> Result<Relations, GraphError> {
        let diet = self.out_edges.get(id.token());
        let eaten_by = self.in_edges.get(id.token());
        if diet.is_none() && eaten_by.is_none() {
            return Err(GraphError::NotFound {
                token: id.token().to_string(),
            });
        }
        Ok(Relations {
            diet: diet.cloned().unwrap_or_default(),
            eaten_by: eaten_by.cloned().unwrap_or_default(),
        })
    }

    /// Attaches relations, additively.
    ///
    /// Every referenced id — the node itself, each diet entry, each
    /// eaten-by entry — must resolve to a live row before anything is
    /// mutated; a rejected call leaves the graph untouched. Prior edges are
    /// never cleared here; [`DietGraph::update`] is the replacing
    /// operation.
    pub fn set(
        &mut self,
        id: &GlobalId,
        relations: &Relations,
        nodes: &impl NodeLookup,
    ) -> Result<(), GraphError> {
        self.check(id, nodes)?;
        for producer in &relations.diet {
            self.check(producer, nodes)?;
        }
        for consumer in &relations.eaten_by {
            self.check(consumer, nodes)?;
        }

        self.out_edges.entry(id.token().to_string()).or_default();
        self.in_edges.entry(id.token().to_string()).or_default();
        for producer in &relations.diet {
            self.attach(id, producer);
        }
        for consumer in &relations.eaten_by {
            self.attach(consumer, id);
        }
        tracing::debug!(
            token = id.token(),
            diet = relations.diet.len(),
            eaten_by = relations.eaten_by.len(),
            "relations attached"
        );
        Ok(())
    }

    /// Replaces each supplied relation side wholesale.
    ///
    /// A supplied side is fully detached — including the mirror entries on
    /// the far end of each edge — before the new set is attached; an
    /// unsupplied side keeps its edges.
    pub fn update(
        &mut self,
        id: &GlobalId,
        patch: &RelationsPatch,
        nodes: &impl NodeLookup,
    ) -> Result<(), GraphError> {
        self.check(id, nodes)?;
        if let Some(diet) = &patch.diet {
            for producer in diet {
                self.check(producer, nodes)?;
            }
        }
        if let Some(eaten_by) = &patch.eaten_by {
            for consumer in eaten_by {
                self.check(consumer, nodes)?;
            }
        }

        if patch.diet.is_some() {
            for producer in self.out_edges.get(id.token()).cloned().unwrap_or_default() {
                self.detach(id, &producer);
            }
        }
        if patch.eaten_by.is_some() {
            for consumer in self.in_edges.get(id.token()).cloned().unwrap_or_default() {
                self.detach(&consumer, id);
            }
        }
        let relations = Relations {
            diet: patch.diet.clone().unwrap_or_default(),
            eaten_by: patch.eaten_by.clone().unwrap_or_default(),
        };
        self.set(id, &relations, nodes)
    }

    fn check(&self, id: &GlobalId, nodes: &impl NodeLookup) -> Result<(), GraphError> {
        if nodes.contains(id) {
            Ok(())
        } else {
            Err(GraphError::MissingNode {
                token: id.token().to_string(),
            })
        }
    }

    /// Records `consumer eats producer` in both directions, skipping edges
    /// already present.
    fn attach(&mut self, consumer: &GlobalId, producer: &GlobalId) {
        let out = self
            .out_edges
            .entry(consumer.token().to_string())
            .or_default();
        if !out.contains(producer) {
            out.push(producer.clone());
        }
        let incoming = self
            .in_edges
            .entry(producer.token().to_string())
            .or_default();
        if !incoming.contains(consumer) {
            incoming.push(consumer.clone());
        }
    }

    /// Removes `consumer eats producer` from both directions.
    fn detach(&mut self, consumer: &GlobalId, producer: &GlobalId) {
        if let Some(out) = self.out_edges.get_mut(consumer.token()) {
            out.retain(|p| p != producer);
        }
        if let Some(incoming) = self.in_edges.get_mut(producer.token()) {
            incoming.retain(|c| c != consumer);
        }
    }
}
