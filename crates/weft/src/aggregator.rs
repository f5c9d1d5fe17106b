//! Entity aggregation across semantic models.
//!
//! The [`EntityAggregator`] merges the entities of N independent semantic
//! models, together with their profile resolution, into one addressable
//! view: every entity identifier maps to an [`AggregatedEntity`] holding
//! the raw entity plus the effective value of each overridable field.
//!
//! Mutations flow through the aggregator (`execute_operation`); the
//! aggregator subscribes to every added model and the model's own change
//! notification fills a pending queue, which is drained after the mutation
//! completes. Recomputation is incremental: only entities reachable through
//! a profile edge from a changed entity (forward or backward) are
//! revisited, so the cost is bounded by the profile fan-in/out degree, not
//! by model size. All recomputed identifiers of one mutation are batched
//! into a single change notification.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use petgraph::{
    stable_graph::{NodeIndex, StableDiGraph},
    visit::{Bfs, EdgeRef, Reversed},
};

use weft_core::{
    cardinality::Cardinality,
    identifier::{EntityId, ModelId},
    language::LanguageString,
    semantic::SemanticEntity,
};

use crate::{
    error::WeftError,
    model::{ModelChange, ModelOperation, OperationResult, SemanticModel},
    profile::{
        EntityLookup, ResolvedValue, resolve_description, resolve_domain_range_indices,
        resolve_end_cardinality, resolve_end_concept, resolve_name, resolve_usage_note,
    },
    store::VisualModel,
    subscription::{Subscribers, Subscription},
};

/// One resolved relationship end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedEnd {
    concept: ResolvedValue<EntityId>,
    cardinality: ResolvedValue<Cardinality>,
}

impl AggregatedEnd {
    /// The resolved concept reference of this end.
    pub fn concept(&self) -> &ResolvedValue<EntityId> {
        &self.concept
    }

    /// The resolved cardinality of this end.
    pub fn cardinality(&self) -> &ResolvedValue<Cardinality> {
        &self.cardinality
    }
}

/// The resolved domain and range of a relationship-like entity.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEnds {
    domain: AggregatedEnd,
    range: AggregatedEnd,
}

impl AggregatedEnds {
    /// The resolved domain end.
    pub fn domain(&self) -> &AggregatedEnd {
        &self.domain
    }

    /// The resolved range end.
    pub fn range(&self) -> &AggregatedEnd {
        &self.range
    }
}

/// The computed, materialized view of one semantic entity after resolving
/// all profile inheritance.
///
/// Every overridable field carries its final value plus, when inheritance
/// rather than direct assignment is in effect, the identifier of the
/// profile source the value came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedEntity {
    id: EntityId,
    model: ModelId,
    raw: SemanticEntity,
    name: ResolvedValue<LanguageString>,
    description: ResolvedValue<LanguageString>,
    usage_note: ResolvedValue<LanguageString>,
    ends: Option<AggregatedEnds>,
}

impl AggregatedEntity {
    /// Get the entity identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The model the raw entity belongs to.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Borrow the raw entity as declared in its model.
    pub fn raw(&self) -> &SemanticEntity {
        &self.raw
    }

    /// The resolved name.
    pub fn name(&self) -> &ResolvedValue<LanguageString> {
        &self.name
    }

    /// The resolved description.
    pub fn description(&self) -> &ResolvedValue<LanguageString> {
        &self.description
    }

    /// The resolved usage note.
    pub fn usage_note(&self) -> &ResolvedValue<LanguageString> {
        &self.usage_note
    }

    /// The resolved ends for relationship-like entities.
    pub fn ends(&self) -> Option<&AggregatedEnds> {
        self.ends.as_ref()
    }

    /// The resolved domain concept, when this entity is relationship-like
    /// and its domain resolves to a concept.
    pub fn domain_concept(&self) -> Option<EntityId> {
        self.ends.as_ref().and_then(|ends| ends.domain.concept.get())
    }

    /// The resolved range concept.
    pub fn range_concept(&self) -> Option<EntityId> {
        self.ends.as_ref().and_then(|ends| ends.range.concept.get())
    }

    /// The entities this entity profiles, empty for non-profile variants.
    pub fn profiling(&self) -> &[EntityId] {
        self.raw.profiling()
    }

    /// Returns `true` for classes and class profiles.
    pub fn is_class_like(&self) -> bool {
        self.raw.is_class_like()
    }

    /// Returns `true` for relationships and relationship profiles.
    pub fn is_relationship_like(&self) -> bool {
        self.raw.is_relationship_like()
    }

    /// Returns `true` when this is an attribute: a relationship-like entity
    /// whose resolved domain is a concept and whose resolved range is a
    /// literal value.
    pub fn is_attribute(&self) -> bool {
        self.is_relationship_like()
            && self.domain_concept().is_some()
            && self.range_concept().is_none()
    }
}

/// One batched aggregator change notification.
#[derive(Debug, Clone, Default)]
pub struct AggregatorChange {
    /// Entities whose aggregated value was recomputed.
    pub updated: Vec<AggregatedEntity>,
    /// Entities whose aggregated value was discarded.
    pub removed: Vec<EntityId>,
}

/// Directed graph of profile references used to bound incremental
/// recomputation.
///
/// Edges run from a profile to each entity it profiles. Nodes are created
/// lazily, including for referenced entities that do not (yet) exist, so a
/// dangling profile reference starts affecting its referrer the moment the
/// referenced entity appears.
#[derive(Debug, Default)]
struct ProfileDependencyGraph {
    graph: StableDiGraph<EntityId, ()>,
    nodes: HashMap<EntityId, NodeIndex>,
}

impl ProfileDependencyGraph {
    fn ensure_node(&mut self, id: EntityId) -> NodeIndex {
        match self.nodes.get(&id) {
            Some(index) => *index,
            None => {
                let index = self.graph.add_node(id);
                self.nodes.insert(id, index);
                index
            }
        }
    }

    /// Replaces the outgoing profile edges of `id`.
    fn set_profiling(&mut self, id: EntityId, profiling: &[EntityId]) {
        let node = self.ensure_node(id);
        let outgoing: Vec<_> = self.graph.edges(node).map(|edge| edge.id()).collect();
        for edge in outgoing {
            self.graph.remove_edge(edge);
        }
        for profiled in profiling {
            let target = self.ensure_node(*profiled);
            self.graph.add_edge(node, target, ());
        }
    }

    /// Every entity whose profile chain (forward or backward) includes `id`,
    /// including `id` itself.
    fn affected_by(&self, id: EntityId) -> IndexSet<EntityId> {
        let mut affected = IndexSet::new();
        affected.insert(id);
        let Some(&start) = self.nodes.get(&id) else {
            return affected;
        };

        let mut forward = Bfs::new(&self.graph, start);
        while let Some(node) = forward.next(&self.graph) {
            affected.insert(self.graph[node]);
        }

        let reversed = Reversed(&self.graph);
        let mut backward = Bfs::new(reversed, start);
        while let Some(node) = backward.next(reversed) {
            affected.insert(self.graph[node]);
        }

        affected
    }
}

/// Cross-model entity lookup in model insertion order.
struct AggregateLookup<'a> {
    models: &'a IndexMap<ModelId, SemanticModel>,
}

impl EntityLookup for AggregateLookup<'_> {
    fn entity(&self, id: EntityId) -> Option<&SemanticEntity> {
        self.models.values().find_map(|model| model.entity(id))
    }
}

fn find_entity<'a>(
    models: &'a IndexMap<ModelId, SemanticModel>,
    id: EntityId,
) -> Option<(&'a SemanticEntity, ModelId)> {
    models
        .values()
        .find_map(|model| model.entity(id).map(|entity| (entity, model.id())))
}

fn compute_aggregate(
    models: &IndexMap<ModelId, SemanticModel>,
    id: EntityId,
) -> Option<AggregatedEntity> {
    let (raw, model) = find_entity(models, id)?;
    let raw = raw.clone();
    let lookup = AggregateLookup { models };

    let ends = if raw.is_relationship_like() {
        resolve_domain_range_indices(&lookup, id).map(|(domain, range)| AggregatedEnds {
            domain: AggregatedEnd {
                concept: resolve_end_concept(&lookup, id, domain),
                cardinality: resolve_end_cardinality(&lookup, id, domain),
            },
            range: AggregatedEnd {
                concept: resolve_end_concept(&lookup, id, range),
                cardinality: resolve_end_cardinality(&lookup, id, range),
            },
        })
    } else {
        None
    };

    Some(AggregatedEntity {
        id,
        model,
        name: resolve_name(&lookup, id),
        description: resolve_description(&lookup, id),
        usage_note: resolve_usage_note(&lookup, id),
        ends,
        raw,
    })
}

/// Merges N semantic models and their profile resolution into one view.
#[derive(Debug, Default)]
pub struct EntityAggregator {
    models: IndexMap<ModelId, SemanticModel>,
    aggregated: IndexMap<EntityId, AggregatedEntity>,
    dependencies: ProfileDependencyGraph,
    pending: Rc<RefCell<ModelChange>>,
    subscribers: Subscribers<AggregatorChange>,
    model_subscriptions: HashMap<ModelId, Subscription>,
    active_visual: Option<Rc<RefCell<VisualModel>>>,
}

impl EntityAggregator {
    /// Creates an aggregator with no models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model and aggregates its entities.
    ///
    /// Entities in other models whose profile chains reference entities of
    /// the new model are recomputed as well.
    pub fn add_model(&mut self, model: SemanticModel) -> Result<ModelId, WeftError> {
        let model_id = model.id();
        if self.models.contains_key(&model_id) {
            return Err(WeftError::DuplicateModel(model_id));
        }
        info!(model:% = model_id, entities = model.entities().len(); "Adding model");

        let pending = Rc::clone(&self.pending);
        let subscription = model.subscribe_to_changes(move |change| {
            let mut queue = pending.borrow_mut();
            queue.created.extend(change.created.iter().copied());
            queue.modified.extend(change.modified.iter().copied());
            queue.removed.extend(change.removed.iter().copied());
        });
        self.model_subscriptions.insert(model_id, subscription);

        self.pending
            .borrow_mut()
            .created
            .extend(model.entities().keys().copied());
        self.models.insert(model_id, model);
        self.flush();
        Ok(model_id)
    }

    /// Removes a model, discarding the aggregated view of its entities.
    pub fn remove_model(&mut self, model_id: ModelId) -> Result<SemanticModel, WeftError> {
        let model = self
            .models
            .shift_remove(&model_id)
            .ok_or(WeftError::MissingModel(model_id))?;
        info!(model:% = model_id; "Removing model");
        if let Some(subscription) = self.model_subscriptions.remove(&model_id) {
            subscription.unsubscribe();
        }
        self.pending
            .borrow_mut()
            .removed
            .extend(model.entities().keys().copied());
        self.flush();
        Ok(model)
    }

    /// Returns the model with the given identifier, if loaded.
    pub fn model(&self, model_id: ModelId) -> Option<&SemanticModel> {
        self.models.get(&model_id)
    }

    /// Checks whether a model is loaded.
    pub fn has_model(&self, model_id: ModelId) -> bool {
        self.models.contains_key(&model_id)
    }

    /// Iterates over the loaded models in insertion order.
    pub fn models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.models.values()
    }

    /// Applies one operation to the given model and recomputes the
    /// aggregated view for every affected entity.
    pub fn execute_operation(
        &mut self,
        model_id: ModelId,
        operation: ModelOperation,
    ) -> Result<OperationResult, WeftError> {
        let model = self
            .models
            .get_mut(&model_id)
            .ok_or(WeftError::MissingModel(model_id))?;
        let result = model.execute_operation(operation);
        self.flush();
        Ok(result)
    }

    /// Applies a batch of operations to the given model with a single
    /// recompute/notify cycle.
    pub fn execute_operations(
        &mut self,
        model_id: ModelId,
        operations: Vec<ModelOperation>,
    ) -> Result<Vec<OperationResult>, WeftError> {
        let model = self
            .models
            .get_mut(&model_id)
            .ok_or(WeftError::MissingModel(model_id))?;
        let results = model.execute_operations(operations);
        self.flush();
        Ok(results)
    }

    /// Returns the raw entity with the given identifier from whichever
    /// loaded model holds it.
    pub fn find_entity(&self, id: EntityId) -> Option<&SemanticEntity> {
        self.models.values().find_map(|model| model.entity(id))
    }

    /// The aggregated view of one entity.
    pub fn aggregated_entity(&self, id: EntityId) -> Option<&AggregatedEntity> {
        self.aggregated.get(&id)
    }

    /// Borrow the whole aggregated view, keyed by entity identifier.
    pub fn aggregated_entities(&self) -> &IndexMap<EntityId, AggregatedEntity> {
        &self.aggregated
    }

    /// The attribute entities whose resolved domain is the given class, in
    /// model and declaration order.
    pub fn attributes_of(&self, class: EntityId) -> Vec<EntityId> {
        self.models
            .values()
            .flat_map(|model| model.entities().keys())
            .filter(|id| {
                self.aggregated
                    .get(*id)
                    .is_some_and(|aggregate| {
                        aggregate.is_attribute() && aggregate.domain_concept() == Some(class)
                    })
            })
            .copied()
            .collect()
    }

    /// Sets the visual model the synchronization engine operates on.
    pub fn set_active_visual_model(&mut self, visual: Rc<RefCell<VisualModel>>) {
        self.active_visual = Some(visual);
    }

    /// The active visual model, if one is set.
    pub fn active_visual_model(&self) -> Option<Rc<RefCell<VisualModel>>> {
        self.active_visual.clone()
    }

    /// Returns a read view over the aggregator.
    pub fn view(&self) -> AggregatorView<'_> {
        AggregatorView { aggregator: self }
    }

    /// Registers a change callback and returns its unsubscribe handle.
    pub fn subscribe_to_changes(
        &self,
        callback: impl Fn(&AggregatorChange) + 'static,
    ) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Drains the pending queue, recomputes every affected entity, and
    /// emits one batched change notification.
    fn flush(&mut self) {
        let change = std::mem::take(&mut *self.pending.borrow_mut());
        if change.is_empty() {
            return;
        }

        let mut touched: IndexSet<EntityId> = IndexSet::new();
        touched.extend(change.created.iter().copied());
        touched.extend(change.modified.iter().copied());
        touched.extend(change.removed.iter().copied());

        // Refresh profile edges before computing reachability, so both the
        // old and the new profiled entities land in the affected set: the
        // affected set of a touched entity is taken from the updated graph,
        // while entities that used to inherit from it still reach it
        // through their own (unchanged) edges.
        for id in &touched {
            let profiling = find_entity(&self.models, *id)
                .map(|(entity, _)| entity.profiling().to_vec())
                .unwrap_or_default();
            self.dependencies.set_profiling(*id, &profiling);
        }

        let mut affected: IndexSet<EntityId> = IndexSet::new();
        for id in &touched {
            affected.extend(self.dependencies.affected_by(*id));
        }

        let mut updated = Vec::new();
        let mut removed = Vec::new();
        for id in affected {
            match compute_aggregate(&self.models, id) {
                Some(aggregate) => {
                    self.aggregated.insert(id, aggregate.clone());
                    updated.push(aggregate);
                }
                None => {
                    if self.aggregated.shift_remove(&id).is_some() {
                        removed.push(id);
                    }
                }
            }
        }

        debug!(updated = updated.len(), removed = removed.len(); "Aggregated view recomputed");
        if !updated.is_empty() || !removed.is_empty() {
            self.subscribers.notify(&AggregatorChange { updated, removed });
        }
    }
}

/// Read view over an [`EntityAggregator`].
///
/// The view exposes the aggregated entity map (each entry carrying the raw
/// entity and its aggregated fields), the active visual model, and change
/// subscription.
#[derive(Debug, Clone, Copy)]
pub struct AggregatorView<'a> {
    aggregator: &'a EntityAggregator,
}

impl<'a> AggregatorView<'a> {
    /// Borrow the aggregated entity map, keyed by entity identifier.
    pub fn entities(&self) -> &'a IndexMap<EntityId, AggregatedEntity> {
        &self.aggregator.aggregated
    }

    /// The aggregated view of one entity.
    pub fn entity(&self, id: EntityId) -> Option<&'a AggregatedEntity> {
        self.aggregator.aggregated.get(&id)
    }

    /// The active visual model, if one is set.
    pub fn active_visual_model(&self) -> Option<Rc<RefCell<VisualModel>>> {
        self.aggregator.active_visual_model()
    }

    /// Registers a change callback and returns its unsubscribe handle.
    pub fn subscribe_to_changes(
        &self,
        callback: impl Fn(&AggregatorChange) + 'static,
    ) -> Subscription {
        self.aggregator.subscribe_to_changes(callback)
    }
}
