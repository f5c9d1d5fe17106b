//! Visual model store.
//!
//! A [`VisualModel`] owns the diagram's entities, keyed by diagram-local
//! [`VisualId`]s minted in creation order, and maintains a secondary index
//! from represented semantic entity to the (possibly multiple) visual
//! entities representing it. The index is rewritten transactionally on
//! every add and delete, so represented-entity lookups cost O(k) in the
//! number of representations rather than O(n) in total visual entities.
//!
//! Deleting a visual node also deletes every edge attached to it in the
//! same batch, so no mutation can leave a dangling `visual_source` or
//! `visual_target` behind. Multi-entity operations wrap their writes in
//! [`VisualModel::batch`], which collapses all notifications into a single
//! [`VisualModelChange`] emitted after the batch completes.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use weft_core::{
    color::Color,
    identifier::{EntityId, ModelId, VisualId},
    visual::{
        ModelVisualInfo, Position, VisualEntity, VisualNode, VisualProfileRelationship,
        VisualRelationship,
    },
};

use crate::{
    error::WeftError,
    subscription::{Subscribers, Subscription},
};

/// Input for [`VisualModel::add_visual_node`].
#[derive(Debug, Clone)]
pub struct VisualNodeSpec {
    pub represented_entity: EntityId,
    pub model: ModelId,
    pub position: Position,
    pub content: Vec<EntityId>,
}

/// Input for [`VisualModel::add_visual_relationship`].
#[derive(Debug, Clone)]
pub struct VisualRelationshipSpec {
    pub represented_entity: EntityId,
    pub model: ModelId,
    pub visual_source: VisualId,
    pub visual_target: VisualId,
}

/// Input for [`VisualModel::add_visual_profile_relationship`].
#[derive(Debug, Clone)]
pub struct VisualProfileRelationshipSpec {
    pub represented_entity: EntityId,
    pub model: ModelId,
    pub visual_source: VisualId,
    pub visual_target: VisualId,
}

/// Partial update for [`VisualModel::update_visual_entity`].
///
/// Fields that do not apply to the target's kind are ignored. The
/// represented entity is not patchable; the represented index is only
/// rewritten on add and delete.
#[derive(Debug, Clone, Default)]
pub struct VisualEntityPatch {
    pub position: Option<Position>,
    pub content: Option<Vec<EntityId>>,
    pub visual_source: Option<VisualId>,
    pub visual_target: Option<VisualId>,
    pub waypoints: Option<Vec<Position>>,
    pub color: Option<Color>,
}

impl VisualEntityPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch the position of a node.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Patch the ordered content of a node.
    pub fn with_content(mut self, content: Vec<EntityId>) -> Self {
        self.content = Some(content);
        self
    }

    /// Reroute an edge's source endpoint.
    pub fn with_visual_source(mut self, visual_source: VisualId) -> Self {
        self.visual_source = Some(visual_source);
        self
    }

    /// Reroute an edge's target endpoint.
    pub fn with_visual_target(mut self, visual_target: VisualId) -> Self {
        self.visual_target = Some(visual_target);
        self
    }

    /// Patch an edge's waypoints.
    pub fn with_waypoints(mut self, waypoints: Vec<Position>) -> Self {
        self.waypoints = Some(waypoints);
        self
    }

    /// Patch the color of model visual metadata.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// One batched store change notification.
#[derive(Debug, Clone, Default)]
pub struct VisualModelChange {
    /// Entities added by the mutation.
    pub added: Vec<VisualId>,
    /// Entities whose value changed.
    pub updated: Vec<VisualId>,
    /// Entities removed by the mutation.
    pub removed: Vec<VisualId>,
}

impl VisualModelChange {
    /// Returns `true` when the mutation touched nothing.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    fn merge(&mut self, other: VisualModelChange) {
        self.added.extend(other.added);
        self.updated.extend(other.updated);
        self.removed.extend(other.removed);
    }
}

/// The diagram's own entity store.
#[derive(Debug)]
pub struct VisualModel {
    identifier: VisualId,
    entities: IndexMap<VisualId, VisualEntity>,
    represented: HashMap<EntityId, Vec<VisualId>>,
    model_info: HashMap<ModelId, VisualId>,
    subscribers: Subscribers<VisualModelChange>,
    next_index: usize,
    batch_depth: usize,
    pending: VisualModelChange,
}

impl VisualModel {
    /// Creates an empty visual model with the given diagram identifier.
    pub fn new(identifier: VisualId) -> Self {
        Self {
            identifier,
            entities: IndexMap::new(),
            represented: HashMap::new(),
            model_info: HashMap::new(),
            subscribers: Subscribers::new(),
            next_index: 0,
            batch_depth: 0,
            pending: VisualModelChange::default(),
        }
    }

    /// Get the diagram identifier.
    pub fn identifier(&self) -> VisualId {
        self.identifier
    }

    fn mint_id(&mut self) -> VisualId {
        let id = self
            .identifier
            .create_nested(VisualId::from_anonymous(self.next_index));
        self.next_index += 1;
        id
    }

    fn emit(&mut self, change: VisualModelChange) {
        if change.is_empty() {
            return;
        }
        if self.batch_depth > 0 {
            self.pending.merge(change);
        } else {
            self.subscribers.notify(&change);
        }
    }

    /// Runs `f` with all store notifications collapsed into one.
    ///
    /// Nested batches are flattened; the merged [`VisualModelChange`] is
    /// emitted when the outermost batch completes, so subscribers never
    /// observe an intermediate state of a multi-write operation.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            let change = std::mem::take(&mut self.pending);
            if !change.is_empty() {
                self.subscribers.notify(&change);
            }
        }
        result
    }

    fn index_representation(&mut self, represented: EntityId, id: VisualId) {
        self.represented.entry(represented).or_default().push(id);
    }

    fn unindex_representation(&mut self, represented: EntityId, id: VisualId) {
        if let Some(ids) = self.represented.get_mut(&represented) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.represented.remove(&represented);
            }
        }
    }

    fn require_node(&self, id: VisualId) -> Result<(), WeftError> {
        match self.entities.get(&id) {
            Some(entity) if entity.is_node() => Ok(()),
            Some(_) => Err(WeftError::NotAVisualNode(id)),
            None => Err(WeftError::MissingVisualEntity(id)),
        }
    }

    /// Adds a visual node and returns its diagram-local identifier.
    pub fn add_visual_node(&mut self, spec: VisualNodeSpec) -> VisualId {
        let id = self.mint_id();
        let node = VisualNode::new(
            id,
            spec.represented_entity,
            spec.model,
            spec.position,
            spec.content,
        );
        self.entities.insert(id, VisualEntity::Node(node));
        self.index_representation(spec.represented_entity, id);
        self.emit(VisualModelChange {
            added: vec![id],
            ..VisualModelChange::default()
        });
        id
    }

    /// Adds a visual relationship edge between two existing visual nodes.
    pub fn add_visual_relationship(
        &mut self,
        spec: VisualRelationshipSpec,
    ) -> Result<VisualId, WeftError> {
        self.require_node(spec.visual_source)?;
        self.require_node(spec.visual_target)?;
        let id = self.mint_id();
        let edge = VisualRelationship::new(
            id,
            spec.represented_entity,
            spec.model,
            spec.visual_source,
            spec.visual_target,
        );
        self.entities.insert(id, VisualEntity::Relationship(edge));
        self.index_representation(spec.represented_entity, id);
        self.emit(VisualModelChange {
            added: vec![id],
            ..VisualModelChange::default()
        });
        Ok(id)
    }

    /// Adds a visual profile edge between two existing visual nodes.
    pub fn add_visual_profile_relationship(
        &mut self,
        spec: VisualProfileRelationshipSpec,
    ) -> Result<VisualId, WeftError> {
        self.require_node(spec.visual_source)?;
        self.require_node(spec.visual_target)?;
        let id = self.mint_id();
        let edge = VisualProfileRelationship::new(
            id,
            spec.represented_entity,
            spec.model,
            spec.visual_source,
            spec.visual_target,
        );
        self.entities
            .insert(id, VisualEntity::ProfileRelationship(edge));
        self.index_representation(spec.represented_entity, id);
        self.emit(VisualModelChange {
            added: vec![id],
            ..VisualModelChange::default()
        });
        Ok(id)
    }

    /// Ensures visual metadata exists for a model, creating it with the
    /// given color on first use, and returns its identifier.
    pub fn add_model_visual_info(&mut self, model: ModelId, color: Color) -> VisualId {
        if let Some(existing) = self.model_info.get(&model) {
            return *existing;
        }
        let id = self.mint_id();
        let info = ModelVisualInfo::new(id, model, color);
        self.entities.insert(id, VisualEntity::ModelInfo(info));
        self.model_info.insert(model, id);
        self.emit(VisualModelChange {
            added: vec![id],
            ..VisualModelChange::default()
        });
        id
    }

    /// The visual metadata for a model, if present.
    pub fn model_visual_info(&self, model: ModelId) -> Option<&ModelVisualInfo> {
        self.model_info
            .get(&model)
            .and_then(|id| self.entities.get(id))
            .and_then(VisualEntity::as_model_info)
    }

    /// Applies a partial update to a visual entity.
    ///
    /// Patch fields that do not apply to the entity's kind are ignored.
    pub fn update_visual_entity(
        &mut self,
        id: VisualId,
        patch: VisualEntityPatch,
    ) -> Result<(), WeftError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(WeftError::MissingVisualEntity(id))?;

        match entity {
            VisualEntity::Node(node) => {
                if let Some(position) = patch.position {
                    node.set_position(position);
                }
                if let Some(content) = patch.content {
                    node.set_content(content);
                }
            }
            VisualEntity::Relationship(edge) => {
                if let Some(source) = patch.visual_source {
                    edge.set_visual_source(source);
                }
                if let Some(target) = patch.visual_target {
                    edge.set_visual_target(target);
                }
                if let Some(waypoints) = patch.waypoints {
                    edge.set_waypoints(waypoints);
                }
            }
            VisualEntity::ProfileRelationship(edge) => {
                if let Some(source) = patch.visual_source {
                    edge.set_visual_source(source);
                }
                if let Some(target) = patch.visual_target {
                    edge.set_visual_target(target);
                }
                if let Some(waypoints) = patch.waypoints {
                    edge.set_waypoints(waypoints);
                }
            }
            VisualEntity::ModelInfo(info) => {
                if let Some(color) = patch.color {
                    info.set_color(color);
                }
            }
        }

        self.emit(VisualModelChange {
            updated: vec![id],
            ..VisualModelChange::default()
        });
        Ok(())
    }

    /// Deletes a visual entity.
    ///
    /// Deleting a node also deletes every edge attached to it, in the same
    /// batch, so edges never dangle.
    pub fn delete_visual_entity(&mut self, id: VisualId) -> Result<(), WeftError> {
        if !self.entities.contains_key(&id) {
            return Err(WeftError::MissingVisualEntity(id));
        }
        self.batch(|store| {
            store.delete_with_cascade(id);
        });
        Ok(())
    }

    fn delete_with_cascade(&mut self, id: VisualId) {
        let Some(entity) = self.entities.shift_remove(&id) else {
            return;
        };

        if let Some(represented) = entity.represented_entity() {
            self.unindex_representation(represented, id);
        }
        if let VisualEntity::ModelInfo(info) = &entity {
            self.model_info.remove(&info.represented_model());
        }

        if entity.is_node() {
            let attached: Vec<VisualId> = self
                .entities
                .values()
                .filter(|candidate| {
                    candidate
                        .endpoints()
                        .is_some_and(|(source, target)| source == id || target == id)
                })
                .map(VisualEntity::identifier)
                .collect();
            for edge in attached {
                debug!(edge:% = edge, node:% = id; "Deleting edge attached to deleted node");
                self.delete_with_cascade(edge);
            }
        }

        self.emit(VisualModelChange {
            removed: vec![id],
            ..VisualModelChange::default()
        });
    }

    /// Deletes every visual entity tied to a semantic model, including its
    /// visual metadata. Edges of other models attached to deleted nodes are
    /// deleted by the cascade.
    pub fn delete_model_data(&mut self, model: ModelId) {
        let targets: Vec<VisualId> = self
            .entities
            .values()
            .filter(|entity| entity.model() == model)
            .map(VisualEntity::identifier)
            .collect();
        debug!(model:% = model, entities = targets.len(); "Deleting model visual data");
        self.batch(|store| {
            for id in targets {
                store.delete_with_cascade(id);
            }
        });
    }

    /// Returns the visual entity with the given identifier, if present.
    pub fn get_visual_entity(&self, id: VisualId) -> Option<&VisualEntity> {
        self.entities.get(&id)
    }

    /// Borrow the visual entity map, in creation order.
    pub fn get_visual_entities(&self) -> &IndexMap<VisualId, VisualEntity> {
        &self.entities
    }

    /// The first visual entity representing the given semantic entity.
    ///
    /// The choice among duplicates is the first by creation order.
    pub fn get_visual_entity_for_represented(&self, represented: EntityId) -> Option<&VisualEntity> {
        self.represented
            .get(&represented)
            .and_then(|ids| ids.first())
            .and_then(|id| self.entities.get(id))
    }

    /// All visual entities representing the given semantic entity, in
    /// creation order.
    pub fn get_visual_entities_for_represented(&self, represented: EntityId) -> Vec<&VisualEntity> {
        self.represented
            .get(&represented)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.entities.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks whether the given semantic entity has any representation.
    pub fn has_visual_entity_for_represented(&self, represented: EntityId) -> bool {
        self.represented.contains_key(&represented)
    }

    /// The first visual *node* representing the given semantic entity.
    ///
    /// Skips edge representations, which matters for profiled classes that
    /// are represented both by nodes and by profile edges.
    pub fn visual_node_for_represented(&self, represented: EntityId) -> Option<&VisualNode> {
        self.represented.get(&represented).and_then(|ids| {
            ids.iter()
                .filter_map(|id| self.entities.get(id))
                .find_map(VisualEntity::as_node)
        })
    }

    /// Registers a change callback and returns its unsubscribe handle.
    pub fn subscribe_to_changes(
        &self,
        callback: impl Fn(&VisualModelChange) + 'static,
    ) -> Subscription {
        self.subscribers.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{cell::RefCell, rc::Rc};

    fn store() -> VisualModel {
        VisualModel::new(VisualId::new("diagram"))
    }

    fn node_spec(represented: &str) -> VisualNodeSpec {
        VisualNodeSpec {
            represented_entity: EntityId::new(represented),
            model: ModelId::new("model"),
            position: Position::new(0.0, 0.0),
            content: Vec::new(),
        }
    }

    fn edge_spec(represented: &str, source: VisualId, target: VisualId) -> VisualRelationshipSpec {
        VisualRelationshipSpec {
            represented_entity: EntityId::new(represented),
            model: ModelId::new("model"),
            visual_source: source,
            visual_target: target,
        }
    }

    #[test]
    fn test_add_and_lookup_by_represented() {
        let mut store = store();
        let person = EntityId::new("person");

        assert!(!store.has_visual_entity_for_represented(person));
        assert!(store.get_visual_entity_for_represented(person).is_none());

        let id = store.add_visual_node(node_spec("person"));

        assert!(store.has_visual_entity_for_represented(person));
        assert_eq!(
            store
                .get_visual_entity_for_represented(person)
                .unwrap()
                .identifier(),
            id
        );
    }

    #[test]
    fn test_duplicates_keep_creation_order() {
        let mut store = store();
        let person = EntityId::new("person");

        let first = store.add_visual_node(node_spec("person"));
        let second = store.add_visual_node(node_spec("person"));

        let representations = store.get_visual_entities_for_represented(person);
        assert_eq!(representations.len(), 2);
        assert_eq!(representations[0].identifier(), first);
        assert_eq!(representations[1].identifier(), second);

        // The first-match lookup is pinned to creation order.
        assert_eq!(
            store
                .get_visual_entity_for_represented(person)
                .unwrap()
                .identifier(),
            first
        );
    }

    #[test]
    fn test_add_relationship_requires_existing_nodes() {
        let mut store = store();
        let source = store.add_visual_node(node_spec("a"));

        let missing = VisualId::new("nowhere");
        let result = store.add_visual_relationship(edge_spec("r", source, missing));
        assert_eq!(result, Err(WeftError::MissingVisualEntity(missing)));

        let target = store.add_visual_node(node_spec("b"));
        assert!(store.add_visual_relationship(edge_spec("r", source, target)).is_ok());
    }

    #[test]
    fn test_edge_endpoints_must_be_nodes() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let b = store.add_visual_node(node_spec("b"));
        let edge = store
            .add_visual_relationship(edge_spec("r", a, b))
            .unwrap();

        let result = store.add_visual_relationship(edge_spec("r2", a, edge));
        assert_eq!(result, Err(WeftError::NotAVisualNode(edge)));
    }

    #[test]
    fn test_delete_node_cascades_to_attached_edges() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let b = store.add_visual_node(node_spec("b"));
        let edge = store
            .add_visual_relationship(edge_spec("r", a, b))
            .unwrap();

        store.delete_visual_entity(a).unwrap();

        assert!(store.get_visual_entity(a).is_none());
        assert!(store.get_visual_entity(edge).is_none());
        assert!(store.get_visual_entity(b).is_some());
        assert!(!store.has_visual_entity_for_represented(EntityId::new("a")));
        assert!(!store.has_visual_entity_for_represented(EntityId::new("r")));
    }

    #[test]
    fn test_delete_cascade_is_one_notification() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let b = store.add_visual_node(node_spec("b"));
        store.add_visual_relationship(edge_spec("r", a, b)).unwrap();

        let notifications: Rc<RefCell<Vec<VisualModelChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&notifications);
        let _keep = store.subscribe_to_changes(move |change| sink.borrow_mut().push(change.clone()));

        store.delete_visual_entity(a).unwrap();

        let notifications = notifications.borrow();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].removed.len(), 2);
    }

    #[test]
    fn test_update_patch_applies_by_kind() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let b = store.add_visual_node(node_spec("b"));
        let edge = store
            .add_visual_relationship(edge_spec("r", a, b))
            .unwrap();

        store
            .update_visual_entity(a, VisualEntityPatch::new().with_position(Position::new(5.0, 6.0)))
            .unwrap();
        store
            .update_visual_entity(edge, VisualEntityPatch::new().with_visual_target(a))
            .unwrap();

        let node = store.get_visual_entity(a).unwrap().as_node().unwrap();
        assert_eq!(node.position(), Position::new(5.0, 6.0));

        let edge = store.get_visual_entity(edge).unwrap().as_relationship().unwrap();
        assert_eq!(edge.visual_target(), a);
    }

    #[test]
    fn test_update_missing_entity_errors() {
        let mut store = store();
        let missing = VisualId::new("nowhere");
        assert_eq!(
            store.update_visual_entity(missing, VisualEntityPatch::new()),
            Err(WeftError::MissingVisualEntity(missing))
        );
    }

    #[test]
    fn test_model_visual_info_is_created_once() {
        let mut store = store();
        let model = ModelId::new("model");
        let color = Color::new("#336699").unwrap();

        let first = store.add_model_visual_info(model, color);
        let second = store.add_model_visual_info(model, Color::new("red").unwrap());

        assert_eq!(first, second);
        assert_eq!(store.model_visual_info(model).unwrap().color(), color);
    }

    #[test]
    fn test_delete_model_data_cascades() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let foreign = store.add_visual_node(VisualNodeSpec {
            represented_entity: EntityId::new("b"),
            model: ModelId::new("other"),
            position: Position::new(0.0, 0.0),
            content: Vec::new(),
        });
        // An edge owned by the other model, attached to a node of the
        // deleted model.
        let edge = store
            .add_visual_relationship(VisualRelationshipSpec {
                represented_entity: EntityId::new("r"),
                model: ModelId::new("other"),
                visual_source: foreign,
                visual_target: a,
            })
            .unwrap();
        store.add_model_visual_info(ModelId::new("model"), Color::default());

        store.delete_model_data(ModelId::new("model"));

        assert!(store.get_visual_entity(a).is_none());
        assert!(store.get_visual_entity(edge).is_none(), "attached edge is deleted");
        assert!(store.get_visual_entity(foreign).is_some());
        assert!(store.model_visual_info(ModelId::new("model")).is_none());
    }

    #[test]
    fn test_node_filtered_lookup_skips_edges() {
        let mut store = store();
        let a = store.add_visual_node(node_spec("a"));
        let b = store.add_visual_node(node_spec("b"));
        // An edge representing the same semantic entity as node `a`, created
        // first in the index for a hypothetical profile link.
        store
            .add_visual_profile_relationship(VisualProfileRelationshipSpec {
                represented_entity: EntityId::new("a"),
                model: ModelId::new("model"),
                visual_source: a,
                visual_target: b,
            })
            .unwrap();

        let node = store.visual_node_for_represented(EntityId::new("a")).unwrap();
        assert_eq!(node.identifier(), a);
    }
}
