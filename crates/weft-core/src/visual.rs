//! Visual (diagram) entity types.
//!
//! A diagram owns its entities and addresses them by [`VisualId`]; each
//! visual entity *represents* something from the semantic side:
//!
//! - [`VisualNode`] - represents exactly one class or class profile; carries
//!   a position, an ordered list of attribute content, and references to
//!   nested visual sub-models
//! - [`VisualRelationship`] - represents one relationship or relationship
//!   profile; its `visual_source`/`visual_target` point at visual nodes, not
//!   at the semantic ends directly
//! - [`VisualProfileRelationship`] - represents a "profile of" link between
//!   two visually placed entities
//! - [`ModelVisualInfo`] - per-semantic-model display metadata such as color
//!
//! One semantic entity may be represented by several visual nodes at once
//! (node duplication); the store layer keeps the index from represented
//! entity to its representations.

use serde::{Deserialize, Serialize};

use crate::{
    color::Color,
    identifier::{EntityId, ModelId, VisualId},
};

/// A position on the diagram canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position moved by the given offset.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A visual node representing one class or class profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualNode {
    identifier: VisualId,
    represented_entity: EntityId,
    model: ModelId,
    position: Position,
    content: Vec<EntityId>,
    visual_models: Vec<VisualId>,
}

impl VisualNode {
    /// Create a new visual node.
    pub fn new(
        identifier: VisualId,
        represented_entity: EntityId,
        model: ModelId,
        position: Position,
        content: Vec<EntityId>,
    ) -> Self {
        Self {
            identifier,
            represented_entity,
            model,
            position,
            content,
            visual_models: Vec::new(),
        }
    }

    /// Sets the nested visual sub-model references.
    pub fn with_visual_models(mut self, visual_models: Vec<VisualId>) -> Self {
        self.visual_models = visual_models;
        self
    }

    /// Get the diagram-local identifier.
    pub fn identifier(&self) -> VisualId {
        self.identifier
    }

    /// The semantic entity this node represents.
    pub fn represented_entity(&self) -> EntityId {
        self.represented_entity
    }

    /// The semantic model the represented entity belongs to.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Get the node position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Sets the node position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// The ordered attribute content of this node.
    pub fn content(&self) -> &[EntityId] {
        &self.content
    }

    /// Replaces the ordered attribute content of this node.
    pub fn set_content(&mut self, content: Vec<EntityId>) {
        self.content = content;
    }

    /// References to nested visual sub-models.
    pub fn visual_models(&self) -> &[VisualId] {
        &self.visual_models
    }
}

/// A visual relationship edge between two visual nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualRelationship {
    identifier: VisualId,
    represented_entity: EntityId,
    model: ModelId,
    visual_source: VisualId,
    visual_target: VisualId,
    waypoints: Vec<Position>,
}

impl VisualRelationship {
    /// Create a new visual relationship edge.
    pub fn new(
        identifier: VisualId,
        represented_entity: EntityId,
        model: ModelId,
        visual_source: VisualId,
        visual_target: VisualId,
    ) -> Self {
        Self {
            identifier,
            represented_entity,
            model,
            visual_source,
            visual_target,
            waypoints: Vec::new(),
        }
    }

    /// Get the diagram-local identifier.
    pub fn identifier(&self) -> VisualId {
        self.identifier
    }

    /// The semantic relationship this edge represents.
    pub fn represented_entity(&self) -> EntityId {
        self.represented_entity
    }

    /// The semantic model the represented entity belongs to.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// The visual node at the source end.
    pub fn visual_source(&self) -> VisualId {
        self.visual_source
    }

    /// The visual node at the target end.
    pub fn visual_target(&self) -> VisualId {
        self.visual_target
    }

    /// Reroutes the source end to another visual node.
    pub fn set_visual_source(&mut self, visual_source: VisualId) {
        self.visual_source = visual_source;
    }

    /// Reroutes the target end to another visual node.
    pub fn set_visual_target(&mut self, visual_target: VisualId) {
        self.visual_target = visual_target;
    }

    /// User-set waypoints along the edge.
    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    /// Replaces the edge waypoints.
    pub fn set_waypoints(&mut self, waypoints: Vec<Position>) {
        self.waypoints = waypoints;
    }
}

/// A visual edge for a "profile of" link between two placed entities.
///
/// Connects the visual entity of the profiling entity (`visual_source`) to
/// the visual entity of the profiled entity (`visual_target`). The
/// represented entity is the profiling entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualProfileRelationship {
    identifier: VisualId,
    represented_entity: EntityId,
    model: ModelId,
    visual_source: VisualId,
    visual_target: VisualId,
    waypoints: Vec<Position>,
}

impl VisualProfileRelationship {
    /// Create a new visual profile edge.
    pub fn new(
        identifier: VisualId,
        represented_entity: EntityId,
        model: ModelId,
        visual_source: VisualId,
        visual_target: VisualId,
    ) -> Self {
        Self {
            identifier,
            represented_entity,
            model,
            visual_source,
            visual_target,
            waypoints: Vec::new(),
        }
    }

    /// Get the diagram-local identifier.
    pub fn identifier(&self) -> VisualId {
        self.identifier
    }

    /// The profiling entity this edge represents.
    pub fn represented_entity(&self) -> EntityId {
        self.represented_entity
    }

    /// The semantic model the represented entity belongs to.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// The visual node of the profiling entity.
    pub fn visual_source(&self) -> VisualId {
        self.visual_source
    }

    /// The visual node of the profiled entity.
    pub fn visual_target(&self) -> VisualId {
        self.visual_target
    }

    /// Reroutes the source end to another visual node.
    pub fn set_visual_source(&mut self, visual_source: VisualId) {
        self.visual_source = visual_source;
    }

    /// Reroutes the target end to another visual node.
    pub fn set_visual_target(&mut self, visual_target: VisualId) {
        self.visual_target = visual_target;
    }

    /// User-set waypoints along the edge.
    pub fn waypoints(&self) -> &[Position] {
        &self.waypoints
    }

    /// Replaces the edge waypoints.
    pub fn set_waypoints(&mut self, waypoints: Vec<Position>) {
        self.waypoints = waypoints;
    }
}

/// Per-semantic-model display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVisualInfo {
    identifier: VisualId,
    represented_model: ModelId,
    color: Color,
}

impl ModelVisualInfo {
    /// Create visual metadata for a model.
    pub fn new(identifier: VisualId, represented_model: ModelId, color: Color) -> Self {
        Self {
            identifier,
            represented_model,
            color,
        }
    }

    /// Get the diagram-local identifier.
    pub fn identifier(&self) -> VisualId {
        self.identifier
    }

    /// The semantic model this metadata belongs to.
    pub fn represented_model(&self) -> ModelId {
        self.represented_model
    }

    /// Get the model color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Sets the model color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// The tagged union of entities a visual model can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VisualEntity {
    /// A visual node
    Node(VisualNode),
    /// A visual relationship edge
    Relationship(VisualRelationship),
    /// A visual profile edge
    ProfileRelationship(VisualProfileRelationship),
    /// Per-model display metadata
    ModelInfo(ModelVisualInfo),
}

impl VisualEntity {
    /// Get the diagram-local identifier, regardless of variant.
    pub fn identifier(&self) -> VisualId {
        match self {
            VisualEntity::Node(node) => node.identifier(),
            VisualEntity::Relationship(relationship) => relationship.identifier(),
            VisualEntity::ProfileRelationship(profile) => profile.identifier(),
            VisualEntity::ModelInfo(info) => info.identifier(),
        }
    }

    /// The represented semantic entity, `None` for model metadata.
    pub fn represented_entity(&self) -> Option<EntityId> {
        match self {
            VisualEntity::Node(node) => Some(node.represented_entity()),
            VisualEntity::Relationship(relationship) => Some(relationship.represented_entity()),
            VisualEntity::ProfileRelationship(profile) => Some(profile.represented_entity()),
            VisualEntity::ModelInfo(_) => None,
        }
    }

    /// The semantic model this visual entity is tied to.
    pub fn model(&self) -> ModelId {
        match self {
            VisualEntity::Node(node) => node.model(),
            VisualEntity::Relationship(relationship) => relationship.model(),
            VisualEntity::ProfileRelationship(profile) => profile.model(),
            VisualEntity::ModelInfo(info) => info.represented_model(),
        }
    }

    /// The `(visual_source, visual_target)` pair for edge variants.
    pub fn endpoints(&self) -> Option<(VisualId, VisualId)> {
        match self {
            VisualEntity::Relationship(relationship) => {
                Some((relationship.visual_source(), relationship.visual_target()))
            }
            VisualEntity::ProfileRelationship(profile) => {
                Some((profile.visual_source(), profile.visual_target()))
            }
            _ => None,
        }
    }

    /// Returns `true` for the node variant.
    pub fn is_node(&self) -> bool {
        matches!(self, VisualEntity::Node(_))
    }

    /// Returns `true` for the edge variants.
    pub fn is_edge(&self) -> bool {
        self.endpoints().is_some()
    }

    /// Borrow the node variant, if this is one.
    pub fn as_node(&self) -> Option<&VisualNode> {
        match self {
            VisualEntity::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Mutably borrow the node variant, if this is one.
    pub fn as_node_mut(&mut self) -> Option<&mut VisualNode> {
        match self {
            VisualEntity::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Borrow the relationship variant, if this is one.
    pub fn as_relationship(&self) -> Option<&VisualRelationship> {
        match self {
            VisualEntity::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }

    /// Borrow the model metadata variant, if this is one.
    pub fn as_model_info(&self) -> Option<&ModelVisualInfo> {
        match self {
            VisualEntity::ModelInfo(info) => Some(info),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(identifier: &str, represented: &str) -> VisualEntity {
        VisualEntity::Node(VisualNode::new(
            VisualId::new(identifier),
            EntityId::new(represented),
            ModelId::new("model"),
            Position::new(0.0, 0.0),
            Vec::new(),
        ))
    }

    #[test]
    fn test_position_translated() {
        let position = Position::new(10.0, 20.0);
        let moved = position.translated(5.0, -5.0);
        assert_eq!(moved, Position::new(15.0, 15.0));
    }

    #[test]
    fn test_identifier_and_represented_access() {
        let entity = node("n0", "person");
        assert_eq!(entity.identifier(), "n0");
        assert_eq!(entity.represented_entity(), Some(EntityId::new("person")));
        assert!(entity.is_node());
        assert!(!entity.is_edge());
    }

    #[test]
    fn test_edge_endpoints() {
        let edge = VisualEntity::Relationship(VisualRelationship::new(
            VisualId::new("e0"),
            EntityId::new("works-for"),
            ModelId::new("model"),
            VisualId::new("n0"),
            VisualId::new("n1"),
        ));

        assert!(edge.is_edge());
        assert_eq!(
            edge.endpoints(),
            Some((VisualId::new("n0"), VisualId::new("n1")))
        );
    }

    #[test]
    fn test_model_info_has_no_represented_entity() {
        let info = VisualEntity::ModelInfo(ModelVisualInfo::new(
            VisualId::new("i0"),
            ModelId::new("model"),
            Color::default(),
        ));

        assert_eq!(info.represented_entity(), None);
        assert_eq!(info.model(), ModelId::new("model"));
    }

    #[test]
    fn test_reroute_preserves_waypoints() {
        let mut edge = VisualRelationship::new(
            VisualId::new("e1"),
            EntityId::new("works-for"),
            ModelId::new("model"),
            VisualId::new("n0"),
            VisualId::new("n1"),
        );
        edge.set_waypoints(vec![Position::new(1.0, 2.0)]);

        edge.set_visual_target(VisualId::new("n2"));

        assert_eq!(edge.visual_target(), "n2");
        assert_eq!(edge.waypoints(), &[Position::new(1.0, 2.0)]);
    }
}
