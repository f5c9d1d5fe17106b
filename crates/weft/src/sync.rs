//! Visual-model synchronization.
//!
//! The synchronization engine keeps the diagram consistent with the
//! aggregated semantic view. It reacts to two kinds of triggers: batched
//! aggregator change notifications (applied by
//! [`apply_aggregator_change`], wired up by [`attach_synchronizer`]) and
//! explicit user actions (placing a class, attaching a relationship or a
//! profile edge, duplicating a node, shifting node content, removing an
//! entity from the diagram).
//!
//! The invariants it preserves:
//!
//! - an edge's `visual_source`/`visual_target` always identify nodes that
//!   currently exist; an edge whose end can no longer be resolved is
//!   deleted, never left dangling
//! - edge endpoints are rerouted in place, so edge identity and user-set
//!   waypoints survive a domain/range change
//! - a node's content only references attributes of the represented entity
//!
//! Where a semantic entity has several visual node representations, every
//! lookup that needs *one* picks the first by creation order.

use log::{debug, warn};

use weft_core::{
    identifier::{EntityId, VisualId},
    semantic::SemanticEntity,
    visual::{Position, VisualEntity},
};

use crate::{
    aggregator::{AggregatedEntity, AggregatorChange, EntityAggregator},
    config::EngineConfig,
    error::WeftError,
    store::{
        VisualEntityPatch, VisualModel, VisualNodeSpec, VisualProfileRelationshipSpec,
        VisualRelationshipSpec,
    },
    subscription::Subscription,
};

/// Direction for [`shift_attribute_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Toward the front of the content list.
    Up,
    /// Toward the back of the content list.
    Down,
}

/// What to do with one edge endpoint after its concept changed.
enum EndpointAction {
    /// The current node still represents the resolved concept.
    Keep,
    /// Reroute to the first node representing the resolved concept.
    Reroute(VisualId),
    /// The concept has no diagram presence; the edge must go.
    Drop,
}

fn resolve_endpoint(
    visual: &VisualModel,
    current: VisualId,
    concept: Option<EntityId>,
) -> EndpointAction {
    let Some(concept) = concept else {
        return EndpointAction::Drop;
    };
    let current_still_valid = visual
        .get_visual_entity(current)
        .and_then(VisualEntity::as_node)
        .is_some_and(|node| node.represented_entity() == concept);
    if current_still_valid {
        return EndpointAction::Keep;
    }
    match visual.visual_node_for_represented(concept) {
        Some(node) => EndpointAction::Reroute(node.identifier()),
        None => EndpointAction::Drop,
    }
}

/// Resolves the target endpoint of a profile edge against the profiling
/// list: any profiled entity's node is acceptable, otherwise the first
/// profiled entity with a node wins.
fn resolve_profile_target(
    visual: &VisualModel,
    current: VisualId,
    profiling: &[EntityId],
) -> EndpointAction {
    let current_still_valid = visual
        .get_visual_entity(current)
        .and_then(VisualEntity::as_node)
        .is_some_and(|node| profiling.contains(&node.represented_entity()));
    if current_still_valid {
        return EndpointAction::Keep;
    }
    match profiling
        .iter()
        .find_map(|profiled| visual.visual_node_for_represented(*profiled))
    {
        Some(node) => EndpointAction::Reroute(node.identifier()),
        None => EndpointAction::Drop,
    }
}

/// Applies one batched aggregator change to the visual model.
///
/// Removed entities lose every visual representation (edges attached to
/// removed nodes go with them) and are stripped from surviving node
/// content. Updated relationship-like entities have each of their edges
/// re-anchored: a resolvable end keeps or reroutes its node, an
/// unresolvable end deletes the edge.
pub fn apply_aggregator_change(change: &AggregatorChange, visual: &mut VisualModel) {
    visual.batch(|visual| {
        for removed in &change.removed {
            remove_representations(visual, *removed);
        }
        if !change.removed.is_empty() {
            strip_content_references(visual, &change.removed);
        }
        for aggregate in &change.updated {
            if aggregate.is_relationship_like() {
                sync_relationship_edges(visual, aggregate);
            } else if matches!(aggregate.raw(), SemanticEntity::ClassProfile(_)) {
                sync_profile_edges(visual, aggregate);
            }
        }
    });
}

/// Subscribes the synchronization engine to the aggregator's change
/// notifications, targeting its active visual model.
pub fn attach_synchronizer(aggregator: &EntityAggregator) -> Result<Subscription, WeftError> {
    let visual = aggregator
        .active_visual_model()
        .ok_or(WeftError::NoActiveVisualModel)?;
    Ok(aggregator.subscribe_to_changes(move |change| {
        let mut visual = visual.borrow_mut();
        apply_aggregator_change(change, &mut visual);
    }))
}

fn remove_representations(visual: &mut VisualModel, entity: EntityId) -> usize {
    let representations: Vec<VisualId> = visual
        .get_visual_entities_for_represented(entity)
        .iter()
        .map(|representation| representation.identifier())
        .collect();
    let count = representations.len();
    for id in representations {
        // A representation may already be gone through an earlier cascade.
        if visual.get_visual_entity(id).is_some() {
            let _ = visual.delete_visual_entity(id);
        }
    }
    count
}

fn strip_content_references(visual: &mut VisualModel, removed: &[EntityId]) {
    let stale: Vec<(VisualId, Vec<EntityId>)> = visual
        .get_visual_entities()
        .values()
        .filter_map(VisualEntity::as_node)
        .filter(|node| node.content().iter().any(|entry| removed.contains(entry)))
        .map(|node| {
            let content = node
                .content()
                .iter()
                .copied()
                .filter(|entry| !removed.contains(entry))
                .collect();
            (node.identifier(), content)
        })
        .collect();
    for (id, content) in stale {
        let _ = visual.update_visual_entity(id, VisualEntityPatch::new().with_content(content));
    }
}

fn sync_relationship_edges(visual: &mut VisualModel, aggregate: &AggregatedEntity) {
    let domain = aggregate.domain_concept();
    let range = aggregate.range_concept();
    let edges: Vec<(VisualId, VisualId, VisualId)> = visual
        .get_visual_entities_for_represented(aggregate.id())
        .iter()
        .filter_map(|entity| match entity {
            VisualEntity::Relationship(edge) => {
                Some((edge.identifier(), edge.visual_source(), edge.visual_target()))
            }
            _ => None,
        })
        .collect();

    for (id, source, target) in edges {
        let source_action = resolve_endpoint(visual, source, domain);
        let target_action = resolve_endpoint(visual, target, range);
        apply_endpoint_actions(visual, id, aggregate.id(), source_action, target_action);
    }
}

fn sync_profile_edges(visual: &mut VisualModel, aggregate: &AggregatedEntity) {
    let profiling = aggregate.profiling().to_vec();
    let edges: Vec<(VisualId, VisualId, VisualId)> = visual
        .get_visual_entities_for_represented(aggregate.id())
        .iter()
        .filter_map(|entity| match entity {
            VisualEntity::ProfileRelationship(edge) => {
                Some((edge.identifier(), edge.visual_source(), edge.visual_target()))
            }
            _ => None,
        })
        .collect();

    for (id, source, target) in edges {
        let source_action = resolve_endpoint(visual, source, Some(aggregate.id()));
        let target_action = resolve_profile_target(visual, target, &profiling);
        apply_endpoint_actions(visual, id, aggregate.id(), source_action, target_action);
    }
}

fn apply_endpoint_actions(
    visual: &mut VisualModel,
    edge: VisualId,
    represented: EntityId,
    source_action: EndpointAction,
    target_action: EndpointAction,
) {
    match (source_action, target_action) {
        (EndpointAction::Drop, _) | (_, EndpointAction::Drop) => {
            warn!(edge:% = edge, entity:% = represented; "Deleting edge with unresolvable end");
            let _ = visual.delete_visual_entity(edge);
        }
        (source_action, target_action) => {
            let mut patch = VisualEntityPatch::new();
            if let EndpointAction::Reroute(node) = source_action {
                patch = patch.with_visual_source(node);
            }
            if let EndpointAction::Reroute(node) = target_action {
                patch = patch.with_visual_target(node);
            }
            if patch.visual_source.is_some() || patch.visual_target.is_some() {
                debug!(edge:% = edge; "Rerouting edge endpoints in place");
                let _ = visual.update_visual_entity(edge, patch);
            }
        }
    }
}

/// Places a class or class profile on the diagram.
///
/// The new node's content is prefilled with the attribute entities whose
/// resolved domain is the placed class, and visual metadata for the class's
/// model is created on first use with the configured default color.
pub fn add_class_to_visual_model(
    aggregator: &EntityAggregator,
    config: &EngineConfig,
    class: EntityId,
    position: Position,
) -> Result<VisualId, WeftError> {
    let aggregate = aggregator
        .aggregated_entity(class)
        .ok_or(WeftError::MissingEntity(class))?;
    if !aggregate.is_class_like() {
        return Err(WeftError::UnexpectedEntityKind(class));
    }
    let model = aggregate.model();
    let content = aggregator.attributes_of(class);
    let visual = aggregator
        .active_visual_model()
        .ok_or(WeftError::NoActiveVisualModel)?;
    let mut visual = visual.borrow_mut();
    let id = visual.batch(|visual| {
        visual.add_model_visual_info(model, config.default_color());
        visual.add_visual_node(VisualNodeSpec {
            represented_entity: class,
            model,
            position,
            content,
        })
    });
    debug!(entity:% = class, node:% = id; "Class placed on diagram");
    Ok(id)
}

/// Attaches a semantic relationship to the diagram as one visual edge.
///
/// Both the resolved domain and range concepts must already have a visual
/// node representation; otherwise the action fails without touching the
/// diagram. A self-loop uses the same resolved node for both ends. Among
/// duplicate representations, the first by creation order is chosen.
pub fn add_relationship_to_visual_model(
    aggregator: &EntityAggregator,
    relationship: EntityId,
) -> Result<VisualId, WeftError> {
    let aggregate = aggregator
        .aggregated_entity(relationship)
        .ok_or(WeftError::MissingEntity(relationship))?;
    if !aggregate.is_relationship_like() || aggregate.is_attribute() {
        return Err(WeftError::UnexpectedEntityKind(relationship));
    }
    let domain = aggregate
        .domain_concept()
        .ok_or(WeftError::InvalidRelationshipEnds(relationship))?;
    let range = aggregate
        .range_concept()
        .ok_or(WeftError::InvalidRelationshipEnds(relationship))?;
    let model = aggregate.model();

    let visual = aggregator
        .active_visual_model()
        .ok_or(WeftError::NoActiveVisualModel)?;
    let mut visual = visual.borrow_mut();
    let visual_source = visual
        .visual_node_for_represented(domain)
        .map(|node| node.identifier())
        .ok_or(WeftError::InvalidRelationshipEnds(relationship))?;
    let visual_target = visual
        .visual_node_for_represented(range)
        .map(|node| node.identifier())
        .ok_or(WeftError::InvalidRelationshipEnds(relationship))?;

    visual.add_visual_relationship(VisualRelationshipSpec {
        represented_entity: relationship,
        model,
        visual_source,
        visual_target,
    })
}

/// Attaches the "profile of" link of a class profile as a visual edge.
///
/// The profiling entity and at least one of its profiled entities must be
/// visually present; the first profiled entity with a node is the target.
pub fn add_profile_edge_to_visual_model(
    aggregator: &EntityAggregator,
    profile: EntityId,
) -> Result<VisualId, WeftError> {
    let aggregate = aggregator
        .aggregated_entity(profile)
        .ok_or(WeftError::MissingEntity(profile))?;
    let SemanticEntity::ClassProfile(_) = aggregate.raw() else {
        return Err(WeftError::UnexpectedEntityKind(profile));
    };
    let profiling = aggregate.profiling().to_vec();
    let model = aggregate.model();

    let visual = aggregator
        .active_visual_model()
        .ok_or(WeftError::NoActiveVisualModel)?;
    let mut visual = visual.borrow_mut();
    let visual_source = visual
        .visual_node_for_represented(profile)
        .map(|node| node.identifier())
        .ok_or(WeftError::InvalidRelationshipEnds(profile))?;
    let visual_target = profiling
        .iter()
        .find_map(|profiled| visual.visual_node_for_represented(*profiled))
        .map(|node| node.identifier())
        .ok_or(WeftError::InvalidRelationshipEnds(profile))?;

    visual.add_visual_profile_relationship(VisualProfileRelationshipSpec {
        represented_entity: profile,
        model,
        visual_source,
        visual_target,
    })
}

struct AttachedEdge {
    represented: EntityId,
    model: weft_core::identifier::ModelId,
    source: VisualId,
    target: VisualId,
    is_profile: bool,
}

/// Duplicates a visual node, fanning out its attached edges.
///
/// The duplicate shares the original's represented entity and content and
/// sits at the original's position moved by `offset`. Every edge attached
/// to the original spawns the parallel edges implied by its ends now having
/// two possible anchors: the full Cartesian combination of old/new endpoint
/// choices is enumerated, minus the existing edge, with combinations that
/// connect the same unordered endpoint pair collapsed into one edge. A
/// self-loop therefore ends up represented three times: original-original,
/// one mixed orientation, and duplicate-duplicate.
pub fn duplicate_visual_node(
    visual: &mut VisualModel,
    node: VisualId,
    offset: Position,
) -> Result<VisualId, WeftError> {
    let original = visual
        .get_visual_entity(node)
        .ok_or(WeftError::MissingVisualEntity(node))?
        .as_node()
        .ok_or(WeftError::NotAVisualNode(node))?;

    let spec = VisualNodeSpec {
        represented_entity: original.represented_entity(),
        model: original.model(),
        position: original.position().translated(offset.x, offset.y),
        content: original.content().to_vec(),
    };

    let attached: Vec<AttachedEdge> = visual
        .get_visual_entities()
        .values()
        .filter_map(|entity| {
            let (source, target) = entity.endpoints()?;
            if source != node && target != node {
                return None;
            }
            Some(AttachedEdge {
                represented: entity.represented_entity()?,
                model: entity.model(),
                source,
                target,
                is_profile: matches!(entity, VisualEntity::ProfileRelationship(_)),
            })
        })
        .collect();

    visual.batch(|visual| {
        let duplicate = visual.add_visual_node(spec);

        for edge in &attached {
            let source_anchors = if edge.source == node {
                vec![edge.source, duplicate]
            } else {
                vec![edge.source]
            };
            let target_anchors = if edge.target == node {
                vec![edge.target, duplicate]
            } else {
                vec![edge.target]
            };

            let mut seen: Vec<(VisualId, VisualId)> = vec![(edge.source, edge.target)];
            for source in &source_anchors {
                for target in &target_anchors {
                    let covered = seen.iter().any(|(a, b)| {
                        (*a == *source && *b == *target) || (*a == *target && *b == *source)
                    });
                    if covered {
                        continue;
                    }
                    seen.push((*source, *target));
                    if edge.is_profile {
                        visual.add_visual_profile_relationship(VisualProfileRelationshipSpec {
                            represented_entity: edge.represented,
                            model: edge.model,
                            visual_source: *source,
                            visual_target: *target,
                        })?;
                    } else {
                        visual.add_visual_relationship(VisualRelationshipSpec {
                            represented_entity: edge.represented,
                            model: edge.model,
                            visual_source: *source,
                            visual_target: *target,
                        })?;
                    }
                }
            }
        }

        debug!(node:% = node, duplicate:% = duplicate, edges = attached.len(); "Node duplicated");
        Ok(duplicate)
    })
}

/// Moves an attribute by one position within a node's content list.
///
/// Moving up from the first position or down from the last is a no-op
/// rather than a wrap or an error.
pub fn shift_attribute_position(
    visual: &mut VisualModel,
    node: VisualId,
    attribute: EntityId,
    direction: ShiftDirection,
) -> Result<(), WeftError> {
    let content = visual
        .get_visual_entity(node)
        .ok_or(WeftError::MissingVisualEntity(node))?
        .as_node()
        .ok_or(WeftError::NotAVisualNode(node))?
        .content()
        .to_vec();

    let index = content
        .iter()
        .position(|entry| *entry == attribute)
        .ok_or(WeftError::MissingEntity(attribute))?;
    let neighbor = match direction {
        ShiftDirection::Up => index.checked_sub(1),
        ShiftDirection::Down => {
            if index + 1 < content.len() {
                Some(index + 1)
            } else {
                None
            }
        }
    };
    let Some(neighbor) = neighbor else {
        return Ok(());
    };

    let mut content = content;
    content.swap(index, neighbor);
    visual.update_visual_entity(node, VisualEntityPatch::new().with_content(content))
}

/// Removes every visual representation of a semantic entity, along with the
/// edges attached to removed nodes and any content references to it.
///
/// Returns the number of representations that were removed directly.
pub fn remove_from_visual_model(visual: &mut VisualModel, entity: EntityId) -> usize {
    visual.batch(|visual| {
        let count = remove_representations(visual, entity);
        strip_content_references(visual, &[entity]);
        count
    })
}
