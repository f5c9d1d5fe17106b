//! Visual model sanitization.
//!
//! [`sanitize_visual_model`] is the consistency sweep run after bulk edits
//! or model removal: it deletes visual entities that no longer correspond
//! to a valid semantic entity, drops node content entries whose attribute
//! is gone or whose resolved domain no longer matches the node, and drops
//! visual metadata of models that are no longer loaded.
//!
//! The sweep is idempotent and identity-preserving: entities that are
//! already consistent are not rewritten, so a clean model produces no
//! change notification at all.

use log::info;

use weft_core::{
    identifier::{EntityId, VisualId},
    visual::VisualEntity,
};

use crate::{
    aggregator::EntityAggregator,
    store::{VisualEntityPatch, VisualModel},
};

/// What one sanitizer sweep repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Visual entities deleted because their semantic counterpart is gone.
    pub removed_entities: usize,
    /// Content entries dropped from surviving nodes.
    pub removed_content_entries: usize,
}

impl SanitizeReport {
    /// Returns `true` when the sweep found nothing to repair.
    pub fn is_clean(&self) -> bool {
        self.removed_entities == 0 && self.removed_content_entries == 0
    }
}

/// Sweeps the visual model against the loaded models and their aggregated
/// view, repairing every stale reference in place.
pub fn sanitize_visual_model(
    aggregator: &EntityAggregator,
    visual: &mut VisualModel,
) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    let stale_entities: Vec<VisualId> = visual
        .get_visual_entities()
        .values()
        .filter(|entity| match entity {
            VisualEntity::ModelInfo(info) => !aggregator.has_model(info.represented_model()),
            _ => entity
                .represented_entity()
                .is_some_and(|represented| aggregator.find_entity(represented).is_none()),
        })
        .map(VisualEntity::identifier)
        .collect();

    let stale_content: Vec<(VisualId, Vec<EntityId>)> = visual
        .get_visual_entities()
        .values()
        .filter_map(VisualEntity::as_node)
        .filter(|node| !stale_entities.contains(&node.identifier()))
        .filter_map(|node| {
            let represented = node.represented_entity();
            let kept: Vec<EntityId> = node
                .content()
                .iter()
                .copied()
                .filter(|attribute| {
                    aggregator
                        .aggregated_entity(*attribute)
                        .is_some_and(|aggregate| {
                            aggregate.is_attribute()
                                && aggregate.domain_concept() == Some(represented)
                        })
                })
                .collect();
            if kept.len() == node.content().len() {
                // Identity-preserving: consistent nodes are left untouched.
                None
            } else {
                Some((node.identifier(), kept))
            }
        })
        .collect();

    if stale_entities.is_empty() && stale_content.is_empty() {
        return report;
    }

    visual.batch(|visual| {
        for (node, kept) in stale_content {
            report.removed_content_entries += visual
                .get_visual_entity(node)
                .and_then(VisualEntity::as_node)
                .map(|current| current.content().len() - kept.len())
                .unwrap_or_default();
            let _ = visual.update_visual_entity(node, VisualEntityPatch::new().with_content(kept));
        }
        for id in stale_entities {
            // A stale edge may already be gone through a node's cascade.
            if visual.get_visual_entity(id).is_some() {
                report.removed_entities += 1;
                let _ = visual.delete_visual_entity(id);
            }
        }
    });

    info!(
        removed_entities = report.removed_entities,
        removed_content_entries = report.removed_content_entries;
        "Visual model sanitized"
    );
    report
}
