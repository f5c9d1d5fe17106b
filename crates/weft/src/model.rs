//! In-memory semantic model.
//!
//! A [`SemanticModel`] owns the entities of one vocabulary and exposes the
//! narrow contract the engine consumes: identity, entity lookup, an
//! operation entry point, and change subscription. Edits go through
//! [`ModelOperation`]s so that every mutation produces a [`ModelChange`]
//! the aggregator can react to; a batch of operations produces a single
//! change notification.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use weft_core::{
    identifier::{EntityId, ModelId},
    semantic::SemanticEntity,
};

use crate::subscription::{Subscribers, Subscription};

/// An edit applied to a semantic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum ModelOperation {
    /// Adds a new entity; fails when the identifier is already taken.
    CreateEntity { entity: SemanticEntity },
    /// Replaces an existing entity; fails when the identifier is unknown.
    ModifyEntity { entity: SemanticEntity },
    /// Removes an entity; fails when the identifier is unknown.
    DeleteEntity { id: EntityId },
}

/// Outcome of a single [`ModelOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// Whether the operation was applied.
    pub success: bool,
    /// The identifier of the affected entity, when one exists.
    pub id: Option<EntityId>,
}

impl OperationResult {
    fn applied(id: EntityId) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }

    fn rejected(id: Option<EntityId>) -> Self {
        Self { success: false, id }
    }
}

/// The identifiers touched by one mutation (or one batch of mutations).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelChange {
    /// Entities created by the mutation.
    pub created: Vec<EntityId>,
    /// Entities whose value was replaced.
    pub modified: Vec<EntityId>,
    /// Entities removed by the mutation.
    pub removed: Vec<EntityId>,
}

impl ModelChange {
    /// Returns `true` when the mutation touched nothing.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// One independently editable vocabulary.
///
/// Entities keep creation order; lookups are by identifier.
#[derive(Debug)]
pub struct SemanticModel {
    id: ModelId,
    alias: Option<String>,
    entities: IndexMap<EntityId, SemanticEntity>,
    subscribers: Subscribers<ModelChange>,
}

impl SemanticModel {
    /// Create an empty model.
    pub fn new(id: ModelId) -> Self {
        Self {
            id,
            alias: None,
            entities: IndexMap::new(),
            subscribers: Subscribers::new(),
        }
    }

    /// Sets the human-facing model alias.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_owned());
        self
    }

    /// Get the model identifier.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The human-facing alias, if set.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Borrow the entity map, in creation order.
    pub fn entities(&self) -> &IndexMap<EntityId, SemanticEntity> {
        &self.entities
    }

    /// Returns the entity with the given identifier, if present.
    pub fn entity(&self, id: EntityId) -> Option<&SemanticEntity> {
        self.entities.get(&id)
    }

    /// Checks whether an entity with the given identifier exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Applies one operation and notifies subscribers.
    ///
    /// A rejected operation (duplicate create, unknown modify/delete target)
    /// reports `success == false` and emits no notification.
    pub fn execute_operation(&mut self, operation: ModelOperation) -> OperationResult {
        let mut change = ModelChange::default();
        let result = self.apply_operation(operation, &mut change);
        if !change.is_empty() {
            self.subscribers.notify(&change);
        }
        result
    }

    /// Applies a batch of operations, emitting a single change notification.
    pub fn execute_operations(&mut self, operations: Vec<ModelOperation>) -> Vec<OperationResult> {
        let mut change = ModelChange::default();
        let results = operations
            .into_iter()
            .map(|operation| self.apply_operation(operation, &mut change))
            .collect();
        if !change.is_empty() {
            self.subscribers.notify(&change);
        }
        results
    }

    /// Registers a change callback and returns its unsubscribe handle.
    ///
    /// Callbacks run synchronously after a mutation completes and must not
    /// mutate this model re-entrantly; enqueue follow-up edits instead.
    pub fn subscribe_to_changes(&self, callback: impl Fn(&ModelChange) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    fn apply_operation(
        &mut self,
        operation: ModelOperation,
        change: &mut ModelChange,
    ) -> OperationResult {
        match operation {
            ModelOperation::CreateEntity { entity } => {
                let id = entity.id();
                if self.entities.contains_key(&id) {
                    debug!(model:% = self.id, entity:% = id; "Rejecting create of duplicate entity");
                    return OperationResult::rejected(Some(id));
                }
                self.entities.insert(id, entity);
                change.created.push(id);
                OperationResult::applied(id)
            }
            ModelOperation::ModifyEntity { entity } => {
                let id = entity.id();
                match self.entities.get_mut(&id) {
                    Some(slot) => {
                        *slot = entity;
                        change.modified.push(id);
                        OperationResult::applied(id)
                    }
                    None => {
                        debug!(model:% = self.id, entity:% = id; "Rejecting modify of unknown entity");
                        OperationResult::rejected(Some(id))
                    }
                }
            }
            ModelOperation::DeleteEntity { id } => {
                if self.entities.shift_remove(&id).is_some() {
                    change.removed.push(id);
                    OperationResult::applied(id)
                } else {
                    debug!(model:% = self.id, entity:% = id; "Rejecting delete of unknown entity");
                    OperationResult::rejected(Some(id))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{cell::RefCell, rc::Rc};

    use weft_core::{language::LanguageString, semantic::ClassEntity};

    fn class(id: &str, name: &str) -> SemanticEntity {
        SemanticEntity::Class(ClassEntity::new(
            EntityId::new(id),
            LanguageString::single("en", name),
        ))
    }

    #[test]
    fn test_alias() {
        let model = SemanticModel::new(ModelId::new("vocabulary")).with_alias("My vocabulary");
        assert_eq!(model.alias(), Some("My vocabulary"));
        assert_eq!(SemanticModel::new(ModelId::new("other")).alias(), None);
    }

    #[test]
    fn test_create_and_lookup() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        let result = model.execute_operation(ModelOperation::CreateEntity {
            entity: class("person", "Person"),
        });

        assert!(result.success);
        assert_eq!(result.id, Some(EntityId::new("person")));
        assert!(model.contains(EntityId::new("person")));
        assert_eq!(model.entities().len(), 1);
    }

    #[test]
    fn test_duplicate_create_is_rejected() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        model.execute_operation(ModelOperation::CreateEntity {
            entity: class("person", "Person"),
        });
        let result = model.execute_operation(ModelOperation::CreateEntity {
            entity: class("person", "Human"),
        });

        assert!(!result.success);
        let entity = model.entity(EntityId::new("person")).unwrap();
        assert_eq!(
            entity.as_class().unwrap().name().get("en"),
            Some("Person"),
            "rejected create must not overwrite"
        );
    }

    #[test]
    fn test_modify_unknown_is_rejected() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        let result = model.execute_operation(ModelOperation::ModifyEntity {
            entity: class("missing", "Missing"),
        });
        assert!(!result.success);
    }

    #[test]
    fn test_delete_removes_entity() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        model.execute_operation(ModelOperation::CreateEntity {
            entity: class("person", "Person"),
        });
        let result = model.execute_operation(ModelOperation::DeleteEntity {
            id: EntityId::new("person"),
        });

        assert!(result.success);
        assert!(!model.contains(EntityId::new("person")));
    }

    #[test]
    fn test_batch_emits_single_notification() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        let notifications: Rc<RefCell<Vec<ModelChange>>> = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&notifications);
        let _keep = model.subscribe_to_changes(move |change| sink.borrow_mut().push(change.clone()));

        model.execute_operations(vec![
            ModelOperation::CreateEntity {
                entity: class("person", "Person"),
            },
            ModelOperation::CreateEntity {
                entity: class("organization", "Organization"),
            },
            ModelOperation::DeleteEntity {
                id: EntityId::new("person"),
            },
        ]);

        let notifications = notifications.borrow();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].created.len(), 2);
        assert_eq!(notifications[0].removed, vec![EntityId::new("person")]);
    }

    #[test]
    fn test_rejected_operation_emits_no_notification() {
        let mut model = SemanticModel::new(ModelId::new("vocabulary"));
        let count = Rc::new(RefCell::new(0usize));

        let sink = Rc::clone(&count);
        let _keep = model.subscribe_to_changes(move |_| *sink.borrow_mut() += 1);

        model.execute_operation(ModelOperation::DeleteEntity {
            id: EntityId::new("missing"),
        });

        assert_eq!(*count.borrow(), 0);
    }
}
