//! Profile resolution.
//!
//! A profile entity inherits every field it does not explicitly override
//! from the entities it profiles. Resolution walks the profiling references
//! in declaration order and returns the *first* non-empty value found,
//! together with the identifier of the entity that owns that value.
//!
//! Profile references form a directed graph, not a tree: a profile may
//! profile several entities and chains may be cyclic. Every top-level
//! resolution call threads one explicit visited set through its recursion;
//! revisiting an identifier terminates that branch with an unresolved
//! result instead of looping.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::warn;

use weft_core::{
    cardinality::Cardinality,
    identifier::EntityId,
    language::LanguageString,
    semantic::SemanticEntity,
};

/// Read access to entities by identifier.
///
/// Implemented by single entity maps and by the aggregator's cross-model
/// lookup.
pub trait EntityLookup {
    /// Returns the entity with the given identifier, if present.
    fn entity(&self, id: EntityId) -> Option<&SemanticEntity>;
}

impl EntityLookup for IndexMap<EntityId, SemanticEntity> {
    fn entity(&self, id: EntityId) -> Option<&SemanticEntity> {
        self.get(&id)
    }
}

/// The outcome of resolving one overridable field.
///
/// Three states are distinguished: the value is owned by the queried entity
/// itself (`source` is `None`), the value is inherited from a profiled
/// entity (`source` names the owner), or no value could be resolved at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue<T> {
    value: Option<T>,
    source: Option<EntityId>,
}

impl<T> Default for ResolvedValue<T> {
    fn default() -> Self {
        Self {
            value: None,
            source: None,
        }
    }
}

impl<T> ResolvedValue<T> {
    /// A field with no resolvable value.
    pub fn unresolved() -> Self {
        Self {
            value: None,
            source: None,
        }
    }

    /// A value the queried entity defines itself.
    pub fn owned(value: T) -> Self {
        Self {
            value: Some(value),
            source: None,
        }
    }

    /// A value inherited from `source` through the profile chain.
    pub fn inherited(value: T, source: EntityId) -> Self {
        Self {
            value: Some(value),
            source: Some(source),
        }
    }

    /// Borrow the resolved value, if any.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// The entity the value was inherited from; `None` when the value is
    /// owned by the queried entity (or unresolved).
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Returns `true` when no value could be resolved.
    pub fn is_unresolved(&self) -> bool {
        self.value.is_none()
    }
}

impl<T: Copy> ResolvedValue<T> {
    /// The resolved value by copy, if any.
    pub fn get(&self) -> Option<T> {
        self.value
    }
}

/// Resolves one overridable field of `id`.
///
/// `extract` returns the explicit value an entity owns for the field, or
/// `None` when the entity inherits it. The walk recurses through the
/// profiling references in declaration order and keeps the first hit.
pub fn resolve_field<T>(
    lookup: &dyn EntityLookup,
    id: EntityId,
    extract: &dyn Fn(&SemanticEntity) -> Option<T>,
) -> ResolvedValue<T> {
    let mut visited = HashSet::new();
    match resolve_step(lookup, id, extract, &mut visited) {
        Some((value, owner)) if owner == id => ResolvedValue::owned(value),
        Some((value, owner)) => ResolvedValue::inherited(value, owner),
        None => ResolvedValue::unresolved(),
    }
}

fn resolve_step<T>(
    lookup: &dyn EntityLookup,
    id: EntityId,
    extract: &dyn Fn(&SemanticEntity) -> Option<T>,
    visited: &mut HashSet<EntityId>,
) -> Option<(T, EntityId)> {
    if !visited.insert(id) {
        warn!(entity:% = id; "Profile chain revisits entity, treating branch as unresolved");
        return None;
    }
    let entity = lookup.entity(id)?;
    if let Some(value) = extract(entity) {
        return Some((value, id));
    }
    for profiled in entity.profiling() {
        if let Some(found) = resolve_step(lookup, *profiled, extract, visited) {
            return Some(found);
        }
    }
    None
}

fn non_empty(value: &LanguageString) -> Option<LanguageString> {
    if value.is_empty() {
        None
    } else {
        Some(value.clone())
    }
}

/// Resolves the effective name of an entity.
pub fn resolve_name(lookup: &dyn EntityLookup, id: EntityId) -> ResolvedValue<LanguageString> {
    resolve_field(lookup, id, &|entity| match entity {
        SemanticEntity::Class(class) => non_empty(class.name()),
        SemanticEntity::ClassProfile(profile) => profile.name().and_then(non_empty),
        SemanticEntity::Relationship(relationship) => non_empty(relationship.name()),
        SemanticEntity::RelationshipProfile(profile) => profile.name().and_then(non_empty),
        SemanticEntity::Generalization(_) => None,
    })
}

/// Resolves the effective description of an entity.
pub fn resolve_description(
    lookup: &dyn EntityLookup,
    id: EntityId,
) -> ResolvedValue<LanguageString> {
    resolve_field(lookup, id, &|entity| match entity {
        SemanticEntity::Class(class) => non_empty(class.description()),
        SemanticEntity::ClassProfile(profile) => profile.description().and_then(non_empty),
        _ => None,
    })
}

/// Resolves the effective usage note of a profile entity.
///
/// Base entities carry no usage note, so a chain that bottoms out in one
/// yields an unresolved value.
pub fn resolve_usage_note(
    lookup: &dyn EntityLookup,
    id: EntityId,
) -> ResolvedValue<LanguageString> {
    resolve_field(lookup, id, &|entity| match entity {
        SemanticEntity::ClassProfile(profile) => profile.usage_note().and_then(non_empty),
        SemanticEntity::RelationshipProfile(profile) => profile.usage_note().and_then(non_empty),
        _ => None,
    })
}

/// Resolves the concept at one relationship end.
///
/// Ends correspond positionally through relationship profile chains. An
/// unresolved concept means the end points at a literal value (or the chain
/// is broken), which is what makes a relationship an attribute.
pub fn resolve_end_concept(
    lookup: &dyn EntityLookup,
    id: EntityId,
    end_index: usize,
) -> ResolvedValue<EntityId> {
    resolve_field(lookup, id, &|entity| match entity {
        SemanticEntity::Relationship(relationship) => relationship.ends()[end_index].concept(),
        SemanticEntity::RelationshipProfile(profile) => profile.ends()[end_index].concept(),
        _ => None,
    })
}

/// Resolves the cardinality at one relationship end.
///
/// An unset cardinality (`None`) keeps walking the chain; an explicitly
/// unbounded pair is a value like any other and stops the walk.
pub fn resolve_end_cardinality(
    lookup: &dyn EntityLookup,
    id: EntityId,
    end_index: usize,
) -> ResolvedValue<Cardinality> {
    resolve_field(lookup, id, &|entity| match entity {
        SemanticEntity::Relationship(relationship) => relationship.ends()[end_index].cardinality(),
        SemanticEntity::RelationshipProfile(profile) => profile.ends()[end_index].cardinality(),
        _ => None,
    })
}

/// Determines which end indices are the domain and the range.
///
/// For a plain relationship this follows the IRI rule (the end with the
/// non-null IRI is the range). A relationship profile inherits the
/// orientation of the first profiled entity that resolves one.
pub fn resolve_domain_range_indices(
    lookup: &dyn EntityLookup,
    id: EntityId,
) -> Option<(usize, usize)> {
    let mut visited = HashSet::new();
    resolve_orientation(lookup, id, &mut visited)
}

fn resolve_orientation(
    lookup: &dyn EntityLookup,
    id: EntityId,
    visited: &mut HashSet<EntityId>,
) -> Option<(usize, usize)> {
    if !visited.insert(id) {
        warn!(entity:% = id; "Profile chain revisits entity while resolving orientation");
        return None;
    }
    match lookup.entity(id)? {
        SemanticEntity::Relationship(relationship) => relationship.domain_range_indices(),
        SemanticEntity::RelationshipProfile(profile) => profile
            .profiling()
            .iter()
            .find_map(|profiled| resolve_orientation(lookup, *profiled, visited)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use weft_core::{
        cardinality::CardinalityBound,
        semantic::{
            ClassEntity, ClassProfileEntity, RelationshipEnd, RelationshipEntity,
            RelationshipProfileEnd, RelationshipProfileEntity,
        },
    };

    fn entities(list: Vec<SemanticEntity>) -> IndexMap<EntityId, SemanticEntity> {
        list.into_iter().map(|entity| (entity.id(), entity)).collect()
    }

    fn class(id: &str, name: &str) -> SemanticEntity {
        SemanticEntity::Class(ClassEntity::new(
            EntityId::new(id),
            LanguageString::single("en", name),
        ))
    }

    fn profile(id: &str, profiling: &[&str]) -> ClassProfileEntity {
        ClassProfileEntity::new(
            EntityId::new(id),
            profiling.iter().map(|p| EntityId::new(p)).collect(),
        )
    }

    #[test]
    fn test_explicit_value_is_owned() {
        let map = entities(vec![class("person", "Person")]);
        let resolved = resolve_name(&map, EntityId::new("person"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Person"));
        assert_eq!(resolved.source(), None);
    }

    #[test]
    fn test_inherited_value_names_its_owner() {
        let map = entities(vec![
            class("person", "Person"),
            SemanticEntity::ClassProfile(profile("employee", &["person"])),
        ]);
        let resolved = resolve_name(&map, EntityId::new("employee"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Person"));
        assert_eq!(resolved.source(), Some(EntityId::new("person")));
    }

    #[test]
    fn test_override_shadows_inheritance() {
        let map = entities(vec![
            class("person", "Person"),
            SemanticEntity::ClassProfile(
                profile("employee", &["person"])
                    .with_name(LanguageString::single("en", "Employee")),
            ),
        ]);
        let resolved = resolve_name(&map, EntityId::new("employee"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Employee"));
        assert_eq!(resolved.source(), None);
    }

    #[test]
    fn test_first_profiled_entity_wins() {
        let map = entities(vec![
            class("person", "Person"),
            class("agent", "Agent"),
            SemanticEntity::ClassProfile(profile("employee", &["person", "agent"])),
        ]);
        let resolved = resolve_name(&map, EntityId::new("employee"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Person"));
    }

    #[test]
    fn test_empty_value_keeps_walking() {
        let map = entities(vec![
            class("person", "Person"),
            SemanticEntity::ClassProfile(
                profile("employee", &["person"]).with_name(LanguageString::single("en", "")),
            ),
        ]);
        let resolved = resolve_name(&map, EntityId::new("employee"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Person"));
        assert_eq!(resolved.source(), Some(EntityId::new("person")));
    }

    #[test]
    fn test_two_node_cycle_terminates_unresolved() {
        let map = entities(vec![
            SemanticEntity::ClassProfile(profile("a", &["b"])),
            SemanticEntity::ClassProfile(profile("b", &["a"])),
        ]);
        let resolved = resolve_name(&map, EntityId::new("a"));

        assert!(resolved.is_unresolved());
    }

    #[test]
    fn test_self_referential_profile_terminates() {
        let map = entities(vec![SemanticEntity::ClassProfile(profile("a", &["a"]))]);
        let resolved = resolve_name(&map, EntityId::new("a"));

        assert!(resolved.is_unresolved());
    }

    #[test]
    fn test_long_chain_resolves_through_intermediates() {
        let map = entities(vec![
            class("base", "Base"),
            SemanticEntity::ClassProfile(profile("level1", &["base"])),
            SemanticEntity::ClassProfile(profile("level2", &["level1"])),
            SemanticEntity::ClassProfile(profile("level3", &["level2"])),
        ]);
        let resolved = resolve_name(&map, EntityId::new("level3"));

        assert_eq!(resolved.value().unwrap().get("en"), Some("Base"));
        assert_eq!(resolved.source(), Some(EntityId::new("base")));
    }

    #[test]
    fn test_missing_profiled_entity_is_unresolved() {
        let map = entities(vec![SemanticEntity::ClassProfile(profile(
            "orphan",
            &["missing"],
        ))]);
        let resolved = resolve_name(&map, EntityId::new("orphan"));

        assert!(resolved.is_unresolved());
    }

    fn relationship(id: &str, domain: &str, range: &str) -> SemanticEntity {
        SemanticEntity::Relationship(RelationshipEntity::new(
            EntityId::new(id),
            LanguageString::single("en", id),
            [
                RelationshipEnd::to_concept(EntityId::new(domain)).with_cardinality(
                    Cardinality::new(1, CardinalityBound::Unbounded).unwrap(),
                ),
                RelationshipEnd::to_concept(EntityId::new(range))
                    .with_iri("https://example.com/relationship"),
            ],
        ))
    }

    #[test]
    fn test_end_concept_and_cardinality_inherit_positionally() {
        let map = entities(vec![
            relationship("works-for", "person", "organization"),
            SemanticEntity::RelationshipProfile(RelationshipProfileEntity::new(
                EntityId::new("employed-by"),
                vec![EntityId::new("works-for")],
                [
                    RelationshipProfileEnd::inherited(),
                    RelationshipProfileEnd::inherited().with_cardinality(
                        Cardinality::new(0, CardinalityBound::Bounded(1)).unwrap(),
                    ),
                ],
            )),
        ]);

        let domain = resolve_end_concept(&map, EntityId::new("employed-by"), 0);
        assert_eq!(domain.get(), Some(EntityId::new("person")));
        assert_eq!(domain.source(), Some(EntityId::new("works-for")));

        // End 1 overrides its cardinality but inherits its concept.
        let cardinality = resolve_end_cardinality(&map, EntityId::new("employed-by"), 1);
        assert_eq!(cardinality.source(), None);
        assert_eq!(
            cardinality.get(),
            Some(Cardinality::new(0, CardinalityBound::Bounded(1)).unwrap())
        );

        let inherited = resolve_end_cardinality(&map, EntityId::new("employed-by"), 0);
        assert_eq!(inherited.source(), Some(EntityId::new("works-for")));
    }

    #[test]
    fn test_orientation_inherited_through_profile() {
        let map = entities(vec![
            relationship("works-for", "person", "organization"),
            SemanticEntity::RelationshipProfile(RelationshipProfileEntity::new(
                EntityId::new("employed-by"),
                vec![EntityId::new("works-for")],
                [
                    RelationshipProfileEnd::inherited(),
                    RelationshipProfileEnd::inherited(),
                ],
            )),
        ]);

        assert_eq!(
            resolve_domain_range_indices(&map, EntityId::new("employed-by")),
            Some((0, 1))
        );
    }

    #[test]
    fn test_orientation_cycle_terminates() {
        let map = entities(vec![
            SemanticEntity::RelationshipProfile(RelationshipProfileEntity::new(
                EntityId::new("a"),
                vec![EntityId::new("b")],
                [
                    RelationshipProfileEnd::inherited(),
                    RelationshipProfileEnd::inherited(),
                ],
            )),
            SemanticEntity::RelationshipProfile(RelationshipProfileEntity::new(
                EntityId::new("b"),
                vec![EntityId::new("a")],
                [
                    RelationshipProfileEnd::inherited(),
                    RelationshipProfileEnd::inherited(),
                ],
            )),
        ]);

        assert_eq!(resolve_domain_range_indices(&map, EntityId::new("a")), None);
    }
}
