//! Semantic vocabulary entity types.
//!
//! This module contains the tagged union of entities a semantic model can
//! hold, after the pattern of a closed set of variants dispatched by
//! exhaustive matching:
//!
//! - [`ClassEntity`] - a concept with a name and description
//! - [`ClassProfileEntity`] - a specialization of one or more classes or
//!   class profiles, inheriting fields it does not override
//! - [`RelationshipEntity`] - a binary relationship with two [`RelationshipEnd`]s;
//!   exactly one end carries a non-null IRI, and that end is the *range*
//! - [`RelationshipProfileEntity`] - a specialization of relationships or
//!   relationship profiles
//! - [`GeneralizationEntity`] - a parent/child link between two entities
//!
//! Profile references (`profiling`) form a directed graph, not a tree: a
//! profile may profile several entities and chains may be cyclic. Resolution
//! of inherited fields lives in the engine crate; these types only carry the
//! raw declarations. Fields of profile entities are `Option`s: `Some` is an
//! explicit override owned by the profile, `None` inherits through the
//! profiling list.

use serde::{Deserialize, Serialize};

use crate::{cardinality::Cardinality, identifier::EntityId, language::LanguageString};

/// A semantic class: the basic concept of a vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntity {
    id: EntityId,
    iri: Option<String>,
    name: LanguageString,
    description: LanguageString,
}

impl ClassEntity {
    /// Create a new class with the given identifier and name.
    pub fn new(id: EntityId, name: LanguageString) -> Self {
        Self {
            id,
            iri: None,
            name,
            description: LanguageString::new(),
        }
    }

    /// Sets the class IRI.
    pub fn with_iri(mut self, iri: &str) -> Self {
        self.iri = Some(iri.to_owned());
        self
    }

    /// Sets the class description.
    pub fn with_description(mut self, description: LanguageString) -> Self {
        self.description = description;
        self
    }

    /// Get the class identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the class IRI, if set.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Borrow the class name.
    pub fn name(&self) -> &LanguageString {
        &self.name
    }

    /// Borrow the class description.
    pub fn description(&self) -> &LanguageString {
        &self.description
    }
}

/// A class profile: specializes one or more classes or class profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassProfileEntity {
    id: EntityId,
    iri: Option<String>,
    profiling: Vec<EntityId>,
    name: Option<LanguageString>,
    description: Option<LanguageString>,
    usage_note: Option<LanguageString>,
}

impl ClassProfileEntity {
    /// Create a new class profile over the given profiled entities.
    pub fn new(id: EntityId, profiling: Vec<EntityId>) -> Self {
        Self {
            id,
            iri: None,
            profiling,
            name: None,
            description: None,
            usage_note: None,
        }
    }

    /// Sets the profile IRI.
    pub fn with_iri(mut self, iri: &str) -> Self {
        self.iri = Some(iri.to_owned());
        self
    }

    /// Overrides the inherited name.
    pub fn with_name(mut self, name: LanguageString) -> Self {
        self.name = Some(name);
        self
    }

    /// Overrides the inherited description.
    pub fn with_description(mut self, description: LanguageString) -> Self {
        self.description = Some(description);
        self
    }

    /// Overrides the inherited usage note.
    pub fn with_usage_note(mut self, usage_note: LanguageString) -> Self {
        self.usage_note = Some(usage_note);
        self
    }

    /// Get the profile identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the profile IRI, if set.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// The entities this profile specializes, in declaration order.
    pub fn profiling(&self) -> &[EntityId] {
        &self.profiling
    }

    /// The explicit name override, if any.
    pub fn name(&self) -> Option<&LanguageString> {
        self.name.as_ref()
    }

    /// The explicit description override, if any.
    pub fn description(&self) -> Option<&LanguageString> {
        self.description.as_ref()
    }

    /// The explicit usage note override, if any.
    pub fn usage_note(&self) -> Option<&LanguageString> {
        self.usage_note.as_ref()
    }
}

/// One end of a semantic relationship.
///
/// The end whose `iri` is non-null is the relationship's range; the other
/// end is the domain. An end whose `concept` is `None` points at a literal
/// value rather than a class, which makes the relationship an *attribute*
/// of its domain concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEnd {
    concept: Option<EntityId>,
    iri: Option<String>,
    name: LanguageString,
    description: LanguageString,
    cardinality: Option<Cardinality>,
}

impl RelationshipEnd {
    /// Create an end pointing at a concept.
    pub fn to_concept(concept: EntityId) -> Self {
        Self {
            concept: Some(concept),
            ..Self::default()
        }
    }

    /// Create an end pointing at a literal value (no concept).
    pub fn to_literal() -> Self {
        Self::default()
    }

    /// Sets the end IRI, marking this end as the relationship's range.
    pub fn with_iri(mut self, iri: &str) -> Self {
        self.iri = Some(iri.to_owned());
        self
    }

    /// Sets the end name.
    pub fn with_name(mut self, name: LanguageString) -> Self {
        self.name = name;
        self
    }

    /// Sets the end cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    /// The concept this end points at, or `None` for a literal end.
    pub fn concept(&self) -> Option<EntityId> {
        self.concept
    }

    /// The end IRI, if set.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Borrow the end name.
    pub fn name(&self) -> &LanguageString {
        &self.name
    }

    /// Borrow the end description.
    pub fn description(&self) -> &LanguageString {
        &self.description
    }

    /// The end cardinality; `None` means unset, which is distinct from an
    /// explicitly unbounded pair.
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.cardinality
    }
}

/// A semantic relationship between two concepts (or a concept and a literal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEntity {
    id: EntityId,
    name: LanguageString,
    ends: [RelationshipEnd; 2],
}

impl RelationshipEntity {
    /// Create a new relationship with its two ends.
    pub fn new(id: EntityId, name: LanguageString, ends: [RelationshipEnd; 2]) -> Self {
        Self { id, name, ends }
    }

    /// Get the relationship identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Borrow the relationship name.
    pub fn name(&self) -> &LanguageString {
        &self.name
    }

    /// Borrow the relationship ends.
    pub fn ends(&self) -> &[RelationshipEnd; 2] {
        &self.ends
    }

    /// Determine which ends are the domain and the range.
    ///
    /// Exactly one end must carry a non-null IRI; that end is the range and
    /// the other the domain. Returns `(domain_index, range_index)`, or `None`
    /// when the rule is violated (no end or both ends carry an IRI).
    pub fn domain_range_indices(&self) -> Option<(usize, usize)> {
        match (self.ends[0].iri(), self.ends[1].iri()) {
            (None, Some(_)) => Some((0, 1)),
            (Some(_), None) => Some((1, 0)),
            _ => None,
        }
    }

    /// Returns `true` when this relationship is an attribute: its range end
    /// points at a literal value instead of a concept.
    pub fn is_attribute(&self) -> bool {
        self.domain_range_indices()
            .is_some_and(|(_, range)| self.ends[range].concept().is_none())
    }
}

/// One end of a relationship profile.
///
/// Ends correspond positionally to the profiled relationship's ends. All
/// fields are overrides; `None` inherits from the profiled entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipProfileEnd {
    concept: Option<EntityId>,
    name: Option<LanguageString>,
    description: Option<LanguageString>,
    cardinality: Option<Cardinality>,
}

impl RelationshipProfileEnd {
    /// Create an end inheriting everything from the profiled entity.
    pub fn inherited() -> Self {
        Self::default()
    }

    /// Overrides the concept this end points at.
    pub fn with_concept(mut self, concept: EntityId) -> Self {
        self.concept = Some(concept);
        self
    }

    /// Overrides the end name.
    pub fn with_name(mut self, name: LanguageString) -> Self {
        self.name = Some(name);
        self
    }

    /// Overrides the end cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    /// The explicit concept override, if any.
    pub fn concept(&self) -> Option<EntityId> {
        self.concept
    }

    /// The explicit name override, if any.
    pub fn name(&self) -> Option<&LanguageString> {
        self.name.as_ref()
    }

    /// The explicit description override, if any.
    pub fn description(&self) -> Option<&LanguageString> {
        self.description.as_ref()
    }

    /// The explicit cardinality override, if any.
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.cardinality
    }
}

/// A relationship profile: specializes one or more relationships or
/// relationship profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipProfileEntity {
    id: EntityId,
    profiling: Vec<EntityId>,
    name: Option<LanguageString>,
    usage_note: Option<LanguageString>,
    ends: [RelationshipProfileEnd; 2],
}

impl RelationshipProfileEntity {
    /// Create a new relationship profile over the given profiled entities.
    pub fn new(
        id: EntityId,
        profiling: Vec<EntityId>,
        ends: [RelationshipProfileEnd; 2],
    ) -> Self {
        Self {
            id,
            profiling,
            name: None,
            usage_note: None,
            ends,
        }
    }

    /// Overrides the inherited name.
    pub fn with_name(mut self, name: LanguageString) -> Self {
        self.name = Some(name);
        self
    }

    /// Overrides the inherited usage note.
    pub fn with_usage_note(mut self, usage_note: LanguageString) -> Self {
        self.usage_note = Some(usage_note);
        self
    }

    /// Get the profile identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The entities this profile specializes, in declaration order.
    pub fn profiling(&self) -> &[EntityId] {
        &self.profiling
    }

    /// The explicit name override, if any.
    pub fn name(&self) -> Option<&LanguageString> {
        self.name.as_ref()
    }

    /// The explicit usage note override, if any.
    pub fn usage_note(&self) -> Option<&LanguageString> {
        self.usage_note.as_ref()
    }

    /// Borrow the profile ends.
    pub fn ends(&self) -> &[RelationshipProfileEnd; 2] {
        &self.ends
    }
}

/// A generalization link: `child` specializes `parent`.
///
/// Generalizations do not participate in profile resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralizationEntity {
    id: EntityId,
    iri: Option<String>,
    parent: EntityId,
    child: EntityId,
}

impl GeneralizationEntity {
    /// Create a new generalization.
    pub fn new(id: EntityId, child: EntityId, parent: EntityId) -> Self {
        Self {
            id,
            iri: None,
            parent,
            child,
        }
    }

    /// Sets the generalization IRI.
    pub fn with_iri(mut self, iri: &str) -> Self {
        self.iri = Some(iri.to_owned());
        self
    }

    /// Get the generalization identifier.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The general (parent) entity.
    pub fn parent(&self) -> EntityId {
        self.parent
    }

    /// The specialized (child) entity.
    pub fn child(&self) -> EntityId {
        self.child
    }
}

/// The tagged union of entities a semantic model can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SemanticEntity {
    /// A class
    Class(ClassEntity),
    /// A class profile
    ClassProfile(ClassProfileEntity),
    /// A relationship
    Relationship(RelationshipEntity),
    /// A relationship profile
    RelationshipProfile(RelationshipProfileEntity),
    /// A generalization link
    Generalization(GeneralizationEntity),
}

impl SemanticEntity {
    /// Get the entity identifier, regardless of variant.
    pub fn id(&self) -> EntityId {
        match self {
            SemanticEntity::Class(class) => class.id(),
            SemanticEntity::ClassProfile(profile) => profile.id(),
            SemanticEntity::Relationship(relationship) => relationship.id(),
            SemanticEntity::RelationshipProfile(profile) => profile.id(),
            SemanticEntity::Generalization(generalization) => generalization.id(),
        }
    }

    /// The entities this entity profiles, empty for non-profile variants.
    pub fn profiling(&self) -> &[EntityId] {
        match self {
            SemanticEntity::ClassProfile(profile) => profile.profiling(),
            SemanticEntity::RelationshipProfile(profile) => profile.profiling(),
            _ => &[],
        }
    }

    /// Returns `true` for the profile variants.
    pub fn is_profile(&self) -> bool {
        matches!(
            self,
            SemanticEntity::ClassProfile(_) | SemanticEntity::RelationshipProfile(_)
        )
    }

    /// Returns `true` for classes and class profiles.
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            SemanticEntity::Class(_) | SemanticEntity::ClassProfile(_)
        )
    }

    /// Returns `true` for relationships and relationship profiles.
    pub fn is_relationship_like(&self) -> bool {
        matches!(
            self,
            SemanticEntity::Relationship(_) | SemanticEntity::RelationshipProfile(_)
        )
    }

    /// Borrow the class variant, if this is one.
    pub fn as_class(&self) -> Option<&ClassEntity> {
        match self {
            SemanticEntity::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Borrow the relationship variant, if this is one.
    pub fn as_relationship(&self) -> Option<&RelationshipEntity> {
        match self {
            SemanticEntity::Relationship(relationship) => Some(relationship),
            _ => None,
        }
    }

    /// Borrow the relationship profile variant, if this is one.
    pub fn as_relationship_profile(&self) -> Option<&RelationshipProfileEntity> {
        match self {
            SemanticEntity::RelationshipProfile(profile) => Some(profile),
            _ => None,
        }
    }

    /// Borrow the generalization variant, if this is one.
    pub fn as_generalization(&self) -> Option<&GeneralizationEntity> {
        match self {
            SemanticEntity::Generalization(generalization) => Some(generalization),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::cardinality::CardinalityBound;

    fn relationship_ends(domain: EntityId, range: EntityId) -> [RelationshipEnd; 2] {
        [
            RelationshipEnd::to_concept(domain),
            RelationshipEnd::to_concept(range).with_iri("https://example.com/worksFor"),
        ]
    }

    #[test]
    fn test_domain_range_from_iri_rule() {
        let domain = EntityId::new("person");
        let range = EntityId::new("organization");
        let relationship = RelationshipEntity::new(
            EntityId::new("works-for"),
            LanguageString::single("en", "works for"),
            relationship_ends(domain, range),
        );

        let (domain_index, range_index) = relationship.domain_range_indices().unwrap();
        assert_eq!(relationship.ends()[domain_index].concept(), Some(domain));
        assert_eq!(relationship.ends()[range_index].concept(), Some(range));
    }

    #[test]
    fn test_domain_range_reversed_ends() {
        let domain = EntityId::new("person");
        let range = EntityId::new("organization");
        let ends = [
            RelationshipEnd::to_concept(range).with_iri("https://example.com/worksFor"),
            RelationshipEnd::to_concept(domain),
        ];
        let relationship =
            RelationshipEntity::new(EntityId::new("works-for"), LanguageString::new(), ends);

        assert_eq!(relationship.domain_range_indices(), Some((1, 0)));
    }

    #[test]
    fn test_domain_range_invalid_when_iri_rule_broken() {
        let both = [
            RelationshipEnd::to_concept(EntityId::new("a")).with_iri("https://example.com/x"),
            RelationshipEnd::to_concept(EntityId::new("b")).with_iri("https://example.com/y"),
        ];
        let neither = [
            RelationshipEnd::to_concept(EntityId::new("a")),
            RelationshipEnd::to_concept(EntityId::new("b")),
        ];

        let broken_both =
            RelationshipEntity::new(EntityId::new("r1"), LanguageString::new(), both);
        let broken_neither =
            RelationshipEntity::new(EntityId::new("r2"), LanguageString::new(), neither);

        assert_eq!(broken_both.domain_range_indices(), None);
        assert_eq!(broken_neither.domain_range_indices(), None);
    }

    #[test]
    fn test_attribute_detection() {
        let attribute = RelationshipEntity::new(
            EntityId::new("age"),
            LanguageString::single("en", "age"),
            [
                RelationshipEnd::to_concept(EntityId::new("person"))
                    .with_cardinality(Cardinality::new(0, CardinalityBound::Unbounded).unwrap()),
                RelationshipEnd::to_literal().with_iri("https://example.com/age"),
            ],
        );
        assert!(attribute.is_attribute());

        let association = RelationshipEntity::new(
            EntityId::new("works-for"),
            LanguageString::new(),
            relationship_ends(EntityId::new("person"), EntityId::new("organization")),
        );
        assert!(!association.is_attribute());
    }

    #[test]
    fn test_profiling_access_through_enum() {
        let profiled = EntityId::new("person");
        let profile = SemanticEntity::ClassProfile(ClassProfileEntity::new(
            EntityId::new("employee"),
            vec![profiled],
        ));

        assert!(profile.is_profile());
        assert!(profile.is_class_like());
        assert_eq!(profile.profiling(), &[profiled]);

        let class = SemanticEntity::Class(ClassEntity::new(
            EntityId::new("person"),
            LanguageString::single("en", "Person"),
        ));
        assert!(class.profiling().is_empty());
        assert!(!class.is_profile());
    }

    #[test]
    fn test_serde_tagging() {
        let class = SemanticEntity::Class(ClassEntity::new(
            EntityId::new("person"),
            LanguageString::single("en", "Person"),
        ));
        let json = serde_json::to_value(&class).unwrap();
        assert_eq!(json["type"], "class");
    }
}
