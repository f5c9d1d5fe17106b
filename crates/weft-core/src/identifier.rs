//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the generic [`Id`] type together with the kind-typed
//! aliases [`EntityId`], [`ModelId`] and [`VisualId`]. Identifiers for semantic
//! entities, semantic models, and diagram-local visual entities live in
//! distinct type-level namespaces, so mixing them up is a compile error even
//! though all of them share one interner.

use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::{Mutex, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> &'static Mutex<DefaultStringInterner> {
    INTERNER.get_or_init(|| Mutex::new(DefaultStringInterner::new()))
}

/// Marker kinds for the type-level identifier namespaces.
pub mod kind {
    /// Marker for identifiers of semantic entities.
    pub enum Entity {}
    /// Marker for identifiers of semantic models.
    pub enum Model {}
    /// Marker for diagram-local identifiers of visual entities.
    pub enum Visual {}
}

/// Identifier of a semantic entity within a loaded model.
pub type EntityId = Id<kind::Entity>;
/// Identifier of a semantic model.
pub type ModelId = Id<kind::Model>;
/// Diagram-local identifier of a visual entity.
pub type VisualId = Id<kind::Visual>;

/// Efficient kind-typed identifier using string interning.
///
/// This type provides cheap copies, equality, and hashing of string
/// identifiers through string interning. The `K` parameter is a zero-sized
/// marker from [`kind`] selecting the identifier namespace.
///
/// # Examples
///
/// ```
/// use weft_core::identifier::{EntityId, ModelId};
///
/// let person = EntityId::new("person");
/// let model = ModelId::new("vocabulary");
///
/// assert_eq!(person, "person");
/// assert_eq!(model.to_string(), "vocabulary");
/// ```
pub struct Id<K>(DefaultSymbol, PhantomData<fn() -> K>);

impl<K> Id<K> {
    /// Creates an `Id` from `&str`.
    pub fn new(name: &str) -> Self {
        let mut interner = interner().lock().expect("Failed to acquire interner lock");
        let symbol = interner.get_or_intern(name);
        Self(symbol, PhantomData)
    }

    /// Creates an internal `Id` identifier without a caller-chosen string.
    ///
    /// # Arguments
    ///
    /// * `idx` - A unique index used to generate the anonymous identifier.
    pub fn from_anonymous(idx: usize) -> Self {
        let name = format!("__{idx}");
        Self::new(&name)
    }

    /// Creates a nested ID by combining this ID and a child ID with a '::' separator.
    ///
    /// Used to mint diagram-local identifiers scoped under the diagram's own
    /// identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use weft_core::identifier::VisualId;
    ///
    /// let diagram = VisualId::new("diagram");
    /// let node = diagram.create_nested(VisualId::from_anonymous(0));
    /// assert_eq!(node, "diagram::__0");
    /// ```
    pub fn create_nested(&self, child_id: Id<K>) -> Self {
        let mut interner = interner().lock().expect("Failed to acquire interner lock");
        let parent_str = interner
            .resolve(self.0)
            .expect("Parent ID should exist in interner");
        let child_str = interner
            .resolve(child_id.0)
            .expect("Child ID should exist in interner");
        let nested_name = format!("{parent_str}::{child_str}");
        let symbol = interner.get_or_intern(&nested_name);
        Self(symbol, PhantomData)
    }
}

// Manual trait impls so that `Id<K>` is `Copy`/`Eq`/`Hash` without requiring
// any bounds on the marker kind.

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Id<K> {}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K> Eq for Id<K> {}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<K> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl<K> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner().lock().expect("Failed to acquire interner lock");
        let str_value = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        write!(f, "{str_value}")
    }
}

impl<K> std::str::FromStr for Id<K> {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl<K> From<&str> for Id<K> {
    /// Creates an `Id` from a string slice.
    ///
    /// This is a convenience implementation that calls `Id::new`.
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl<K> PartialEq<str> for Id<K> {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        let interner = interner().lock().expect("Failed to acquire interner lock");
        let self_str = interner
            .resolve(self.0)
            .expect("Symbol should exist in interner");
        self_str == other
    }
}

impl<K> PartialEq<&str> for Id<K> {
    /// Allows direct comparison with string references: `id == &string`
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl<K> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, K> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = EntityId::new("person");
        let id2 = EntityId::new("person");
        let id3 = EntityId::new("organization");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "person");
    }

    #[test]
    fn test_kinds_are_distinct_types() {
        // Equal strings intern to equal symbols, but the kinds keep the
        // identifiers in separate type namespaces.
        let entity = EntityId::new("shared-name");
        let model = ModelId::new("shared-name");

        assert_eq!(entity.to_string(), model.to_string());
        // `entity == model` does not compile, which is the point.
    }

    #[test]
    fn test_from_anonymous() {
        let id1 = VisualId::from_anonymous(0);
        let id2 = VisualId::from_anonymous(1);
        let id3 = VisualId::from_anonymous(0);

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
    }

    #[test]
    fn test_create_nested() {
        let diagram = VisualId::new("diagram");
        let first = diagram.create_nested(VisualId::from_anonymous(0));
        let second = diagram.create_nested(VisualId::from_anonymous(1));

        assert_ne!(first, second);
        assert_eq!(first, "diagram::__0");
        assert_eq!(second, "diagram::__1");
    }

    #[test]
    fn test_display_trait() {
        let id = EntityId::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
    }

    #[test]
    fn test_from_trait() {
        let id1: EntityId = "test_string".into();
        let id2 = EntityId::new("test_string");

        assert_eq!(id1, id2);
        assert_eq!(id1, "test_string");
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let id1 = EntityId::new("key1");
        let id2 = EntityId::new("key1");
        let id3 = EntityId::new("key2");

        let mut map = HashMap::new();
        map.insert(id1, "value1");
        map.insert(id3, "value2");

        assert_eq!(map.get(&id2), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_copy_trait() {
        let id1 = ModelId::new("copy_test");
        let id2 = id1;
        let id3 = id1;

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert_eq!(id2, "copy_test");
    }

    #[test]
    fn test_serde_round_trip() {
        let id = EntityId::new("serialized");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serialized\"");

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
