//! Language-tagged string values.
//!
//! Vocabulary entities carry names, descriptions and usage notes in several
//! languages at once. [`LanguageString`] stores such a value as an ordered
//! map from language tag to text and supports preference-ordered selection
//! of a display string. The engine never translates text; it only selects
//! among the languages an entity already carries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A text value tagged by language.
///
/// Entries keep insertion order, so iterating a value yields languages in
/// declaration order.
///
/// # Examples
///
/// ```
/// use weft_core::language::LanguageString;
///
/// let name = LanguageString::from_pairs(&[("en", "Person"), ("cs", "Osoba")]);
/// assert_eq!(name.get("cs"), Some("Osoba"));
/// assert_eq!(name.preferred(&["de".into(), "cs".into()]), Some("Osoba"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageString(IndexMap<String, String>);

impl LanguageString {
    /// Creates an empty language string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a value with a single language entry.
    pub fn single(language: &str, text: &str) -> Self {
        let mut value = Self::new();
        value.set(language, text);
        value
    }

    /// Creates a value from `(language, text)` pairs, keeping their order.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut value = Self::new();
        for (language, text) in pairs {
            value.set(language, text);
        }
        value
    }

    /// Sets the text for a language, replacing any previous entry.
    pub fn set(&mut self, language: &str, text: &str) {
        self.0.insert(language.to_owned(), text.to_owned());
    }

    /// Returns the text for the given language, if present.
    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    /// Selects a display string by preference order.
    ///
    /// The first preference with a non-empty entry wins; when no preference
    /// matches, the first non-empty entry in declaration order is returned.
    pub fn preferred(&self, preferences: &[String]) -> Option<&str> {
        for language in preferences {
            match self.get(language) {
                Some(text) if !text.is_empty() => return Some(text),
                _ => {}
            }
        }
        self.0
            .values()
            .find(|text| !text.is_empty())
            .map(String::as_str)
    }

    /// Returns `true` when the value carries no usable text.
    ///
    /// Entries whose text is empty count as absent, so `{"en": ""}` is empty.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|text| text.is_empty())
    }

    /// Iterates over `(language, text)` entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(language, text)| (language.as_str(), text.as_str()))
    }
}
