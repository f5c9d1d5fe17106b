//! Engine configuration.
//!
//! The engine never reads ambient state: everything that used to be a
//! module-level global (a translation function, the default model color,
//! language preferences) lives in [`EngineConfig`], constructed once at
//! application start and passed down to the functions that need it.

use weft_core::{color::Color, language::LanguageString};

/// Translation hook for the few engine-generated labels.
///
/// Receives a label key and returns the display text. The default is the
/// identity function; full localization belongs to the embedding
/// application.
pub type Translate = fn(&str) -> String;

fn identity_translate(key: &str) -> String {
    key.to_owned()
}

/// Configuration passed into engine operations.
///
/// # Examples
///
/// ```
/// use weft::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_language_preferences(vec!["en".into(), "cs".into()]);
/// assert_eq!(config.language_preferences(), ["en", "cs"]);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    translate: Translate,
    default_color: Color,
    language_preferences: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            translate: identity_translate,
            default_color: Color::new("#78a75a").expect("default color is a valid CSS color"),
            language_preferences: vec!["en".to_owned()],
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with the given hooks and preferences.
    pub fn new(
        translate: Translate,
        default_color: Color,
        language_preferences: Vec<String>,
    ) -> Self {
        Self {
            translate,
            default_color,
            language_preferences,
        }
    }

    /// Replaces the translation hook.
    pub fn with_translate(mut self, translate: Translate) -> Self {
        self.translate = translate;
        self
    }

    /// Replaces the default color used for new model visual metadata.
    pub fn with_default_color(mut self, default_color: Color) -> Self {
        self.default_color = default_color;
        self
    }

    /// Replaces the language preference order.
    pub fn with_language_preferences(mut self, language_preferences: Vec<String>) -> Self {
        self.language_preferences = language_preferences;
        self
    }

    /// Translates an engine-generated label key.
    pub fn translate(&self, key: &str) -> String {
        (self.translate)(key)
    }

    /// The color given to model visual metadata created on demand.
    pub fn default_color(&self) -> Color {
        self.default_color
    }

    /// Language preference order for display-string selection.
    pub fn language_preferences(&self) -> &[String] {
        &self.language_preferences
    }

    /// Selects a display string from a language-tagged value, falling back
    /// to the translated "untitled" label when the value carries no text.
    pub fn display_text(&self, value: &LanguageString) -> String {
        value
            .preferred(&self.language_preferences)
            .map(str::to_owned)
            .unwrap_or_else(|| self.translate("untitled"))
    }
}
