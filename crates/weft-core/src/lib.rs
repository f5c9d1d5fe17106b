//! Weft Core Types and Definitions
//!
//! This crate provides the foundational types for the weft vocabulary-diagram
//! engine. It includes:
//!
//! - **Identifiers**: Efficient string-interned, kind-typed identifiers
//!   ([`identifier::EntityId`], [`identifier::ModelId`], [`identifier::VisualId`])
//! - **Language strings**: Language-tagged text values with preference-ordered
//!   selection ([`language::LanguageString`])
//! - **Cardinalities**: Bounded/unbounded multiplicity pairs ([`cardinality`] module)
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Semantic**: The tagged union of semantic vocabulary entities ([`semantic`] module)
//! - **Visual**: The tagged union of diagram entities ([`visual`] module)

pub mod cardinality;
pub mod color;
pub mod identifier;
pub mod language;
pub mod semantic;
pub mod visual;
