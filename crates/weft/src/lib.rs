//! Weft - entity aggregation and visual-model synchronization for semantic
//! vocabularies.
//!
//! The engine merges N independent semantic models, including chains of
//! profile entities that specialize other entities, into one consistent
//! aggregated view, and keeps a diagram (the visual model) consistent with
//! that view as entities are created, edited, duplicated, or deleted.
//!
//! # Pipeline
//!
//! ```text
//! Semantic models (N, independently edited)
//!     ↓ operations (create / modify / delete)
//! Entity Aggregator - profile resolution, incremental recompute
//!     ↓ batched change notifications (updated, removed)
//! Synchronization Engine - reroute / delete / fan-out visual edges
//!     ↓ batched store mutations
//! Visual Model Store - diagram entities + represented-entity index
//!     ↓ opportunistic
//! Sanitizer - consistency sweep over stale references
//! ```
//!
//! # Example
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use weft::{
//!     EngineConfig, EntityAggregator, SemanticModel, VisualModel,
//!     identifier::{EntityId, ModelId, VisualId},
//!     language::LanguageString,
//!     model::ModelOperation,
//!     semantic::{ClassEntity, SemanticEntity},
//!     sync,
//!     visual::Position,
//! };
//!
//! let mut model = SemanticModel::new(ModelId::new("vocabulary"));
//! model.execute_operation(ModelOperation::CreateEntity {
//!     entity: SemanticEntity::Class(ClassEntity::new(
//!         EntityId::new("person"),
//!         LanguageString::single("en", "Person"),
//!     )),
//! });
//!
//! let mut aggregator = EntityAggregator::new();
//! aggregator.add_model(model).unwrap();
//! aggregator.set_active_visual_model(Rc::new(RefCell::new(VisualModel::new(
//!     VisualId::new("diagram"),
//! ))));
//!
//! let config = EngineConfig::default();
//! let node = sync::add_class_to_visual_model(
//!     &aggregator,
//!     &config,
//!     EntityId::new("person"),
//!     Position::new(100.0, 100.0),
//! )
//! .unwrap();
//!
//! let visual = aggregator.active_visual_model().unwrap();
//! assert!(visual.borrow().get_visual_entity(node).is_some());
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod model;
pub mod profile;
pub mod sanitize;
pub mod store;
pub mod subscription;
pub mod sync;

pub use weft_core::{cardinality, color, identifier, language, semantic, visual};

pub use aggregator::{AggregatedEntity, AggregatorChange, AggregatorView, EntityAggregator};
pub use config::EngineConfig;
pub use error::WeftError;
pub use model::SemanticModel;
pub use sanitize::{SanitizeReport, sanitize_visual_model};
pub use store::VisualModel;
pub use subscription::Subscription;
