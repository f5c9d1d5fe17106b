//! Error types for weft operations.
//!
//! This module provides the main error type [`WeftError`] covering the
//! failures an engine operation can surface to its caller. Conditions the
//! engine repairs on its own (a dangling edge outside an explicit create, a
//! cycle in a profile chain, stale sanitizer targets) are not errors: they
//! are self-healed and at most logged.

use thiserror::Error;

use weft_core::identifier::{EntityId, ModelId, VisualId};

/// The main error type for weft operations.
///
/// Every variant aborts the operation that produced it without partial
/// mutation; nothing in the engine is retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeftError {
    #[error("model `{0}` is not loaded")]
    MissingModel(ModelId),

    #[error("model `{0}` is already loaded")]
    DuplicateModel(ModelId),

    #[error("entity `{0}` was not found")]
    MissingEntity(EntityId),

    #[error("visual entity `{0}` was not found")]
    MissingVisualEntity(VisualId),

    #[error("visual entity `{0}` is not a node")]
    NotAVisualNode(VisualId),

    #[error("relationship `{0}` has no resolvable visual end")]
    InvalidRelationshipEnds(EntityId),

    #[error("entity `{0}` has an unexpected kind for this operation")]
    UnexpectedEntityKind(EntityId),

    #[error("no active visual model is set")]
    NoActiveVisualModel,
}
