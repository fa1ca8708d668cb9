use thiserror::Error;

use crate::{archetype, Entity};

/// Recoverable failures reported by the storages.
///
/// Stale handles are an expected consequence of entity churn,
/// so they are reported to the caller instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The entity was released, was never issued by this store, or is a sentinel.
    #[error("entity {0} is not alive")]
    InvalidEntity(Entity),
    /// The archetype key refers to a row that has since been erased.
    #[error("archetype key {0:?} is stale")]
    InvalidKey(archetype::Key),
    /// The entity is alive but does not have the requested component.
    #[error("entity {entity} has no component of type `{component}`")]
    MissingComponent {
        /// The queried entity.
        entity:    Entity,
        /// The name of the missing component type.
        component: &'static str,
    },
}
