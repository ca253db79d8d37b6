//! Scene error taxonomy
//!
//! Every condition here is non-fatal and locally recoverable: the failing
//! operation logs through the scene's channel, fires a structured record on
//! the scene's `warn`/`error` event, and returns a sentinel to its caller.
//! Nothing in this module ever unwinds past the call boundary; a broken
//! attachment leaves a partially-detached scene, not a dead process.

use crate::foundation::logging::LogLevel;

/// Recoverable scene-graph failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Fallback attachment requested but no default is registered for the role.
    #[error("no default component registered for role '{role}'")]
    MissingDefaultComponent {
        /// Role the attachment targeted.
        role: String,
    },

    /// An id did not resolve in the scene registry.
    #[error("component '{id}' not found in scene registry")]
    ComponentNotFound {
        /// The unresolved id.
        id: String,
    },

    /// The child belongs to a different scene than the parent.
    #[error("component '{id}' belongs to a different scene")]
    CrossSceneAttachment {
        /// Id of the foreign component.
        id: String,
    },

    /// Clone was attempted on a node that is already destroyed.
    #[error("cannot clone destroyed component '{id}'")]
    DestroyedComponentClone {
        /// Id of the destroyed source.
        id: String,
    },

    /// A setter received a value outside its domain; the value was coerced.
    #[error("invalid value {given} for property '{property}', coerced to {coerced}")]
    InvalidPropertyValue {
        /// Property name the setter guards.
        property: String,
        /// Rejected input.
        given: f64,
        /// Value actually stored.
        coerced: f64,
    },

    /// A caller-supplied id collides with an existing registry entry.
    #[error("id '{id}' is already registered in this scene")]
    DuplicateId {
        /// The colliding id.
        id: String,
    },

    /// A serialized node carried a type tag no kind maps to.
    #[error("unknown node type tag '{tag}'")]
    UnknownNodeType {
        /// The unrecognized tag.
        tag: String,
    },
}

impl SceneError {
    /// Stable machine-readable code carried in the structured event payload.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDefaultComponent { .. } => "missing_default_component",
            Self::ComponentNotFound { .. } => "component_not_found",
            Self::CrossSceneAttachment { .. } => "cross_scene_attachment",
            Self::DestroyedComponentClone { .. } => "destroyed_component_clone",
            Self::InvalidPropertyValue { .. } => "invalid_property_value",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::UnknownNodeType { .. } => "unknown_node_type",
        }
    }

    /// Channel severity: property coercion is a warning, everything else an
    /// aborted operation reported on the error channel.
    pub fn level(&self) -> LogLevel {
        match self {
            Self::InvalidPropertyValue { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offender() {
        let err = SceneError::ComponentNotFound { id: "cam1".into() };
        assert_eq!(err.to_string(), "component 'cam1' not found in scene registry");
    }

    #[test]
    fn coercion_is_a_warning_the_rest_are_errors() {
        let warn = SceneError::InvalidPropertyValue {
            property: "radius".into(),
            given: -5.0,
            coerced: 5.0,
        };
        assert_eq!(warn.level(), LogLevel::Warn);
        assert_eq!(warn.code(), "invalid_property_value");

        let err = SceneError::CrossSceneAttachment { id: "x".into() };
        assert_eq!(err.level(), LogLevel::Error);
    }
}
