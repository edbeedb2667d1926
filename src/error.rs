//! Error taxonomy for the reflection, archetype, and storage layers.
//!
//! Every failure is surfaced as a recoverable `Result`. Registration and
//! lookup errors still indicate programmer mistakes (a typo or a
//! registration-order bug), but callers decide whether to propagate or abort;
//! nothing is written to persistent storage once an error is raised.

use thiserror::Error;

/// Errors raised by the type registry and the generic serializer.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// A type name was looked up (or referenced by a field or base link)
    /// without ever being declared.
    #[error("type '{name}' is not registered")]
    UnregisteredType { name: String },

    /// The same type name was declared twice with a different shape.
    /// Re-declaring an identical shape is an idempotent no-op.
    #[error("type '{name}' is already registered with a different shape")]
    DoubleRegistration { name: String },

    /// Two distinct type names hash to the same identity value.
    #[error("type hash collision between '{first}' and '{second}'")]
    HashCollision { first: String, second: String },

    /// The base-type / field-type graph contains a cycle, so descriptors
    /// cannot be resolved in dependency order.
    #[error("type dependency cycle involving '{name}'")]
    DependencyCycle { name: String },

    /// A field name was declared twice on the same type. Duplicates across
    /// inheritance levels are allowed; duplicates among a type's own
    /// declared fields are not.
    #[error("field '{field}' is declared twice on type '{owner}'")]
    DuplicateField { owner: String, field: String },

    /// Default serialization was asked to walk a type that reflects no
    /// fields and carries no custom codec. This usually means a leaf
    /// registration is missing.
    #[error("type '{name}' has no reflected fields and no custom codec")]
    NoReflectedFields { name: String },

    /// A required field's key is absent from the input document.
    #[error("required field '{owner}.{field}' is missing from the document")]
    MissingField { owner: String, field: String },

    /// A value handed to the reflection layer does not have the concrete
    /// type its descriptor promises.
    #[error("value is not an instance of '{expected}'")]
    TypeMismatch { expected: String },

    /// The document node has the wrong shape for the type being decoded
    /// (for example an array where an object was expected), or a leaf
    /// codec rejected its input.
    #[error("malformed document for '{name}': {detail}")]
    DocumentShape { name: String, detail: String },
}

/// Errors raised by the archetype layer.
#[derive(Debug, Error)]
pub enum ArchetypeError {
    /// No archetype with this name is saved in the manager.
    #[error("archetype '{name}' is not saved")]
    NotFound { name: String },

    /// The component host has no way to construct this component type.
    #[error("component type '{name}' is unknown to the host")]
    UnknownComponentType { name: String },

    #[error(transparent)]
    Reflect(#[from] ReflectError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the filesystem collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named file does not exist in the given category.
    #[error("file '{name}' not found in category '{category}'")]
    NotFound { name: String, category: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be encoded to / decoded from a document.
    #[error("document codec error: {detail}")]
    Codec { detail: String },
}
