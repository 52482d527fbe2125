//! Metadata error types

/// Errors raised while registering or reading entity metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    /// No entity registered under this name
    UnknownEntity(String),
    /// An entity with the same name is already registered
    AlreadyRegistered(String),
    /// A relationship points at an entity that is not registered
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },
    /// The entity declares no primary key
    NoPrimaryKey(String),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::UnknownEntity(name) => write!(f, "Unknown entity: {}", name),
            MetadataError::AlreadyRegistered(name) => {
                write!(f, "Entity already registered: {}", name)
            }
            MetadataError::UnknownTarget {
                entity,
                relation,
                target,
            } => write!(
                f,
                "Relationship {}.{} targets unregistered entity {}",
                entity, relation, target
            ),
            MetadataError::NoPrimaryKey(name) => {
                write!(f, "Entity {} declares no primary key", name)
            }
        }
    }
}

impl std::error::Error for MetadataError {}
