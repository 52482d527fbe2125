//! Error type for entity construction.

/// Raised when an entity's constructor rejects the fields it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructError {
    /// Payload names a field the entity does not declare
    UnexpectedField { entity: String, field: String },
    /// A required column is absent from the payload
    MissingField { entity: String, field: String },
    /// Payload carries data for a relationship; related payloads are only
    /// resolved one level deep
    NestedRelationship { entity: String, relation: String },
    /// The entity's own constructor hook refused the payload
    Rejected { entity: String, reason: String },
}

impl ConstructError {
    pub fn rejected(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        ConstructError::Rejected {
            entity: entity.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ConstructError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstructError::UnexpectedField { entity, field } => {
                write!(f, "{} got an unexpected field: {}", entity, field)
            }
            ConstructError::MissingField { entity, field } => {
                write!(f, "{} is missing required field: {}", entity, field)
            }
            ConstructError::NestedRelationship { entity, relation } => write!(
                f,
                "{} cannot construct relationship {} from a nested payload",
                entity, relation
            ),
            ConstructError::Rejected { entity, reason } => {
                write!(f, "{} rejected payload: {}", entity, reason)
            }
        }
    }
}

impl std::error::Error for ConstructError {}
