//! Top-level error type for nested initialization.

use crate::entity::MetadataError;
use crate::executor::StoreError;
use crate::model::ConstructError;

/// Error returned by [`AutoInit::build`](crate::AutoInit::build) and the
/// [`RelationResolver`](crate::RelationResolver).
#[derive(Debug)]
pub enum AutoInitError {
    /// No session was supplied for the build
    MissingSession { entity: String },
    /// A many-to-one payload object lacks the identifying attribute
    MissingIdentifier { relation: String, attr: String },
    /// A relationship value does not have the shape its cardinality requires
    InvalidPayload {
        relation: String,
        expected: &'static str,
        found: String,
    },
    /// Entity metadata could not be read
    Metadata(MetadataError),
    /// The store failed or matched more than one row
    Store(StoreError),
    /// A constructor rejected the payload
    Construction(ConstructError),
}

impl AutoInitError {
    pub(crate) fn invalid_payload(
        relation: &str,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        AutoInitError::InvalidPayload {
            relation: relation.to_string(),
            expected,
            found: json_kind(found).to_string(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl std::fmt::Display for AutoInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoInitError::MissingSession { entity } => write!(
                f,
                "Session is required to initialize {} with auto-init",
                entity
            ),
            AutoInitError::MissingIdentifier { relation, attr } => {
                write!(f, "Expected '{}' to be provided for {}", attr, relation)
            }
            AutoInitError::InvalidPayload {
                relation,
                expected,
                found,
            } => write!(
                f,
                "Invalid payload for {}: expected {}, got {}",
                relation, expected, found
            ),
            AutoInitError::Metadata(e) => write!(f, "Metadata error: {}", e),
            AutoInitError::Store(e) => write!(f, "{}", e),
            AutoInitError::Construction(e) => write!(f, "Construction error: {}", e),
        }
    }
}

impl std::error::Error for AutoInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AutoInitError::Metadata(e) => Some(e),
            AutoInitError::Store(e) => Some(e),
            AutoInitError::Construction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MetadataError> for AutoInitError {
    fn from(err: MetadataError) -> Self {
        AutoInitError::Metadata(err)
    }
}

impl From<StoreError> for AutoInitError {
    fn from(err: StoreError) -> Self {
        AutoInitError::Store(err)
    }
}

impl From<ConstructError> for AutoInitError {
    fn from(err: ConstructError) -> Self {
        AutoInitError::Construction(err)
    }
}
