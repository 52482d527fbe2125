//! Relationship kinds and descriptors.

/// Direction of a relationship, seen from the declaring entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The related rows point back at this entity
    OneToMany,
    /// This entity points at one related row
    ManyToOne,
    /// Linked through an association table
    ManyToMany,
}

/// Declared relationship: direction, cardinality and related entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipDescriptor {
    pub kind: RelationKind,
    /// Whether the relationship holds a collection rather than one instance
    pub uselist: bool,
    /// Name of the related entity
    pub target: &'static str,
}

impl RelationshipDescriptor {
    pub fn new(kind: RelationKind, uselist: bool, target: &'static str) -> Self {
        Self {
            kind,
            uselist,
            target,
        }
    }

    /// One-to-many holding a collection.
    pub fn one_to_many(target: &'static str) -> Self {
        Self::new(RelationKind::OneToMany, true, target)
    }

    /// One-to-many holding a single instance (one-to-one from the parent side).
    pub fn one_to_one(target: &'static str) -> Self {
        Self::new(RelationKind::OneToMany, false, target)
    }

    pub fn many_to_one(target: &'static str) -> Self {
        Self::new(RelationKind::ManyToOne, false, target)
    }

    pub fn many_to_many(target: &'static str) -> Self {
        Self::new(RelationKind::ManyToMany, true, target)
    }
}
