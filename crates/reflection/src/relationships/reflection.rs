//! Association Reflection - the descriptor of one declared relationship
//!
//! Holds the options exactly as declared plus one memo cell per derived
//! field. A cell is either unset (not resolved yet) or set to its resolved
//! value, which for the reciprocal may itself be `None`. Once set, a cell
//! never changes; see [`resolution`](super::resolution) for how each field
//! is computed.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;

use super::metadata::{AssociationOptions, OptionKey, RelationshipType};
use crate::column::{Key, Projection};
use crate::error::ReflectionResult;
use crate::model::ModelType;
use crate::schema::Schema;

/// Memoized derived fields
#[derive(Debug, Default)]
pub(crate) struct Resolved {
    pub(crate) associated_class: OnceCell<Arc<ModelType>>,
    pub(crate) primary_key: OnceCell<Key>,
    pub(crate) key: OnceCell<Key>,
    pub(crate) left_key: OnceCell<Key>,
    pub(crate) right_key: OnceCell<Key>,
    pub(crate) join_table: OnceCell<String>,
    pub(crate) reciprocal: OnceCell<Option<String>>,
    pub(crate) select: OnceCell<Option<Projection>>,
}

/// Metadata of one declared relationship
pub struct AssociationReflection {
    kind: RelationshipType,
    name: String,
    owner: Arc<ModelType>,
    options: AssociationOptions,
    pub(crate) resolved: Resolved,
}

impl AssociationReflection {
    pub(crate) fn new(
        owner: Arc<ModelType>,
        kind: RelationshipType,
        name: String,
        options: AssociationOptions,
    ) -> Self {
        Self {
            kind,
            name,
            owner,
            options,
            resolved: Resolved::default(),
        }
    }

    pub fn kind(&self) -> RelationshipType {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model that declared the relationship
    pub fn owner(&self) -> &Arc<ModelType> {
        &self.owner
    }

    /// Options exactly as declared
    pub fn options(&self) -> &AssociationOptions {
        &self.options
    }

    /// Whether an option was given explicitly at declaration
    pub fn is_explicit(&self, option: OptionKey) -> bool {
        self.options.contains(option)
    }

    /// Every option given explicitly at declaration
    pub fn explicit_keys(&self) -> Vec<OptionKey> {
        self.options.keys()
    }

    /// Returns true if the relationship loads a collection
    pub fn returns_collection(&self) -> bool {
        self.kind.is_collection()
    }

    /// Kinds a reciprocal of this relationship may have
    pub fn reciprocal_types(&self) -> &'static [RelationshipType] {
        self.kind.reciprocal_types()
    }

    /// Resolve every field applicable to this kind of relationship
    pub fn resolve(&self, schema: &Schema) -> ReflectionResult<ResolvedAssociation> {
        let associated = self.associated_class(schema)?;
        let (key, primary_key, left_key, right_key, join_table) = match self.kind {
            RelationshipType::ManyToOne => (
                Some(self.key(schema)?.clone()),
                Some(self.primary_key(schema)?.clone()),
                None,
                None,
                None,
            ),
            RelationshipType::OneToMany | RelationshipType::OneToOne => {
                (Some(self.key(schema)?.clone()), None, None, None, None)
            }
            RelationshipType::ManyToMany => (
                None,
                None,
                Some(self.left_key(schema)?.clone()),
                Some(self.right_key(schema)?.clone()),
                Some(self.join_table(schema)?.to_string()),
            ),
        };

        Ok(ResolvedAssociation {
            kind: self.kind,
            name: self.name.clone(),
            owner: self.owner.name().to_string(),
            associated_model: associated.name().to_string(),
            associated_table: associated.table_name().to_string(),
            key,
            primary_key,
            left_key,
            right_key,
            join_table,
            reciprocal: self.reciprocal(schema)?.map(str::to_string),
            select: self.select(schema)?.cloned(),
            explicit: self.explicit_keys(),
        })
    }
}

impl fmt::Debug for AssociationReflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociationReflection")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("owner", &self.owner.name())
            .field("explicit", &self.options.keys())
            .finish()
    }
}

/// Fully resolved snapshot of a relationship, for query-building code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAssociation {
    pub kind: RelationshipType,
    pub name: String,
    pub owner: String,
    pub associated_model: String,
    pub associated_table: String,
    pub key: Option<Key>,
    pub primary_key: Option<Key>,
    pub left_key: Option<Key>,
    pub right_key: Option<Key>,
    pub join_table: Option<String>,
    pub reciprocal: Option<String>,
    pub select: Option<Projection>,
    pub explicit: Vec<OptionKey>,
}
