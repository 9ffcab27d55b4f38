//! Relationship Metadata - relationship kinds and explicitly declared options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::{Key, Projection};
use crate::model::ClassRef;

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Many records reference one associated record through a foreign key
    ManyToOne,
    /// One record is referenced by many associated records
    OneToMany,
    /// A one-to-many restricted to a single associated record
    OneToOne,
    /// Many-to-many relationship through a join table
    ManyToMany,
}

impl RelationshipType {
    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Returns true if this relationship requires a join table
    pub fn requires_join_table(self) -> bool {
        matches!(self, Self::ManyToMany)
    }

    /// Returns true if the foreign key lives on the associated model's table
    pub fn key_on_associated(self) -> bool {
        matches!(self, Self::OneToMany | Self::OneToOne)
    }

    /// Kinds that are the structural inverse of this one
    pub fn reciprocal_types(self) -> &'static [RelationshipType] {
        match self {
            Self::ManyToOne => &[Self::OneToMany, Self::OneToOne],
            Self::OneToMany | Self::OneToOne => &[Self::ManyToOne],
            Self::ManyToMany => &[Self::ManyToMany],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManyToOne => "many_to_one",
            Self::OneToMany => "one_to_many",
            Self::OneToOne => "one_to_one",
            Self::ManyToMany => "many_to_many",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the options a relationship can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKey {
    /// A direct model type reference
    Class,
    /// A model name resolved through the class registry
    ClassName,
    Key,
    PrimaryKey,
    Reciprocal,
    Select,
    LeftKey,
    RightKey,
    JoinTable,
}

/// Options exactly as supplied when declaring a relationship
///
/// Nothing inferred is ever written back here, so [`contains`](Self::contains)
/// tells declared metadata apart from inferred metadata.
#[derive(Debug, Clone, Default)]
pub struct AssociationOptions {
    pub(crate) class: Option<ClassRef>,
    pub(crate) key: Option<Key>,
    pub(crate) primary_key: Option<Key>,
    pub(crate) reciprocal: Option<String>,
    pub(crate) select: Option<Projection>,
    pub(crate) left_key: Option<Key>,
    pub(crate) right_key: Option<Key>,
    pub(crate) join_table: Option<String>,
}

impl AssociationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The associated model, as a direct type reference or by name
    pub fn class(mut self, class: impl Into<ClassRef>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Foreign key column(s)
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Column(s) of the associated model referenced by the foreign key
    pub fn primary_key(mut self, key: impl Into<Key>) -> Self {
        self.primary_key = Some(key.into());
        self
    }

    /// Name of the inverse relationship, bypassing inference
    pub fn reciprocal(mut self, name: impl Into<String>) -> Self {
        self.reciprocal = Some(name.into());
        self
    }

    /// Columns selected by queries built from the relationship
    pub fn select(mut self, projection: Projection) -> Self {
        self.select = Some(projection);
        self
    }

    /// Join table column referencing the owning model
    pub fn left_key(mut self, key: impl Into<Key>) -> Self {
        self.left_key = Some(key.into());
        self
    }

    /// Join table column referencing the associated model
    pub fn right_key(mut self, key: impl Into<Key>) -> Self {
        self.right_key = Some(key.into());
        self
    }

    pub fn join_table(mut self, table: impl Into<String>) -> Self {
        self.join_table = Some(table.into());
        self
    }

    /// Whether the option was given explicitly
    pub fn contains(&self, option: OptionKey) -> bool {
        match option {
            OptionKey::Class => matches!(self.class, Some(ClassRef::Type(_))),
            OptionKey::ClassName => matches!(self.class, Some(ClassRef::Name(_))),
            OptionKey::Key => self.key.is_some(),
            OptionKey::PrimaryKey => self.primary_key.is_some(),
            OptionKey::Reciprocal => self.reciprocal.is_some(),
            OptionKey::Select => self.select.is_some(),
            OptionKey::LeftKey => self.left_key.is_some(),
            OptionKey::RightKey => self.right_key.is_some(),
            OptionKey::JoinTable => self.join_table.is_some(),
        }
    }

    /// Every option given explicitly, in declaration-independent order
    pub fn keys(&self) -> Vec<OptionKey> {
        const ALL: [OptionKey; 9] = [
            OptionKey::Class,
            OptionKey::ClassName,
            OptionKey::Key,
            OptionKey::PrimaryKey,
            OptionKey::Reciprocal,
            OptionKey::Select,
            OptionKey::LeftKey,
            OptionKey::RightKey,
            OptionKey::JoinTable,
        ];
        ALL.into_iter().filter(|option| self.contains(*option)).collect()
    }

    /// Check the options are consistent with the relationship kind
    pub(crate) fn validate(&self, kind: RelationshipType) -> Result<(), String> {
        let keys = [
            ("key", &self.key),
            ("primary_key", &self.primary_key),
            ("left_key", &self.left_key),
            ("right_key", &self.right_key),
        ];
        for (option, key) in keys {
            if key.as_ref().map_or(false, Key::is_empty) {
                return Err(format!(":{} must name at least one column", option));
            }
        }

        if let Some(ref table) = self.join_table {
            if table.trim().is_empty() {
                return Err(":join_table cannot be empty".to_string());
            }
        }

        if let Some(ClassRef::Name(ref name)) = self.class {
            if name.trim().is_empty() {
                return Err(":class cannot be an empty name".to_string());
            }
        }

        if kind.requires_join_table() {
            if self.key.is_some() {
                return Err(format!(":key is not supported by {} relationships", kind));
            }
        } else if let Some(option) = [
            (OptionKey::LeftKey, "left_key"),
            (OptionKey::RightKey, "right_key"),
            (OptionKey::JoinTable, "join_table"),
        ]
        .into_iter()
        .find(|(option, _)| self.contains(*option))
        .map(|(_, name)| name)
        {
            return Err(format!(":{} is only supported by many_to_many relationships", option));
        }

        if self.primary_key.is_some() && kind != RelationshipType::ManyToOne {
            return Err(format!(":primary_key is not supported by {} relationships", kind));
        }

        Ok(())
    }
}
