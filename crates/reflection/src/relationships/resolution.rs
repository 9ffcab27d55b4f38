//! Resolution of derived relationship metadata
//!
//! Each resolver returns the explicitly declared option when there is one,
//! and otherwise infers the value from naming conventions and the models and
//! relationships declared in the [`Schema`]. Inferred values are memoized on
//! the reflection the first time they are read.
//!
//! Reciprocals are inferred from the relationships declared on the
//! associated model *at the time of the first read*. Relationships declared
//! on the associated model afterwards do not change an already resolved
//! reciprocal; redeclare the relationship to pick them up.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::metadata::RelationshipType;
use super::reflection::AssociationReflection;
use crate::column::{Key, Projection};
use crate::error::{ReflectionError, ReflectionResult};
use crate::inflection::{classify, pluralize, singularize, underscore};
use crate::model::{ClassRef, ModelType};
use crate::schema::Schema;

/// Read a memo cell, computing and storing the value on first access
///
/// Concurrent first reads may both compute; the first stored value wins and
/// the others are dropped. Resolvers are deterministic, so they agree.
fn memoize<T>(
    cell: &OnceCell<T>,
    resolve: impl FnOnce() -> ReflectionResult<T>,
) -> ReflectionResult<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = resolve()?;
    Ok(cell.get_or_init(|| value))
}

impl AssociationReflection {
    /// The model on the other side of the relationship
    ///
    /// Uses the `class` option when given, otherwise the model named after
    /// the relationship (`par_parents` and `par_parent` both look up
    /// `ParParent`). Fails with [`ReflectionError::UnresolvedClass`] when no
    /// such model is registered.
    pub fn associated_class(&self, schema: &Schema) -> ReflectionResult<&Arc<ModelType>> {
        memoize(&self.resolved.associated_class, || {
            let class = match self.options().class {
                Some(ref class) => class.clone(),
                None => ClassRef::Name(classify(self.name())),
            };
            let model = schema.resolve_type(&class)?;
            tracing::debug!(
                "Resolved associated class of {}.{} to {}",
                self.owner().name(),
                self.name(),
                model.name()
            );
            Ok(model)
        })
    }

    /// Table of the associated model
    pub fn associated_table<'a>(&'a self, schema: &Schema) -> ReflectionResult<&'a str> {
        Ok(self.associated_class(schema)?.table_name())
    }

    /// Column(s) of the associated model the foreign key references
    ///
    /// Only many-to-one relationships have one. An explicit `primary_key`
    /// option is returned verbatim without resolving the associated model.
    pub fn primary_key(&self, schema: &Schema) -> ReflectionResult<&Key> {
        self.expect_kind(&[RelationshipType::ManyToOne], "primary key")?;
        if let Some(ref key) = self.options().primary_key {
            return Ok(key);
        }

        memoize(&self.resolved.primary_key, || {
            let associated = self.associated_class(schema)?;
            schema
                .primary_key_of(associated)
                .cloned()
                .ok_or_else(|| ReflectionError::NoPrimaryKey {
                    model: associated.name().to_string(),
                })
        })
    }

    /// Foreign key column(s)
    ///
    /// Defaults to `{name}_id` for many-to-one relationships and to
    /// `{owner}_id` for one-to-many and one-to-one relationships, following
    /// the configured foreign key convention.
    pub fn key(&self, schema: &Schema) -> ReflectionResult<&Key> {
        self.expect_kind(
            &[
                RelationshipType::ManyToOne,
                RelationshipType::OneToMany,
                RelationshipType::OneToOne,
            ],
            "foreign key",
        )?;
        if let Some(ref key) = self.options().key {
            return Ok(key);
        }

        memoize(&self.resolved.key, || {
            let base = if self.kind().key_on_associated() {
                underscore(self.owner().name())
            } else {
                self.name().to_string()
            };
            Ok(Key::simple(schema.config().foreign_key_for(&base)))
        })
    }

    /// Join table column referencing the owning model
    pub fn left_key(&self, schema: &Schema) -> ReflectionResult<&Key> {
        self.expect_kind(&[RelationshipType::ManyToMany], "left key")?;
        if let Some(ref key) = self.options().left_key {
            return Ok(key);
        }

        memoize(&self.resolved.left_key, || {
            let base = underscore(self.owner().name());
            Ok(Key::simple(schema.config().foreign_key_for(&base)))
        })
    }

    /// Join table column referencing the associated model
    pub fn right_key(&self, schema: &Schema) -> ReflectionResult<&Key> {
        self.expect_kind(&[RelationshipType::ManyToMany], "right key")?;
        if let Some(ref key) = self.options().right_key {
            return Ok(key);
        }

        memoize(&self.resolved.right_key, || {
            let base = singularize(self.name());
            Ok(Key::simple(schema.config().foreign_key_for(&base)))
        })
    }

    /// The join table of a many-to-many relationship
    ///
    /// Defaults to the pluralized model names of both sides, sorted and
    /// joined with `_`, so both directions agree on the same table.
    pub fn join_table(&self, schema: &Schema) -> ReflectionResult<&str> {
        self.expect_kind(&[RelationshipType::ManyToMany], "join table")?;
        if let Some(ref table) = self.options().join_table {
            return Ok(table);
        }

        memoize(&self.resolved.join_table, || {
            let associated = self.associated_class(schema)?;
            let mut tables = [
                pluralize(&underscore(self.owner().name())),
                pluralize(&underscore(associated.name())),
            ];
            tables.sort();
            Ok(tables.join("_"))
        })
        .map(String::as_str)
    }

    /// Default column projection for queries built from the relationship
    ///
    /// Many-to-many relationships select every column of the associated
    /// table to keep join table columns out of the result. Other kinds have
    /// no explicit projection (`None`).
    pub fn select(&self, schema: &Schema) -> ReflectionResult<Option<&Projection>> {
        if let Some(ref projection) = self.options().select {
            return Ok(Some(projection));
        }

        memoize(&self.resolved.select, || match self.kind() {
            RelationshipType::ManyToMany => {
                let table = self.associated_table(schema)?;
                Ok(Some(Projection::all_of(table)))
            }
            RelationshipType::ManyToOne | RelationshipType::OneToMany | RelationshipType::OneToOne => {
                Ok(None)
            }
        })
        .map(Option::as_ref)
    }

    /// Name of the inverse relationship on the associated model
    ///
    /// An explicit `reciprocal` option is returned verbatim. Otherwise the
    /// reciprocal is the single relationship on the associated model that
    /// points back at the owner with the inverse kind and agreeing keys.
    /// When no relationship, or more than one, qualifies the result is
    /// `None`: callers get no inverse rather than a wrong one.
    pub fn reciprocal(&self, schema: &Schema) -> ReflectionResult<Option<&str>> {
        if let Some(ref name) = self.options().reciprocal {
            return Ok(Some(name));
        }

        memoize(&self.resolved.reciprocal, || self.find_reciprocal(schema))
            .map(Option::as_deref)
    }

    fn find_reciprocal(&self, schema: &Schema) -> ReflectionResult<Option<String>> {
        let associated = self.associated_class(schema)?;
        let mut matches = Vec::new();

        for candidate in schema.relationships_of(associated) {
            if std::ptr::eq(Arc::as_ptr(&candidate), self)
                || self.is_redeclaration_of(&candidate)
                || !self.reciprocal_types().contains(&candidate.kind())
            {
                continue;
            }

            match candidate.associated_class(schema) {
                Ok(class) if **class == **self.owner() => {}
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(
                        "Skipping reciprocal candidate {}.{} of {}.{}: {}",
                        associated.name(),
                        candidate.name(),
                        self.owner().name(),
                        self.name(),
                        err
                    );
                    continue;
                }
            }

            if self.keys_agree(&candidate, schema)? {
                matches.push(candidate.name().to_string());
            }
        }

        let reciprocal = match matches.len() {
            1 => matches.pop(),
            0 => None,
            _ => {
                tracing::debug!(
                    "Ambiguous reciprocal for {}.{}: {} candidates on {} ({})",
                    self.owner().name(),
                    self.name(),
                    matches.len(),
                    associated.name(),
                    matches.join(", ")
                );
                None
            }
        };
        tracing::debug!(
            "Resolved reciprocal of {}.{} to {:?}",
            self.owner().name(),
            self.name(),
            reciprocal
        );
        Ok(reciprocal)
    }

    /// Whether `other` uses the same keys seen from the opposite side
    fn keys_agree(&self, other: &AssociationReflection, schema: &Schema) -> ReflectionResult<bool> {
        if self.kind() == RelationshipType::ManyToMany {
            Ok(self.left_key(schema)? == other.right_key(schema)?
                && self.right_key(schema)? == other.left_key(schema)?
                && self.join_table(schema)? == other.join_table(schema)?)
        } else {
            Ok(self.key(schema)? == other.key(schema)?)
        }
    }

    /// Same owner and name: `other` replaced this reflection, or the reverse
    fn is_redeclaration_of(&self, other: &AssociationReflection) -> bool {
        other.owner().id() == self.owner().id() && other.name() == self.name()
    }

    fn expect_kind(
        &self,
        kinds: &[RelationshipType],
        field: &'static str,
    ) -> ReflectionResult<()> {
        if kinds.contains(&self.kind()) {
            Ok(())
        } else {
            Err(ReflectionError::NotApplicable {
                relationship: self.name().to_string(),
                kind: self.kind(),
                field,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnRef;
    use crate::config::{ForeignKeyConvention, ReflectionConfig};
    use crate::model::ModelDef;
    use crate::relationships::{AssociationOptions, OptionKey};

    #[test]
    fn test_associated_class_from_name_convention() {
        let schema = Schema::new();
        let owner = schema.define_model("Owner");
        let par_parent = schema.define_model("ParParent");

        let one = schema
            .many_to_one(&owner, "par_parent", AssociationOptions::new())
            .unwrap();
        let many = schema
            .one_to_many(&owner, "par_parents", AssociationOptions::new())
            .unwrap();

        assert_eq!(one.associated_class(&schema).unwrap(), &par_parent);
        assert_eq!(many.associated_class(&schema).unwrap(), &par_parent);
        assert!(!one.is_explicit(OptionKey::ClassName));
    }

    #[test]
    fn test_associated_class_is_memoized() {
        let schema = Schema::new();
        let owner = schema.define_model("Owner");
        let first = schema.define_model("ParParent");
        let reflection = schema
            .many_to_one(&owner, "c", AssociationOptions::new().class("ParParent"))
            .unwrap();

        assert_eq!(reflection.associated_class(&schema).unwrap(), &first);

        // Re-registering the name does not affect an already resolved class
        let second = schema.define_model("ParParent");
        assert_eq!(reflection.associated_class(&schema).unwrap(), &first);
        assert_ne!(reflection.associated_class(&schema).unwrap(), &second);
    }

    #[test]
    fn test_default_keys() {
        let schema = Schema::new();
        let artist = schema.define_model("Artist");
        let album = schema.define_model("Album");
        let genre = schema.define_model("Genre");

        let artist_rel = schema
            .many_to_one(&album, "artist", AssociationOptions::new())
            .unwrap();
        let albums = schema
            .one_to_many(&artist, "albums", AssociationOptions::new())
            .unwrap();
        let genres = schema
            .many_to_many(&album, "genres", AssociationOptions::new())
            .unwrap();

        assert_eq!(artist_rel.key(&schema).unwrap(), &Key::simple("artist_id"));
        assert_eq!(albums.key(&schema).unwrap(), &Key::simple("artist_id"));
        assert_eq!(genres.left_key(&schema).unwrap(), &Key::simple("album_id"));
        assert_eq!(genres.right_key(&schema).unwrap(), &Key::simple("genre_id"));
        assert_eq!(genres.join_table(&schema).unwrap(), "albums_genres");
        assert_eq!(genres.associated_table(&schema).unwrap(), genre.table_name());
    }

    #[test]
    fn test_default_keys_follow_configured_convention() {
        let config = ReflectionConfig {
            foreign_key_convention: ForeignKeyConvention::CamelCase,
            ..ReflectionConfig::default()
        };
        let schema = Schema::with_config(config);
        let artist = schema.define_model("RecordLabel");
        schema.define_model("Album");

        let albums = schema
            .one_to_many(&artist, "albums", AssociationOptions::new())
            .unwrap();
        assert_eq!(albums.key(&schema).unwrap(), &Key::simple("recordLabelId"));
    }

    #[test]
    fn test_fields_not_applicable_to_kind() {
        let schema = Schema::new();
        let owner = schema.define_model("Owner");
        schema.define_model("ParParent");
        let many = schema
            .one_to_many(&owner, "par_parents", AssociationOptions::new())
            .unwrap();
        let many_many = schema
            .many_to_many(&owner, "linked_parents", AssociationOptions::new().class("ParParent"))
            .unwrap();

        assert!(matches!(
            many.primary_key(&schema),
            Err(ReflectionError::NotApplicable { field: "primary key", .. })
        ));
        assert!(matches!(
            many.join_table(&schema),
            Err(ReflectionError::NotApplicable { .. })
        ));
        assert!(matches!(
            many_many.key(&schema),
            Err(ReflectionError::NotApplicable { kind: RelationshipType::ManyToMany, .. })
        ));
    }

    #[test]
    fn test_no_primary_key() {
        let schema = Schema::new();
        let owner = schema.define_model("Owner");
        schema.define(ModelDef::new("AuditEntry").without_primary_key());

        let reflection = schema
            .many_to_one(&owner, "audit_entry", AssociationOptions::new())
            .unwrap();
        assert_eq!(
            reflection.primary_key(&schema).unwrap_err(),
            ReflectionError::NoPrimaryKey {
                model: "AuditEntry".to_string()
            }
        );

        // An explicit primary key never consults the associated model
        let explicit = schema
            .many_to_one(
                &owner,
                "missing",
                AssociationOptions::new().primary_key("blah__blah"),
            )
            .unwrap();
        assert_eq!(
            explicit.primary_key(&schema).unwrap().columns(),
            &[ColumnRef::qualified("blah", "blah")]
        );
    }

    #[test]
    fn test_self_referential_reciprocals() {
        let schema = Schema::new();
        let node = schema.define_model("Node");

        let parent = schema
            .many_to_one(&node, "parent", AssociationOptions::new().class(&node))
            .unwrap();
        let children = schema
            .one_to_many(
                &node,
                "children",
                AssociationOptions::new().class(&node).key("parent_id"),
            )
            .unwrap();

        assert_eq!(parent.reciprocal(&schema).unwrap(), Some("children"));
        assert_eq!(children.reciprocal(&schema).unwrap(), Some("parent"));
    }

    #[test]
    fn test_self_referential_many_to_many_skips_itself() {
        let schema = Schema::new();
        let node = schema.define_model("Node");

        let linked = schema
            .many_to_many(
                &node,
                "linked",
                AssociationOptions::new()
                    .class(&node)
                    .left_key("node_id")
                    .right_key("node_id")
                    .join_table("links"),
            )
            .unwrap();

        assert_eq!(linked.reciprocal(&schema).unwrap(), None);
    }

    #[test]
    fn test_unresolvable_candidate_is_skipped() {
        let schema = Schema::new();
        let artist = schema.define_model("Artist");
        let album = schema.define_model("Album");

        schema
            .one_to_many(&artist, "ghosts", AssociationOptions::new())
            .unwrap();
        schema
            .one_to_many(&artist, "albums", AssociationOptions::new())
            .unwrap();
        let artist_rel = schema
            .many_to_one(&album, "artist", AssociationOptions::new())
            .unwrap();

        assert_eq!(artist_rel.reciprocal(&schema).unwrap(), Some("albums"));
    }

    #[test]
    fn test_one_to_one_pairs_with_many_to_one() {
        let schema = Schema::new();
        let user = schema.define_model("User");
        let profile = schema.define_model("Profile");

        let user_rel = schema
            .many_to_one(&profile, "user", AssociationOptions::new())
            .unwrap();
        let profile_rel = schema
            .one_to_one(&user, "profile", AssociationOptions::new())
            .unwrap();

        assert!(!profile_rel.returns_collection());
        assert_eq!(user_rel.reciprocal(&schema).unwrap(), Some("profile"));
        assert_eq!(profile_rel.reciprocal(&schema).unwrap(), Some("user"));
    }

    #[test]
    fn test_unresolved_class_is_fatal_for_reciprocal() {
        let schema = Schema::new();
        let owner = schema.define_model("Owner");
        let reflection = schema
            .many_to_one(&owner, "nowhere", AssociationOptions::new())
            .unwrap();

        assert_eq!(
            reflection.reciprocal(&schema).unwrap_err(),
            ReflectionError::unresolved_class("Nowhere")
        );
    }

    #[test]
    fn test_associated_class_of_sibilant_plural() {
        let schema = Schema::new();
        let order = schema.define_model("Order");
        let status = schema.define_model("Status");
        assert_eq!(status.table_name(), "statuses");

        let statuses = schema
            .one_to_many(&order, "statuses", AssociationOptions::new())
            .unwrap();
        assert_eq!(statuses.associated_class(&schema).unwrap(), &status);

        let tagged = schema
            .many_to_many(&order, "statuses", AssociationOptions::new())
            .unwrap();
        assert_eq!(tagged.right_key(&schema).unwrap(), &Key::simple("status_id"));
        assert_eq!(tagged.join_table(&schema).unwrap(), "orders_statuses");
    }

    #[test]
    fn test_replaced_reflection_is_not_its_own_reciprocal() {
        let schema = Schema::new();
        let node = schema.define_model("Node");
        let symmetric = || {
            AssociationOptions::new()
                .class(&node)
                .left_key("node_id")
                .right_key("node_id")
                .join_table("links")
        };

        let first = schema.many_to_many(&node, "linked", symmetric()).unwrap();
        let second = schema.many_to_many(&node, "linked", symmetric()).unwrap();

        assert_eq!(first.reciprocal(&schema).unwrap(), None);
        assert_eq!(second.reciprocal(&schema).unwrap(), None);
    }
}
