//! Schema - models, relationships and conventions in one place
//!
//! A [`Schema`] owns a class registry, a relationship registry and the
//! configuration used for inference. Applications normally declare
//! everything on the process-wide [`global`] schema during startup; tests
//! build their own isolated instances.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::column::Key;
use crate::config::{ConfigError, ReflectionConfig};
use crate::error::{ReflectionError, ReflectionResult};
use crate::model::{ClassRef, ModelDef, ModelRegistry, ModelType};
use crate::relationships::{
    AssociationOptions, AssociationReflection, RelationshipRegistry, RelationshipType,
    ResolvedAssociation,
};

#[derive(Debug, Default)]
pub struct Schema {
    config: ReflectionConfig,
    models: ModelRegistry,
    relationships: RelationshipRegistry,
}

impl Schema {
    /// Create an empty schema with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReflectionConfig) -> Self {
        Self {
            config,
            models: ModelRegistry::new(),
            relationships: RelationshipRegistry::new(),
        }
    }

    pub fn config(&self) -> &ReflectionConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn relationships(&self) -> &RelationshipRegistry {
        &self.relationships
    }

    /// Build a model type with conventional table and primary key, and register it
    pub fn define_model(&self, name: impl Into<String>) -> Arc<ModelType> {
        self.define(ModelDef::new(name))
    }

    /// Build a model type from a definition and register it
    pub fn define(&self, def: ModelDef) -> Arc<ModelType> {
        let model = self.build_model(def);
        self.register_model(Arc::clone(&model));
        model
    }

    /// Build a model type without registering it
    ///
    /// Unregistered models can still be referenced directly through the
    /// `class` option, but never by name.
    pub fn build_model(&self, def: ModelDef) -> Arc<ModelType> {
        def.build(&self.config)
    }

    pub fn register_model(&self, model: Arc<ModelType>) {
        tracing::debug!("Registering model '{}' (table '{}')", model.name(), model.table_name());
        self.models.register(model);
    }

    /// Resolve a class reference to a loaded model type
    pub fn resolve_type(&self, class: &ClassRef) -> ReflectionResult<Arc<ModelType>> {
        self.models.resolve(class)
    }

    pub fn primary_key_of<'a>(&self, model: &'a ModelType) -> Option<&'a Key> {
        model.primary_key()
    }

    /// Relationships currently declared on a model, in declaration order
    pub fn relationships_of(&self, model: &ModelType) -> Vec<Arc<AssociationReflection>> {
        self.relationships.all_for_model(model.id())
    }

    /// Declare a relationship on `owner`
    ///
    /// Nothing is resolved here: an unknown associated model only surfaces
    /// when the relationship's associated class is first read.
    pub fn declare(
        &self,
        owner: &Arc<ModelType>,
        kind: RelationshipType,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ReflectionResult<Arc<AssociationReflection>> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReflectionError::invalid_declaration(
                owner.name(),
                &name,
                "relationship name cannot be empty",
            ));
        }
        options
            .validate(kind)
            .map_err(|reason| ReflectionError::invalid_declaration(owner.name(), &name, reason))?;

        let reflection = Arc::new(AssociationReflection::new(
            Arc::clone(owner),
            kind,
            name,
            options,
        ));
        if self.relationships.register(Arc::clone(&reflection)).is_some() {
            tracing::debug!("Redeclared relationship {}.{}", owner.name(), reflection.name());
        }
        tracing::debug!(
            "Declared {} relationship {}.{} with options {:?}",
            kind,
            owner.name(),
            reflection.name(),
            reflection.explicit_keys()
        );

        Ok(reflection)
    }

    pub fn many_to_one(
        &self,
        owner: &Arc<ModelType>,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ReflectionResult<Arc<AssociationReflection>> {
        self.declare(owner, RelationshipType::ManyToOne, name, options)
    }

    pub fn one_to_many(
        &self,
        owner: &Arc<ModelType>,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ReflectionResult<Arc<AssociationReflection>> {
        self.declare(owner, RelationshipType::OneToMany, name, options)
    }

    pub fn one_to_one(
        &self,
        owner: &Arc<ModelType>,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ReflectionResult<Arc<AssociationReflection>> {
        self.declare(owner, RelationshipType::OneToOne, name, options)
    }

    pub fn many_to_many(
        &self,
        owner: &Arc<ModelType>,
        name: impl Into<String>,
        options: AssociationOptions,
    ) -> ReflectionResult<Arc<AssociationReflection>> {
        self.declare(owner, RelationshipType::ManyToMany, name, options)
    }

    /// Look up a declared relationship by name
    pub fn lookup(&self, owner: &ModelType, name: &str) -> ReflectionResult<Arc<AssociationReflection>> {
        self.relationships
            .get(owner.id(), name)
            .ok_or_else(|| ReflectionError::unknown_relationship(owner.name(), name))
    }

    /// Resolve every relationship declared on a model
    pub fn resolve_all(&self, owner: &ModelType) -> ReflectionResult<Vec<ResolvedAssociation>> {
        self.relationships_of(owner)
            .iter()
            .map(|reflection| reflection.resolve(self))
            .collect()
    }

    /// Check that every declared relationship points at a registered model
    pub fn verify(&self) -> ReflectionResult<()> {
        for reflection in self.relationships.all() {
            reflection.associated_class(self)?;
        }
        Ok(())
    }
}

static GLOBAL_SCHEMA: OnceCell<Schema> = OnceCell::new();

/// Get the process-wide schema
///
/// Initialized on first use from the `ELIF_REFLECTION_*` environment
/// variables unless [`init_global`] ran first. An invalid environment
/// configuration is logged and replaced by the defaults; use [`try_global`]
/// to get the configuration error instead.
pub fn global() -> &'static Schema {
    GLOBAL_SCHEMA.get_or_init(|| {
        let config = ReflectionConfig::from_env().unwrap_or_else(|err| {
            tracing::warn!("Invalid reflection configuration, using defaults: {}", err);
            ReflectionConfig::default()
        });
        Schema::with_config(config)
    })
}

/// Get the process-wide schema, failing on an invalid environment configuration
///
/// Nothing is initialized when the configuration is rejected, so a later
/// call retries with the current environment.
pub fn try_global() -> ReflectionResult<&'static Schema> {
    GLOBAL_SCHEMA.get_or_try_init(|| -> ReflectionResult<Schema> {
        Ok(Schema::with_config(ReflectionConfig::from_env()?))
    })
}

/// Initialize the process-wide schema with an explicit configuration
pub fn init_global(config: ReflectionConfig) -> ReflectionResult<&'static Schema> {
    config.validate()?;
    GLOBAL_SCHEMA
        .set(Schema::with_config(config))
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(global())
}
