//! Model types and the class registry
//!
//! A [`ModelType`] describes one record type: its name, table and primary
//! key. The [`ModelRegistry`] maps model names to loaded model types so that
//! relationships can refer to their associated model by name.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::column::Key;
use crate::config::ReflectionConfig;
use crate::error::{ReflectionError, ReflectionResult};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a model type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A record type known to the reflection layer
///
/// Equality is identity: two model types are equal only if they share a
/// [`ModelId`], even when their names match.
#[derive(Debug)]
pub struct ModelType {
    id: ModelId,
    name: String,
    table_name: String,
    primary_key: Option<Key>,
}

impl ModelType {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The declared primary key, if any
    pub fn primary_key(&self) -> Option<&Key> {
        self.primary_key.as_ref()
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelType {}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Definition of a model type before it is built
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: String,
    table_name: Option<String>,
    primary_key: PrimaryKeyDef,
}

#[derive(Debug, Clone)]
enum PrimaryKeyDef {
    Default,
    Declared(Key),
    None,
}

impl ModelDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            primary_key: PrimaryKeyDef::Default,
        }
    }

    /// Override the conventional table name
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Declare the primary key
    pub fn primary_key(mut self, key: impl Into<Key>) -> Self {
        self.primary_key = PrimaryKeyDef::Declared(key.into());
        self
    }

    /// Declare that the model has no primary key
    pub fn without_primary_key(mut self) -> Self {
        self.primary_key = PrimaryKeyDef::None;
        self
    }

    /// Build the model type, filling unset parts from the configuration
    pub fn build(self, config: &ReflectionConfig) -> Arc<ModelType> {
        let table_name = self
            .table_name
            .unwrap_or_else(|| config.table_name_for(&self.name));
        let primary_key = match self.primary_key {
            PrimaryKeyDef::Declared(key) => Some(key),
            PrimaryKeyDef::Default => config.default_primary_key.as_deref().map(Key::simple),
            PrimaryKeyDef::None => None,
        };

        Arc::new(ModelType {
            id: ModelId::next(),
            name: self.name,
            table_name,
            primary_key,
        })
    }
}

/// Reference to a model: either a loaded type or a name to look up
#[derive(Debug, Clone)]
pub enum ClassRef {
    Type(Arc<ModelType>),
    Name(String),
}

impl ClassRef {
    /// The model name this reference designates
    pub fn name(&self) -> &str {
        match self {
            Self::Type(model) => model.name(),
            Self::Name(name) => name,
        }
    }
}

impl From<Arc<ModelType>> for ClassRef {
    fn from(model: Arc<ModelType>) -> Self {
        Self::Type(model)
    }
}

impl From<&Arc<ModelType>> for ClassRef {
    fn from(model: &Arc<ModelType>) -> Self {
        Self::Type(Arc::clone(model))
    }
}

impl From<&str> for ClassRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ClassRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Thread-safe registry of loaded model types, keyed by model name
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: DashMap<String, Arc<ModelType>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its name, replacing any model of the same name
    pub fn register(&self, model: Arc<ModelType>) -> Option<Arc<ModelType>> {
        let previous = self.models.insert(model.name().to_string(), model);
        if let Some(ref previous) = previous {
            tracing::debug!("Replaced registered model '{}'", previous.name());
        }
        previous
    }

    /// Remove a model by name
    pub fn unregister(&self, name: &str) -> Option<Arc<ModelType>> {
        self.models.remove(name).map(|(_, model)| model)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        self.models.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// All registered model names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Resolve a class reference to a loaded model type
    ///
    /// A direct type reference is returned unchanged without a lookup.
    pub fn resolve(&self, class: &ClassRef) -> ReflectionResult<Arc<ModelType>> {
        match class {
            ClassRef::Type(model) => Ok(Arc::clone(model)),
            ClassRef::Name(name) => self
                .get(name)
                .ok_or_else(|| ReflectionError::unresolved_class(name.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnRef;

    #[test]
    fn test_model_def_defaults() {
        let config = ReflectionConfig::default();
        let model = ModelDef::new("ParParent").build(&config);

        assert_eq!(model.name(), "ParParent");
        assert_eq!(model.table_name(), "par_parents");
        assert_eq!(model.primary_key(), Some(&Key::simple("id")));
    }

    #[test]
    fn test_model_def_overrides() {
        let config = ReflectionConfig::default();
        let model = ModelDef::new("Person")
            .table_name("people")
            .primary_key(Key::composite(["org_id", "person_no"]))
            .build(&config);
        assert_eq!(model.table_name(), "people");
        assert_eq!(
            model.primary_key().map(Key::columns),
            Some(&[ColumnRef::new("org_id"), ColumnRef::new("person_no")][..])
        );

        let keyless = ModelDef::new("AuditEntry").without_primary_key().build(&config);
        assert_eq!(keyless.primary_key(), None);
    }

    #[test]
    fn test_model_identity() {
        let config = ReflectionConfig::default();
        let first = ModelDef::new("ParParent").build(&config);
        let second = ModelDef::new("ParParent").build(&config);

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_registry_resolution() {
        let config = ReflectionConfig::default();
        let registry = ModelRegistry::new();
        let model = ModelDef::new("ParParent").build(&config);
        registry.register(Arc::clone(&model));

        let resolved = registry.resolve(&ClassRef::from("ParParent")).unwrap();
        assert!(Arc::ptr_eq(&resolved, &model));

        let err = registry.resolve(&ClassRef::from("Missing")).unwrap_err();
        assert_eq!(err, ReflectionError::unresolved_class("Missing"));
    }

    #[test]
    fn test_registry_direct_reference_skips_lookup() {
        let config = ReflectionConfig::default();
        let registry = ModelRegistry::new();
        let unregistered = ModelDef::new("Anonymous").build(&config);

        let resolved = registry.resolve(&ClassRef::from(&unregistered)).unwrap();
        assert!(Arc::ptr_eq(&resolved, &unregistered));
        assert!(!registry.contains("Anonymous"));
    }

    #[test]
    fn test_registry_replace_and_unregister() {
        let config = ReflectionConfig::default();
        let registry = ModelRegistry::new();
        let first = ModelDef::new("ParParent").build(&config);
        let second = ModelDef::new("ParParent").build(&config);

        assert!(registry.register(Arc::clone(&first)).is_none());
        let replaced = registry.register(Arc::clone(&second)).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));
        assert_eq!(registry.names(), vec!["ParParent".to_string()]);

        assert!(registry.unregister("ParParent").is_some());
        assert!(!registry.contains("ParParent"));
    }
}
