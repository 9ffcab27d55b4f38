//! Relationship Registry - per-model storage of declared relationships

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use super::metadata::RelationshipType;
use super::reflection::AssociationReflection;
use crate::model::ModelId;

/// Thread-safe relationship registry, keyed by owning model
///
/// Relationships of one model keep their declaration order. Readers get
/// cloned `Arc`s, so no registry lock is held while a relationship is being
/// resolved.
#[derive(Debug, Default)]
pub struct RelationshipRegistry {
    relationships: DashMap<ModelId, Vec<Arc<AssociationReflection>>>,
}

impl RelationshipRegistry {
    /// Create a new empty relationship registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relationship on its owning model
    ///
    /// A relationship of the same name on the same model is replaced in
    /// place; the replaced reflection is returned.
    pub fn register(
        &self,
        reflection: Arc<AssociationReflection>,
    ) -> Option<Arc<AssociationReflection>> {
        let mut model_relationships = self
            .relationships
            .entry(reflection.owner().id())
            .or_default();

        match model_relationships
            .iter_mut()
            .find(|existing| existing.name() == reflection.name())
        {
            Some(existing) => Some(std::mem::replace(existing, reflection)),
            None => {
                model_relationships.push(reflection);
                None
            }
        }
    }

    /// Get a relationship by owning model and name
    pub fn get(&self, model: ModelId, name: &str) -> Option<Arc<AssociationReflection>> {
        self.relationships
            .get(&model)?
            .iter()
            .find(|reflection| reflection.name() == name)
            .cloned()
    }

    /// All relationships of a model, in declaration order
    pub fn all_for_model(&self, model: ModelId) -> Vec<Arc<AssociationReflection>> {
        self.relationships
            .get(&model)
            .map(|relationships| relationships.clone())
            .unwrap_or_default()
    }

    /// Check if a relationship exists
    pub fn has_relationship(&self, model: ModelId, name: &str) -> bool {
        self.relationships
            .get(&model)
            .map(|relationships| relationships.iter().any(|r| r.name() == name))
            .unwrap_or(false)
    }

    /// Get all relationship names for a model, in declaration order
    pub fn relationship_names(&self, model: ModelId) -> Vec<String> {
        self.relationships
            .get(&model)
            .map(|relationships| relationships.iter().map(|r| r.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Every registered relationship across all models
    pub fn all(&self) -> Vec<Arc<AssociationReflection>> {
        self.relationships
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        let mut relationship_type_counts = HashMap::new();
        let mut total_relationships = 0;

        for entry in self.relationships.iter() {
            for reflection in entry.value() {
                *relationship_type_counts.entry(reflection.kind()).or_insert(0) += 1;
                total_relationships += 1;
            }
        }

        RegistryStats {
            total_models: self.relationships.len(),
            total_relationships,
            relationship_type_counts,
        }
    }
}

/// Statistics about the relationship registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_models: usize,
    pub total_relationships: usize,
    pub relationship_type_counts: HashMap<RelationshipType, usize>,
}
