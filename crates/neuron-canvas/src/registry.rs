//! Read-only catalogue of reference models.

use crate::codec::import_from_json;
use crate::error::Result;
use crate::model::Model;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::Path;

/// Pseudo-category that matches every model.
pub const ALL_CATEGORY: &str = "全部";

#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model` under `metadata.name`, replacing an earlier model of the same name.
    pub fn insert(&mut self, model: Model) {
        self.models.insert(model.metadata.name.clone(), model);
    }

    /// Loads every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut registry = Self::new();
        for path in paths {
            let text = std::fs::read_to_string(&path)?;
            let model = import_from_json(&text)?;
            tracing::debug!(path = %path.display(), name = %model.metadata.name, "registered model");
            registry.insert(model);
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    /// Sorted categories, led by [`ALL_CATEGORY`].
    pub fn all_categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .models
            .values()
            .filter_map(|m| m.metadata.category.as_ref())
            .flat_map(|c| c.iter())
            .collect();
        std::iter::once(ALL_CATEGORY.to_string())
            .chain(set.into_iter().map(str::to_string))
            .collect()
    }

    pub fn all_tags(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .models
            .values()
            .filter_map(|m| m.metadata.tags.as_ref())
            .flatten()
            .map(String::as_str)
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Models whose name, display name, description or tags contain the trimmed `query`
    /// (case-insensitive), in `category` (unless `None` or [`ALL_CATEGORY`]) and carrying
    /// every tag in `tags`.
    pub fn search(&self, query: &str, category: Option<&str>, tags: &[&str]) -> Vec<&Model> {
        let query = query.trim().to_lowercase();
        self.models
            .values()
            .filter(|m| query.is_empty() || searchable_text(m).contains(&query))
            .filter(|m| match category {
                None | Some(ALL_CATEGORY) => true,
                Some(cat) => m
                    .metadata
                    .category
                    .as_ref()
                    .is_some_and(|c| c.iter().any(|x| x == cat)),
            })
            .filter(|m| {
                tags.iter().all(|tag| {
                    m.metadata
                        .tags
                        .as_ref()
                        .is_some_and(|ts| ts.iter().any(|t| t == tag))
                })
            })
            .collect()
    }
}

fn searchable_text(model: &Model) -> String {
    let meta = &model.metadata;
    let mut parts: Vec<&str> = vec![
        meta.display_name.as_str(),
        meta.description.as_str(),
        meta.name.as_str(),
    ];
    parts.extend(meta.tags.iter().flatten().map(String::as_str));
    parts.retain(|p| !p.is_empty());
    parts.join(" ").to_lowercase()
}

impl FromIterator<Model> for ModelRegistry {
    fn from_iter<I: IntoIterator<Item = Model>>(iter: I) -> Self {
        let mut registry = Self::new();
        for model in iter {
            registry.insert(model);
        }
        registry
    }
}
