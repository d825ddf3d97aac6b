//! Plan template catalog loader.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use accord_core::{PlanActionKind, PlanTemplate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loaders::{LoadResult, read_file};

/// Template catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub templates: Vec<PlanTemplate>,
}

/// Named, shared plan templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<PlanTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template, replacing any previous one with the same name.
    pub fn insert(&mut self, template: Arc<PlanTemplate>) -> Option<Arc<PlanTemplate>> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PlanTemplate>> {
        self.templates.get(name).cloned()
    }

    /// Like [`TemplateRegistry::get`], but fails with the list of known names.
    pub fn require(&self, name: &str) -> LoadResult<Arc<PlanTemplate>> {
        self.get(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown plan template '{}' (known: {})",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            )
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Loader for plan templates from RON files.
pub struct TemplateLoader;

impl TemplateLoader {
    /// Load a template catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<TemplateRegistry> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a template catalog from RON text.
    ///
    /// Rejects duplicate names, templates without phases, empty phases and
    /// zero-quantity consumption.
    pub fn parse(content: &str) -> LoadResult<TemplateRegistry> {
        let catalog: TemplateCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse template catalog RON: {}", e))?;

        let mut registry = TemplateRegistry::new();
        for template in catalog.templates {
            validate(&template)?;
            let name = template.name.clone();
            if registry.insert(Arc::new(template)).is_some() {
                anyhow::bail!("Duplicate plan template '{}'", name);
            }
        }
        debug!(count = registry.len(), "plan templates loaded");
        Ok(registry)
    }
}

fn validate(template: &PlanTemplate) -> LoadResult<()> {
    if template.name.trim().is_empty() {
        anyhow::bail!("Plan template without a name");
    }
    if template.phases.is_empty() {
        anyhow::bail!("Plan template '{}' has no phases", template.name);
    }
    for (index, phase) in template.phases.iter().enumerate() {
        if phase.actions.is_empty() {
            anyhow::bail!(
                "Plan template '{}' phase {} has no actions",
                template.name,
                index
            );
        }
        for action in &phase.actions {
            if action.kind == (PlanActionKind::Consume { quantity: 0 }) {
                anyhow::bail!(
                    "Plan template '{}' consumes zero of {}",
                    template.name,
                    action.selector
                );
            }
        }
    }
    Ok(())
}
