//! Template registry.
//! Holds every loaded template keyed by its unique name together with its
//! catalog entry, and answers list/show/get queries. A registry is built
//! once from caller-supplied sources and never mutated afterwards; reloading
//! means building a new one.

use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{build_catalog_entry, CatalogEntry, TemplateMeta};
use crate::error::{Error, Result};
use crate::filters;
use crate::renderer::{PlaceholderRenderer, TemplateRenderer};
use crate::resolver::Bindings;
use crate::scanner::placeholders;

/// Raw template as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub name: String,
    pub category: String,
    pub body: String,
    pub meta: TemplateMeta,
}

impl TemplateSource {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            body: body.into(),
            meta: TemplateMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: TemplateMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// A loaded template. Immutable once it is in a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub category: String,
    pub body: String,
    /// Distinct placeholder variable names in order of first occurrence.
    pub variables: Vec<String>,
}

/// Display metadata of a category, as declared by a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One category with its metadata and number of templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub template_count: usize,
}

#[derive(Debug, Default)]
pub struct Registry {
    templates: BTreeMap<String, Template>,
    entries: BTreeMap<String, CatalogEntry>,
    categories: BTreeMap<String, CategoryMeta>,
}

impl Registry {
    /// Builds a registry from template sources.
    ///
    /// Catalog extraction runs in parallel; insertion happens afterwards in
    /// input order, so the reported duplicate is always the first repeated
    /// name in the input.
    ///
    /// # Errors
    /// * `Error::DuplicateTemplate` if two sources share a name
    pub fn load<I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = TemplateSource>,
    {
        Self::load_with_categories(sources, IndexMap::new())
    }

    /// Like [`Registry::load`], also keeping category metadata. Declared
    /// categories are listed even when they hold no template.
    pub fn load_with_categories<I>(
        sources: I,
        categories: IndexMap<String, CategoryMeta>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = TemplateSource>,
    {
        let sources: Vec<TemplateSource> = sources.into_iter().collect();
        debug!("Building registry from {} templates", sources.len());

        let built: Vec<(Template, CatalogEntry)> = sources
            .into_par_iter()
            .map(|source| {
                let entry = build_catalog_entry(
                    source.name.as_str(),
                    source.category.as_str(),
                    &source.body,
                    source.meta,
                );
                let template = Template {
                    variables: entry.variables.iter().map(|var| var.name.clone()).collect(),
                    name: source.name,
                    category: source.category,
                    body: source.body,
                };
                (template, entry)
            })
            .collect();

        let mut registry =
            Registry { categories: categories.into_iter().collect(), ..Registry::default() };
        for (template, entry) in built {
            if registry.templates.contains_key(&template.name) {
                return Err(Error::DuplicateTemplate { name: template.name });
            }
            registry.entries.insert(entry.name.clone(), entry);
            registry.templates.insert(template.name.clone(), template);
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Catalog entries sorted by name, optionally restricted to one
    /// category. `None` or an empty category returns everything.
    pub fn list(&self, category: Option<&str>) -> Vec<&CatalogEntry> {
        let category = category.filter(|c| !c.is_empty());
        self.entries
            .values()
            .filter(|entry| category.is_none_or(|c| entry.category == c))
            .collect()
    }

    pub fn show(&self, name: &str) -> Result<&CatalogEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound { name: name.to_string() })
    }

    pub fn get(&self, name: &str) -> Result<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound { name: name.to_string() })
    }

    /// Categories with their metadata and template counts, sorted by id.
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut counts: BTreeMap<&str, usize> =
            self.categories.keys().map(|id| (id.as_str(), 0)).collect();
        for template in self.templates.values() {
            *counts.entry(template.category.as_str()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(id, template_count)| {
                let meta = self.categories.get(id).cloned().unwrap_or_default();
                CategorySummary {
                    id: id.to_string(),
                    name: meta.name,
                    description: meta.description,
                    template_count,
                }
            })
            .collect()
    }

    /// Checks that a template scans cleanly and only makes valid filter
    /// calls. Missing variables are not a validation concern.
    ///
    /// # Errors
    /// * `Error::TemplateNotFound` for unknown names
    /// * `Error::InvalidTemplate` listing every problem found
    pub fn validate(&self, name: &str) -> Result<&CatalogEntry> {
        let entry = self.show(name)?;
        let template = self.get(name)?;

        let mut problems = Vec::new();
        for placeholder in placeholders(&template.body) {
            match placeholder {
                Ok(placeholder) => {
                    if let Some(call) = &placeholder.filter {
                        if let Err(err) =
                            filters::check_call(call, &placeholder.variable, placeholder.offset)
                        {
                            problems.push(err.to_string());
                        }
                    }
                }
                Err(err) => problems.push(format!("malformed placeholder at {err}")),
            }
        }

        if problems.is_empty() {
            Ok(entry)
        } else {
            Err(Error::InvalidTemplate { name: name.to_string(), reason: problems.join("; ") })
        }
    }

    /// Renders a registered template.
    pub fn render(&self, name: &str, bindings: &Bindings) -> Result<String> {
        let template = self.get(name)?;
        debug!("Rendering template '{}'", template.name);
        PlaceholderRenderer::new().render(&template.body, bindings)
    }
}
