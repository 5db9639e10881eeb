//! Template metadata catalog.
//! Builds the lightweight listing projection of a template: its identity,
//! descriptive sidecar metadata and the variables its body declares.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize, Serializer};

use crate::scanner::{placeholders, ScanError};
use crate::value::Value;

/// Descriptive metadata supplied alongside a template body by the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateMeta {
    /// Human readable title, e.g. "GitHub Actions CI Pipeline".
    pub title: Option<String>,
    pub description: Option<String>,
    /// Language or tool the template targets.
    pub language: Option<String>,
    /// Platforms or versions the template supports.
    pub supports: Vec<String>,
    /// Location of the template file, relative to the templates directory.
    pub path: Option<String>,
}

/// A variable referenced by a template body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredVariable {
    pub name: String,
    /// Distinct `default(...)` arguments across all occurrences.
    pub defaults: Vec<Value>,
    /// True if some occurrence has no `default(...)` to fall back on.
    pub required: bool,
}

/// Listing projection of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub category: String,
    #[serde(flatten)]
    pub meta: TemplateMeta,
    /// Declared variables in order of first occurrence.
    pub variables: Vec<DeclaredVariable>,
    /// Set when the body has a malformed placeholder. `variables` then holds
    /// only what was found before it.
    #[serde(serialize_with = "serialize_warning")]
    pub warning: Option<ScanError>,
}

fn serialize_warning<S: Serializer>(
    warning: &Option<ScanError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match warning {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

impl CatalogEntry {
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|var| var.name.as_str()).collect()
    }

    pub fn required_variables(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|var| var.required)
            .map(|var| var.name.as_str())
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<&DeclaredVariable> {
        self.variables.iter().find(|var| var.name == name)
    }
}

/// Builds a catalog entry without rendering the body.
///
/// A malformed placeholder does not fail the build: the entry carries the
/// scan error as a warning so the template stays listable.
pub fn build_catalog_entry(
    name: impl Into<String>,
    category: impl Into<String>,
    body: &str,
    meta: TemplateMeta,
) -> CatalogEntry {
    let name = name.into();
    let mut variables: IndexMap<String, DeclaredVariable> = IndexMap::new();
    let mut warning = None;

    for placeholder in placeholders(body) {
        let placeholder = match placeholder {
            Ok(placeholder) => placeholder,
            Err(err) => {
                warn!("Template '{name}': metadata extraction stopped at {err}");
                warning = Some(err);
                break;
            }
        };

        let default = placeholder.default_value().cloned();
        let var = variables.entry(placeholder.variable.clone()).or_insert_with(|| {
            DeclaredVariable { name: placeholder.variable.clone(), defaults: Vec::new(), required: false }
        });
        match default {
            Some(value) if !var.defaults.contains(&value) => var.defaults.push(value),
            Some(_) => {}
            None => var.required = true,
        }
    }

    debug!("Catalogued '{name}' with {} variables", variables.len());

    CatalogEntry {
        name,
        category: category.into(),
        meta,
        variables: variables.into_values().collect(),
        warning,
    }
}
