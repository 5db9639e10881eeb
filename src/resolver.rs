//! Variable resolution.
//!
//! Values come from, in order of precedence: explicit overrides for this
//! render, environment-provided values the caller collected, the literal
//! argument of a placeholder's own `default(...)` filter, or nothing.
//! The resolver never reads the process environment itself.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::scanner::Placeholder;
use crate::value::Value;

/// Where a variable's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingSource {
    Override,
    Environment,
    Default,
    Unresolved,
}

/// A variable name, its value (if any) and the source that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub name: String,
    pub value: Option<Value>,
    pub source: BindingSource,
}

/// Caller-supplied values for one render.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub overrides: IndexMap<String, Value>,
    pub environment: IndexMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings holding only explicit overrides.
    pub fn from_overrides<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            overrides: overrides.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            environment: IndexMap::new(),
        }
    }

    pub fn with_override(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(name.into(), value.into());
        self
    }

    pub fn with_environment(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }
}

/// Looks up variable values for a single render.
pub struct Resolver<'a> {
    bindings: &'a Bindings,
}

impl<'a> Resolver<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self { bindings }
    }

    /// Value from the caller-supplied sources only (override, then
    /// environment).
    pub fn lookup(&self, name: &str) -> VariableBinding {
        let (value, source) = if let Some(value) = self.bindings.overrides.get(name) {
            (Some(value.clone()), BindingSource::Override)
        } else if let Some(value) = self.bindings.environment.get(name) {
            (Some(value.clone()), BindingSource::Environment)
        } else {
            (None, BindingSource::Unresolved)
        };
        VariableBinding { name: name.to_string(), value, source }
    }

    /// Binding for one placeholder occurrence, taking that occurrence's own
    /// `default(...)` argument as the last resort.
    pub fn resolve_placeholder(&self, placeholder: &Placeholder) -> VariableBinding {
        let binding = self.lookup(&placeholder.variable);
        if binding.source != BindingSource::Unresolved {
            return binding;
        }
        match placeholder.default_value() {
            Some(default) => VariableBinding {
                name: binding.name,
                value: Some(default.clone()),
                source: BindingSource::Default,
            },
            None => binding,
        }
    }

    /// Where each declared variable of a template would get its value from.
    ///
    /// A variable counts as defaulted only when every occurrence carries
    /// a `default(...)`; the reported value is the first declared default.
    pub fn plan(&self, entry: &CatalogEntry) -> Vec<VariableBinding> {
        let plan: Vec<VariableBinding> = entry
            .variables
            .iter()
            .map(|var| {
                let binding = self.lookup(&var.name);
                if binding.source != BindingSource::Unresolved || var.required {
                    return binding;
                }
                VariableBinding {
                    name: var.name.clone(),
                    value: var.defaults.first().cloned(),
                    source: BindingSource::Default,
                }
            })
            .collect();
        debug!("Resolved plan for '{}': {} variables", entry.name, plan.len());
        plan
    }
}
