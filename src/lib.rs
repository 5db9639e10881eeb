//! templar is a template catalog and rendering engine for DevOps scaffolds.
//! It turns parameterized files (Terraform modules, Dockerfiles, CI
//! pipelines, Kubernetes manifests) into ready-to-use artifacts by
//! substituting variable values into `{{ name | filter(args) }}` placeholders.
//!
//! ```
//! use templar::{renderer::render, resolver::Bindings};
//!
//! let bindings = Bindings::from_overrides([("az_count", 3)]);
//! let out = render("NAT: {{ enable_nat | default(true) }}, AZ: {{ az_count }}", &bindings).unwrap();
//! assert_eq!(out, "NAT: true, AZ: 3");
//! ```

/// Template catalog entries and sidecar metadata
pub mod catalog;

/// Command-line interface module for the templar binary
pub mod cli;

/// Common constants
pub mod constants;

/// Error types and handling for templar
pub mod error;

/// Built-in placeholder filters
pub mod filters;

/// Loading templates from a templates directory
/// Supports a registry manifest (registry.json, registry.yml, registry.yaml)
/// or discovery of `*.j2` files
pub mod loader;

/// Registry of loaded templates with list/show/get queries
pub mod registry;

/// Template rendering
pub mod renderer;

/// Variable resolution by precedence
pub mod resolver;

/// Placeholder scanning
pub mod scanner;

/// Scalar template values
pub mod value;
