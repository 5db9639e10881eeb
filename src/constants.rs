//! Common constants used throughout templar.

/// Supported registry manifest file names, tried in order.
pub const MANIFEST_FILES: [&str; 3] = ["registry.json", "registry.yml", "registry.yaml"];

/// Suffix marking a file as a template during directory discovery.
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// Suffixes of sidecar metadata files next to a discovered template.
pub const SIDECAR_SUFFIXES: [&str; 3] = [".meta.json", ".meta.yml", ".meta.yaml"];

/// Category assigned to templates found at the root of a templates directory.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Default prefix of environment variables that provide template values.
pub const ENV_PREFIX: &str = "TEMPLAR_VAR_";
