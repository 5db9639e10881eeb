//! Error handling for templar.
//! Defines the error taxonomy shared by the scanner, renderer, registry and
//! the command-line front end.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::filters::FilterError;
use crate::scanner::ScanError;

/// A variable that had no value from any source at a given placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedVariable {
    /// Variable name as written in the placeholder.
    pub name: String,
    /// Byte offset of the first placeholder referencing it.
    pub offset: usize,
}

/// Every semantic problem found while rendering one template body.
///
/// The renderer walks the whole body before failing, so `missing` lists
/// each unresolved variable once (in order of first occurrence) and
/// `filter_errors` lists every bad filter call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderFailure {
    pub missing: Vec<UnresolvedVariable>,
    pub filter_errors: Vec<FilterError>,
}

impl RenderFailure {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.filter_errors.is_empty()
    }

    /// Names of the unresolved variables, in order of first occurrence.
    pub fn missing_names(&self) -> Vec<&str> {
        self.missing.iter().map(|var| var.name.as_str()).collect()
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing variables: {}", self.missing_names().join(", ")));
        }
        for err in &self.filter_errors {
            parts.push(err.to_string());
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Custom error types for templar operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Syntax error inside a `{{ ... }}` marker.
    #[error("Malformed placeholder at offset {offset}: {reason}.")]
    MalformedPlaceholder {
        offset: usize,
        reason: crate::scanner::ScanErrorKind,
    },

    /// Aggregate of unresolved variables and filter errors for one render.
    #[error("Render error: {0}.")]
    Render(RenderFailure),

    #[error("Template '{name}' not found.")]
    TemplateNotFound { name: String },

    #[error("Duplicate template name '{name}'.")]
    DuplicateTemplate { name: String },

    /// Template exists but fails validation.
    #[error("Template '{name}' is invalid: {reason}.")]
    InvalidTemplate { name: String, reason: String },

    #[error("Templates directory '{path}' does not exist.")]
    TemplatesDirNotFound { path: String },

    /// Problems with the registry manifest of a templates directory.
    #[error("Manifest error: {0}.")]
    ManifestError(String),

    #[error("Output file '{path}' already exists. Use --force to overwrite.")]
    OutputExistsError { path: String },

    /// A `--var` flag or vars file entry that cannot be used as a binding.
    #[error("Invalid variable: {0}.")]
    InvalidVariable(String),

    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Directory traversal error: {0}.")]
    WalkdirError(#[from] walkdir::Error),
}

impl From<ScanError> for Error {
    fn from(err: ScanError) -> Self {
        Error::MalformedPlaceholder { offset: err.offset, reason: err.kind }
    }
}

impl From<RenderFailure> for Error {
    fn from(failure: RenderFailure) -> Self {
        Error::Render(failure)
    }
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
