//! Template rendering.
//! Substitutes resolved values into a scanned template body. Rendering is
//! all-or-nothing: either every placeholder resolves or the caller gets one
//! error describing every problem in the body.
use log::debug;

use crate::error::{RenderFailure, Result, UnresolvedVariable};
use crate::filters;
use crate::resolver::{BindingSource, Bindings, Resolver, VariableBinding};
use crate::scanner::{scan, Placeholder, Segment};
use crate::value::Value;

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given bindings.
    ///
    /// # Arguments
    /// * `template` - Template body to render
    /// * `bindings` - Override and environment values for this render
    ///
    /// # Returns
    /// * `Result<String>` - Fully substituted text
    fn render(&self, template: &str, bindings: &Bindings) -> Result<String>;
}

/// Renderer for the `{{ name | filter(args) }}` placeholder grammar.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    /// Renders a template body.
    ///
    /// # Errors
    /// * `Error::MalformedPlaceholder` as soon as the body fails to scan
    /// * `Error::Render` listing every unresolved variable and filter error
    fn render(&self, template: &str, bindings: &Bindings) -> Result<String> {
        let segments = scan(template)?;
        let resolver = Resolver::new(bindings);

        let mut output = String::with_capacity(template.len());
        let mut failure = RenderFailure::default();

        for segment in &segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let binding = resolver.resolve_placeholder(placeholder);
                    // A rejected `default(...)` supplies nothing either.
                    let bound = matches!(
                        binding.source,
                        BindingSource::Override | BindingSource::Environment
                    );
                    match evaluate(placeholder, binding) {
                        Ok(Some(value)) => output.push_str(&value.to_string()),
                        Ok(None) => record_missing(&mut failure, placeholder),
                        Err(err) => {
                            if !bound {
                                record_missing(&mut failure, placeholder);
                            }
                            failure.filter_errors.push(err);
                        }
                    }
                }
            }
        }

        if failure.is_empty() {
            Ok(output)
        } else {
            debug!(
                "Render failed: {} missing, {} filter errors",
                failure.missing.len(),
                failure.filter_errors.len()
            );
            Err(failure.into())
        }
    }
}

/// Applies a placeholder's filter to its resolved binding. `Ok(None)` means
/// unresolved.
fn evaluate(
    placeholder: &Placeholder,
    binding: VariableBinding,
) -> std::result::Result<Option<Value>, filters::FilterError> {
    match &placeholder.filter {
        Some(call) => {
            filters::apply_call(call, &placeholder.variable, placeholder.offset, binding.value)
        }
        None => Ok(binding.value),
    }
}

fn record_missing(failure: &mut RenderFailure, placeholder: &Placeholder) {
    if failure.missing.iter().any(|var| var.name == placeholder.variable) {
        return;
    }
    failure.missing.push(UnresolvedVariable {
        name: placeholder.variable.clone(),
        offset: placeholder.offset,
    });
}

/// Renders `template` with the default placeholder renderer.
pub fn render(template: &str, bindings: &Bindings) -> Result<String> {
    PlaceholderRenderer::new().render(template, bindings)
}
