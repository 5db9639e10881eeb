//! Built-in placeholder filters.
//!
//! The filter set is closed: every name a template may use is a variant of
//! [`Filter`]. Filters are pure functions of the resolved value (or its
//! absence) and the literal arguments written in the placeholder.

use cruet::Inflector;
use thiserror::Error;

use crate::scanner::FilterCall;
use crate::value::Value;

/// Name of the fallback filter.
pub const DEFAULT_FILTER: &str = "default";

/// Largest width `zfill` pads to.
pub const MAX_PAD: i64 = 4096;

/// Errors raised while evaluating a placeholder's filter call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter '{filter}' on variable '{variable}' at offset {offset}")]
    UnknownFilter {
        filter: String,
        variable: String,
        offset: usize,
    },

    /// Wrong number or type of arguments.
    #[error(
        "filter '{filter}' on variable '{variable}' at offset {offset} expects {expected}, found {found}"
    )]
    Arity {
        filter: String,
        variable: String,
        offset: usize,
        expected: String,
        found: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    Any,
    Str,
    /// A non-negative integer.
    Count,
    /// A non-negative integer no larger than [`MAX_PAD`].
    Width,
}

impl ArgKind {
    fn describe(self) -> String {
        match self {
            ArgKind::Any => "value".to_string(),
            ArgKind::Str => "string".to_string(),
            ArgKind::Count => "non-negative integer".to_string(),
            ArgKind::Width => format!("non-negative integer up to {MAX_PAD}"),
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ArgKind::Any => true,
            ArgKind::Str => matches!(value, Value::Str(_)),
            ArgKind::Count => matches!(value, Value::Int(n) if *n >= 0),
            ArgKind::Width => matches!(value, Value::Int(n) if (0..=MAX_PAD).contains(n)),
        }
    }
}

/// Every filter a placeholder can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Default,
    Upper,
    Lower,
    Trim,
    Capitalize,
    SnakeCase,
    KebabCase,
    CamelCase,
    PascalCase,
    ScreamingSnakeCase,
    TitleCase,
    Replace,
    Truncate,
    Zfill,
    Quote,
}

impl Filter {
    pub const ALL: [Filter; 15] = [
        Filter::Default,
        Filter::Upper,
        Filter::Lower,
        Filter::Trim,
        Filter::Capitalize,
        Filter::SnakeCase,
        Filter::KebabCase,
        Filter::CamelCase,
        Filter::PascalCase,
        Filter::ScreamingSnakeCase,
        Filter::TitleCase,
        Filter::Replace,
        Filter::Truncate,
        Filter::Zfill,
        Filter::Quote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Filter::Default => DEFAULT_FILTER,
            Filter::Upper => "upper",
            Filter::Lower => "lower",
            Filter::Trim => "trim",
            Filter::Capitalize => "capitalize",
            Filter::SnakeCase => "snake_case",
            Filter::KebabCase => "kebab_case",
            Filter::CamelCase => "camel_case",
            Filter::PascalCase => "pascal_case",
            Filter::ScreamingSnakeCase => "screaming_snake_case",
            Filter::TitleCase => "title_case",
            Filter::Replace => "replace",
            Filter::Truncate => "truncate",
            Filter::Zfill => "zfill",
            Filter::Quote => "quote",
        }
    }

    pub fn lookup(name: &str) -> Option<Filter> {
        Filter::ALL.into_iter().find(|filter| filter.name() == name)
    }

    fn signature(self) -> &'static [ArgKind] {
        match self {
            Filter::Default => &[ArgKind::Any],
            Filter::Replace => &[ArgKind::Str, ArgKind::Str],
            Filter::Truncate => &[ArgKind::Count],
            Filter::Zfill => &[ArgKind::Width],
            _ => &[],
        }
    }

    /// Checks argument count and types, returning `(expected, found)` on
    /// mismatch.
    fn check_args(self, args: &[Value]) -> Result<(), (String, String)> {
        let signature = self.signature();
        if args.len() != signature.len() {
            return Err((plural(signature.len(), "argument"), plural(args.len(), "argument")));
        }
        for (idx, (kind, arg)) in signature.iter().zip(args).enumerate() {
            if !kind.accepts(arg) {
                return Err((
                    format!("{} as argument {}", kind.describe(), idx + 1),
                    format!("{} '{}'", arg.kind(), arg),
                ));
            }
        }
        Ok(())
    }

    /// Applies the filter. `None` in means the variable is unresolved;
    /// only `default` can turn that into a value.
    ///
    /// Arguments must already satisfy the filter's signature.
    fn apply(self, input: Option<Value>, args: &[Value]) -> Option<Value> {
        let text = match (self, input) {
            (Filter::Default, input) => return input.or_else(|| args.first().cloned()),
            (_, None) => return None,
            (_, Some(value)) => value.to_string(),
        };
        let out = match self {
            Filter::Default => text,
            Filter::Upper => text.to_uppercase(),
            Filter::Lower => text.to_lowercase(),
            Filter::Trim => text.trim().to_string(),
            Filter::Capitalize => capitalize(&text),
            Filter::SnakeCase => text.to_snake_case(),
            Filter::KebabCase => text.to_kebab_case(),
            Filter::CamelCase => text.to_camel_case(),
            Filter::PascalCase => text.to_pascal_case(),
            Filter::ScreamingSnakeCase => text.to_screaming_snake_case(),
            Filter::TitleCase => text.to_title_case(),
            Filter::Replace => match (args[0].as_str(), args[1].as_str()) {
                (Some(from), Some(to)) if !from.is_empty() => text.replace(from, to),
                _ => text,
            },
            Filter::Truncate => {
                let limit = args[0].as_int().unwrap_or(0) as usize;
                text.chars().take(limit).collect()
            }
            Filter::Zfill => zfill(&text, args[0].as_int().unwrap_or(0) as usize),
            Filter::Quote => format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\"")),
        };
        Some(Value::Str(out))
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Left-pads with zeros, keeping a leading sign in front.
fn zfill(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let padding = "0".repeat(width - len);
    match text.strip_prefix(['-', '+']) {
        Some(rest) => format!("{}{}{}", &text[..1], padding, rest),
        None => format!("{padding}{text}"),
    }
}

/// Resolves a call to its filter and validates its arguments.
pub fn check_call(call: &FilterCall, variable: &str, offset: usize) -> Result<Filter, FilterError> {
    let filter = Filter::lookup(&call.name).ok_or_else(|| FilterError::UnknownFilter {
        filter: call.name.clone(),
        variable: variable.to_string(),
        offset,
    })?;

    filter.check_args(&call.args).map_err(|(expected, found)| FilterError::Arity {
        filter: call.name.clone(),
        variable: variable.to_string(),
        offset,
        expected,
        found,
    })?;

    Ok(filter)
}

/// Evaluates one placeholder's filter call against its resolved input.
///
/// Unknown names and bad arguments are reported even when the input is
/// absent. `Ok(None)` means the placeholder is still unresolved.
pub fn apply_call(
    call: &FilterCall,
    variable: &str,
    offset: usize,
    input: Option<Value>,
) -> Result<Option<Value>, FilterError> {
    let filter = check_call(call, variable, offset)?;
    Ok(filter.apply(input, &call.args))
}
