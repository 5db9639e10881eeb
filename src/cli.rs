//! Command-line interface implementation for templar.
//! Provides argument parsing and turns `--var`, `--vars-file` and prefixed
//! environment variables into render bindings.

use clap::{error::ErrorKind, Args as ClapArgs, CommandFactory, Parser, Subcommand};
use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::constants::ENV_PREFIX;
use crate::error::{Error, Result};
use crate::resolver::Bindings;
use crate::value::Value;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(.*)$").expect("variable pattern is valid")
});

/// Command-line arguments structure for templar.
#[derive(Parser, Debug)]
#[command(author, version, about = "templar: DevOps template catalog and renderer", long_about = None)]
pub struct Args {
    /// Directory holding the templates (and optionally a registry manifest)
    #[arg(
        short,
        long,
        value_name = "DIR",
        env = "TEMPLAR_TEMPLATES_DIR",
        default_value = "templates",
        global = true
    )]
    pub templates_dir: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available templates
    List {
        /// Only show templates of this category
        #[arg(short, long)]
        category: Option<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show template details and variables
    Show {
        #[arg(value_name = "TEMPLATE")]
        name: String,

        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// List template categories
    Categories,

    /// Check that a template parses and uses valid filters
    Validate {
        #[arg(value_name = "TEMPLATE")]
        name: String,
    },

    /// Render a template with the given variables
    Render(RenderArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    #[arg(value_name = "TEMPLATE")]
    pub name: String,

    /// Template variable as KEY=VALUE, may be repeated
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// JSON or YAML file with a mapping of variables
    #[arg(long, value_name = "FILE")]
    pub vars_file: Option<PathBuf>,

    /// Prefix of environment variables that provide values
    #[arg(long, value_name = "PREFIX", default_value = ENV_PREFIX)]
    pub env_prefix: String,

    /// Directory to write the rendered file to instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    pub force: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 and the help text if a subcommand is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

/// Splits a `KEY=VALUE` flag. The key must be a valid identifier.
pub fn parse_var(raw: &str) -> Result<(String, Value)> {
    let captures = VAR_RE.captures(raw).ok_or_else(|| {
        Error::InvalidVariable(format!("'{raw}', expected KEY=VALUE with an identifier key"))
    })?;
    Ok((captures[1].to_string(), Value::Str(captures[2].to_string())))
}

/// Reads a JSON or YAML mapping of variables.
pub fn load_vars_file<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, Value>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let raw: IndexMap<String, serde_json::Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(_) => serde_yaml::from_str(&content).map_err(|e| {
            Error::InvalidVariable(format!("cannot parse {}: {e}", path.as_ref().display()))
        })?,
    };
    Ok(raw.iter().map(|(key, value)| (key.clone(), Value::from_json(value))).collect())
}

/// Picks variables carrying `prefix` and strips it, e.g. `TEMPLAR_VAR_region`
/// provides `region`. Names that are not identifiers after stripping are
/// skipped.
pub fn environment_values<I>(prefix: &str, vars: I) -> IndexMap<String, Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(prefix)?;
            crate::scanner::is_identifier(name).then(|| (name.to_string(), Value::Str(value)))
        })
        .collect()
}

/// Assembles render bindings. `--var` flags win over the vars file.
pub fn build_bindings<I>(args: &RenderArgs, env_vars: I) -> Result<Bindings>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut overrides = match &args.vars_file {
        Some(path) => load_vars_file(path)?,
        None => IndexMap::new(),
    };
    for raw in &args.vars {
        let (key, value) = parse_var(raw)?;
        overrides.insert(key, value);
    }

    Ok(Bindings { overrides, environment: environment_values(&args.env_prefix, env_vars) })
}
