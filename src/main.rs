//! templar's main application entry point.
//! Loads the templates directory, builds the registry and dispatches the
//! requested subcommand.

use templar::{
    catalog::CatalogEntry,
    cli::{build_bindings, get_args, Args, Command, RenderArgs},
    error::{default_error_handler, Error, Result},
    loader::{load_template_set, resolve_output_path, write_output},
    registry::Registry,
    resolver::{BindingSource, Bindings, Resolver},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose { log::LevelFilter::Trace } else { log::LevelFilter::Off })
        .init();

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn run(args: Args) -> Result<()> {
    let set = load_template_set(&args.templates_dir)?;
    let registry = Registry::load_with_categories(set.templates, set.categories)?;
    log::debug!("Registry holds {} templates", registry.len());

    match args.command {
        Command::List { category, json } => {
            let entries = registry.list(category.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No templates found");
            } else {
                print_list(&entries);
            }
        }
        Command::Show { name, json } => {
            let entry = registry.show(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(entry)?);
            } else {
                print_entry(entry);
            }
        }
        Command::Categories => {
            for category in registry.categories() {
                println!(
                    "{:<16} {:<24} {:>3} templates  {}",
                    category.id,
                    category.name.as_deref().unwrap_or("-"),
                    category.template_count,
                    category.description.as_deref().unwrap_or("")
                );
            }
        }
        Command::Validate { name } => {
            registry.validate(&name)?;
            println!("Template '{name}' is valid");
        }
        Command::Render(render_args) => render(&registry, &render_args)?,
    }
    Ok(())
}

fn render(registry: &Registry, args: &RenderArgs) -> Result<()> {
    let bindings = build_bindings(args, std::env::vars())?;
    let entry = registry.show(&args.name)?;

    let content = match registry.render(&args.name, &bindings) {
        Ok(content) => content,
        Err(Error::Render(failure)) if !failure.missing.is_empty() => {
            let example: Vec<String> =
                failure.missing_names().iter().map(|name| format!("--var {name}=<value>")).collect();
            eprintln!("Example:\n  templar render {} {}", args.name, example.join(" "));
            return Err(Error::Render(failure));
        }
        Err(err) => return Err(err),
    };

    match &args.output {
        Some(output_dir) => {
            let template_path = entry.meta.path.as_deref().unwrap_or(&entry.name);
            let target = resolve_output_path(template_path, output_dir);
            write_output(&content, &target, args.force)?;
            println!("Created: '{}'", target.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn print_list(entries: &[&CatalogEntry]) {
    println!(
        "{:<28} {:<32} {:<12} {:<12} DESCRIPTION",
        "NAME", "TITLE", "CATEGORY", "LANGUAGE"
    );
    for entry in entries {
        println!("{}", list_row(entry));
    }
    println!("\nTotal: {} templates", entries.len());
}

fn list_row(entry: &CatalogEntry) -> String {
    let description = entry.meta.description.as_deref().unwrap_or("");
    let description = if description.chars().count() > 60 {
        format!("{}...", description.chars().take(60).collect::<String>())
    } else {
        description.to_string()
    };
    format!(
        "{:<28} {:<32} {:<12} {:<12} {}",
        entry.name,
        entry.meta.title.as_deref().unwrap_or("-"),
        entry.category,
        entry.meta.language.as_deref().unwrap_or("-"),
        description
    )
}

fn print_entry(entry: &CatalogEntry) {
    println!("{}", entry.meta.title.as_deref().unwrap_or(&entry.name));
    println!("Name: {}", entry.name);
    println!("Category: {}", entry.category);
    if let Some(language) = &entry.meta.language {
        println!("Language: {language}");
    }
    if let Some(description) = &entry.meta.description {
        println!("\nDescription:\n{description}");
    }

    if !entry.variables.is_empty() {
        println!("\nVariables:");
        let bindings = Bindings::new();
        for binding in Resolver::new(&bindings).plan(entry) {
            match (binding.source, binding.value) {
                (BindingSource::Default, Some(value)) => {
                    println!("  - {} (default: {value})", binding.name)
                }
                _ => println!("  - {} (required)", binding.name),
            }
        }
    }

    if !entry.meta.supports.is_empty() {
        println!("\nSupports:");
        for support in &entry.meta.supports {
            println!("  - {support}");
        }
    }
    if let Some(path) = &entry.meta.path {
        println!("\nFile: {path}");
    }
    if let Some(warning) = &entry.warning {
        println!("\nWarning: malformed placeholder at {warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templar::catalog::{build_catalog_entry, TemplateMeta};

    #[test]
    fn test_list_row_shows_title() {
        let meta = TemplateMeta {
            title: Some("FastAPI service".to_string()),
            language: Some("python".to_string()),
            ..TemplateMeta::default()
        };
        let row = list_row(&build_catalog_entry("python-fastapi", "docker", "", meta));
        let columns: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(columns, vec!["python-fastapi", "FastAPI", "service", "docker", "python"]);

        let row = list_row(&build_catalog_entry("vpc", "terraform", "", TemplateMeta::default()));
        let columns: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(columns, vec!["vpc", "-", "terraform", "-"]);
    }
}
