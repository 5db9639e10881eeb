//! Template loading from a templates directory.
//! Reads raw template bodies and their descriptive metadata from disk and
//! hands them to the registry as [`TemplateSource`]s. Two layouts are
//! supported: a registry manifest (`registry.json`, `registry.yml` or
//! `registry.yaml`) listing every template, or plain discovery of `*.j2`
//! files grouped by top-level directory.
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::TemplateMeta;
use crate::constants::{DEFAULT_CATEGORY, MANIFEST_FILES, SIDECAR_SUFFIXES, TEMPLATE_SUFFIX};
use crate::error::{Error, Result};
use crate::registry::{CategoryMeta, TemplateSource};

/// Everything read from a templates directory.
#[derive(Debug, Default)]
pub struct TemplateSet {
    pub templates: Vec<TemplateSource>,
    /// Category metadata from the manifest; empty for discovered layouts.
    pub categories: IndexMap<String, CategoryMeta>,
}

/// Registry manifest of a templates directory.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub categories: IndexMap<String, ManifestCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub templates: Vec<ManifestTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct ManifestTemplate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Template file, relative to the templates directory.
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub supports: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Reads the first manifest file found in `templates_dir`.
///
/// # Returns
/// * `Result<Option<String>>` - Manifest contents, or `None` if there is none
pub fn read_manifest<P: AsRef<Path>>(templates_dir: P, manifest_files: &[&str]) -> Result<Option<String>> {
    for file in manifest_files {
        let manifest_path = templates_dir.as_ref().join(file);
        if manifest_path.exists() {
            debug!("Loading manifest from {}", manifest_path.display());
            return Ok(Some(fs::read_to_string(&manifest_path).map_err(Error::IoError)?));
        }
    }
    Ok(None)
}

/// Parses manifest contents, trying JSON first and YAML second.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    match serde_json::from_str(content) {
        Ok(manifest) => Ok(manifest),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ManifestError(format!("invalid manifest format: {e}"))),
    }
}

/// Loads every template of a templates directory.
///
/// # Errors
/// * `Error::TemplatesDirNotFound` if the directory does not exist
/// * `Error::ManifestError` if the manifest is invalid or names a missing file
pub fn load_templates<P: AsRef<Path>>(templates_dir: P) -> Result<Vec<TemplateSource>> {
    Ok(load_template_set(templates_dir)?.templates)
}

/// Loads every template of a templates directory along with the category
/// metadata its manifest declares.
///
/// # Errors
/// Same as [`load_templates`].
pub fn load_template_set<P: AsRef<Path>>(templates_dir: P) -> Result<TemplateSet> {
    let templates_dir = templates_dir.as_ref();
    if !templates_dir.is_dir() {
        return Err(Error::TemplatesDirNotFound { path: templates_dir.display().to_string() });
    }

    match read_manifest(templates_dir, &MANIFEST_FILES)? {
        Some(content) => {
            let manifest = parse_manifest(&content)?;
            Ok(TemplateSet {
                templates: load_from_manifest(templates_dir, &manifest)?,
                categories: manifest_categories(&manifest),
            })
        }
        None => Ok(TemplateSet {
            templates: discover_templates(templates_dir)?,
            categories: IndexMap::new(),
        }),
    }
}

fn manifest_categories(manifest: &Manifest) -> IndexMap<String, CategoryMeta> {
    manifest
        .categories
        .iter()
        .map(|(id, data)| {
            let meta =
                CategoryMeta { name: data.name.clone(), description: data.description.clone() };
            (id.clone(), meta)
        })
        .collect()
}

fn load_from_manifest(templates_dir: &Path, manifest: &Manifest) -> Result<Vec<TemplateSource>> {
    let mut sources = Vec::new();
    for (category, data) in &manifest.categories {
        for template in &data.templates {
            let template_path = templates_dir.join(&template.path);
            let body = fs::read_to_string(&template_path).map_err(|e| {
                Error::ManifestError(format!(
                    "cannot read template '{}' from '{}': {e}",
                    template.id,
                    template_path.display()
                ))
            })?;
            let meta = TemplateMeta {
                title: template.name.clone(),
                description: template.description.clone(),
                language: template.language.clone(),
                supports: template.supports.clone(),
                path: Some(template.path.clone()),
            };
            sources.push(TemplateSource::new(&template.id, category, body).with_meta(meta));
        }
    }
    debug!("Loaded {} templates from manifest", sources.len());
    Ok(sources)
}

/// Finds `*.j2` files under `templates_dir` in file-name order.
///
/// The category is the first directory below the root and the name is the
/// file name up to its first `.`, so `docker/python-fastapi.Dockerfile.j2`
/// becomes `python-fastapi` in category `docker`.
fn discover_templates(templates_dir: &Path) -> Result<Vec<TemplateSource>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(templates_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !entry.file_type().is_file() || !is_template_path(file_name) {
            continue;
        }

        let relative = path
            .strip_prefix(templates_dir)
            .map_err(|e| Error::ManifestError(e.to_string()))?;
        let category = match relative.parent().and_then(|p| p.components().next()) {
            Some(component) => component.as_os_str().to_string_lossy().into_owned(),
            None => DEFAULT_CATEGORY.to_string(),
        };
        let name = file_name.split('.').next().unwrap_or(file_name);

        let mut meta = read_sidecar(path, name)?.unwrap_or_default();
        meta.path.get_or_insert_with(|| relative.to_string_lossy().into_owned());

        debug!("Discovered template '{}' in category '{}'", name, category);
        let body = fs::read_to_string(path)?;
        sources.push(TemplateSource::new(name, category, body).with_meta(meta));
    }
    Ok(sources)
}

/// Reads `<name>.meta.{json,yml,yaml}` next to a discovered template.
fn read_sidecar(template_path: &Path, name: &str) -> Result<Option<TemplateMeta>> {
    let Some(dir) = template_path.parent() else {
        return Ok(None);
    };
    for suffix in SIDECAR_SUFFIXES {
        let sidecar = dir.join(format!("{name}{suffix}"));
        if !sidecar.is_file() {
            continue;
        }
        debug!("Reading sidecar metadata {}", sidecar.display());
        let content = fs::read_to_string(&sidecar)?;
        let meta = if suffix.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        return Ok(Some(meta));
    }
    Ok(None)
}

/// Returns true for file names like `Dockerfile.j2` or `main.tf.j2`.
pub fn is_template_path(file_name: &str) -> bool {
    file_name.len() > TEMPLATE_SUFFIX.len() && file_name.ends_with(TEMPLATE_SUFFIX)
}

/// Output location for a rendered template: the template's file name with
/// the trailing `.j2` removed, inside `output_dir`.
pub fn resolve_output_path<P: AsRef<Path>>(template_path: &str, output_dir: P) -> PathBuf {
    let file_name = Path::new(template_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(template_path);
    let file_name = file_name.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(file_name);
    output_dir.as_ref().join(file_name)
}

/// Writes rendered content, creating parent directories as needed.
///
/// # Errors
/// * `Error::OutputExistsError` if `dest_path` exists and `force` is false
pub fn write_output<P: AsRef<Path>>(content: &str, dest_path: P, force: bool) -> Result<()> {
    let dest_path = dest_path.as_ref();
    if dest_path.exists() && !force {
        return Err(Error::OutputExistsError { path: dest_path.display().to_string() });
    }
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    fs::write(dest_path, content).map_err(Error::IoError)
}
