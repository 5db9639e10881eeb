use std::fs;
use std::path::Path;

use templar::error::Error;
use templar::loader::{load_template_set, load_templates, write_output};
use templar::registry::Registry;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const MANIFEST: &str = r#"{
  "version": "1.0",
  "categories": {
    "ci": {
      "name": "CI/CD",
      "description": "Continuous integration pipelines",
      "templates": [
        {
          "id": "github-actions-ci",
          "name": "GitHub Actions CI Pipeline",
          "path": "ci/github-actions.yml.j2",
          "language": "yaml",
          "supports": ["python", "node"],
          "variables": ["PYTHON_VERSION"],
          "description": "Lint and test on every push"
        }
      ]
    },
    "docker": {
      "name": "Docker",
      "description": "Container images",
      "templates": [
        {
          "id": "python-fastapi",
          "path": "docker/Dockerfile.fastapi.j2"
        }
      ]
    }
  }
}"#;

#[test_log::test]
fn test_load_from_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "registry.json", MANIFEST);
    write(root, "ci/github-actions.yml.j2", "python-version: {{ PYTHON_VERSION }}\n");
    write(root, "docker/Dockerfile.fastapi.j2", "EXPOSE {{ PORT | default(8000) }}\n");

    let sources = load_templates(root).unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].name, "github-actions-ci");
    assert_eq!(sources[0].category, "ci");
    assert_eq!(sources[0].meta.title.as_deref(), Some("GitHub Actions CI Pipeline"));
    assert_eq!(sources[0].meta.supports, vec!["python", "node"]);
    assert_eq!(sources[1].meta.path.as_deref(), Some("docker/Dockerfile.fastapi.j2"));

    let registry = Registry::load(sources).unwrap();
    let entry = registry.show("github-actions-ci").unwrap();
    assert_eq!(entry.variable_names(), vec!["PYTHON_VERSION"]);
    assert_eq!(registry.show("python-fastapi").unwrap().required_variables(), Vec::<&str>::new());
}

#[test]
fn test_manifest_category_metadata_reaches_registry() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "registry.json", MANIFEST);
    write(root, "ci/github-actions.yml.j2", "python-version: {{ PYTHON_VERSION }}\n");
    write(root, "docker/Dockerfile.fastapi.j2", "EXPOSE {{ PORT | default(8000) }}\n");

    let set = load_template_set(root).unwrap();
    assert_eq!(set.templates.len(), 2);
    assert_eq!(set.categories["ci"].name.as_deref(), Some("CI/CD"));

    let registry = Registry::load_with_categories(set.templates, set.categories).unwrap();
    let categories = registry.categories();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].id, "ci");
    assert_eq!(categories[0].name.as_deref(), Some("CI/CD"));
    assert_eq!(
        categories[0].description.as_deref(),
        Some("Continuous integration pipelines")
    );
    assert_eq!(categories[1].name.as_deref(), Some("Docker"));
    assert_eq!(categories[1].template_count, 1);
}

#[test]
fn test_discovery_has_no_category_metadata() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "docker/nginx.Dockerfile.j2", "FROM nginx\n");

    let set = load_template_set(temp_dir.path()).unwrap();
    assert_eq!(set.templates.len(), 1);
    assert!(set.categories.is_empty());
}

#[test]
fn test_yaml_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "registry.yaml",
        "categories:\n  k8s:\n    templates:\n      - id: deployment\n        path: k8s/deployment.yaml.j2\n",
    );
    write(root, "k8s/deployment.yaml.j2", "replicas: {{ replicas | default(2) }}\n");

    let sources = load_templates(root).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].category, "k8s");
}

#[test]
fn test_manifest_with_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "registry.json", MANIFEST);

    match load_templates(temp_dir.path()) {
        Err(Error::ManifestError(message)) => assert!(message.contains("github-actions-ci")),
        other => panic!("expected manifest error, got {other:?}"),
    }
}

#[test]
fn test_invalid_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "registry.yml", "categories: [unclosed");
    assert!(matches!(load_templates(temp_dir.path()), Err(Error::ManifestError(_))));
}

#[test_log::test]
fn test_discovery_without_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "docker/python-fastapi.Dockerfile.j2", "FROM python:{{ python_version }}\n");
    write(root, "docker/README.md", "not a template");
    write(root, "terraform/aws/vpc.tf.j2", "cidr = \"{{ cidr }}\"\n");
    write(root, "root.txt.j2", "{{ greeting }}");
    write(
        root,
        "docker/python-fastapi.meta.yml",
        "title: FastAPI service\nlanguage: python\nsupports: [\"3.11\", \"3.12\"]\n",
    );

    let sources = load_templates(root).unwrap();
    let found: Vec<(&str, &str)> =
        sources.iter().map(|s| (s.name.as_str(), s.category.as_str())).collect();
    assert_eq!(
        found,
        vec![("python-fastapi", "docker"), ("root", "uncategorized"), ("vpc", "terraform")]
    );

    let fastapi = &sources[0];
    assert_eq!(fastapi.meta.title.as_deref(), Some("FastAPI service"));
    assert_eq!(fastapi.meta.supports, vec!["3.11", "3.12"]);
    assert_eq!(
        Path::new(fastapi.meta.path.as_deref().unwrap()),
        Path::new("docker/python-fastapi.Dockerfile.j2")
    );
}

#[test]
fn test_missing_templates_dir() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope");
    assert!(matches!(load_templates(&missing), Err(Error::TemplatesDirNotFound { .. })));
}

#[test]
fn test_write_output_respects_force() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("out/Dockerfile");

    write_output("first", &target, false).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "first");

    assert!(matches!(
        write_output("second", &target, false),
        Err(Error::OutputExistsError { .. })
    ));

    write_output("second", &target, true).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
}
