use templar::error::Error;
use indexmap::IndexMap;
use templar::registry::{CategoryMeta, CategorySummary, Registry, TemplateSource};
use templar::resolver::Bindings;

fn sample_registry() -> Registry {
    Registry::load(vec![
        TemplateSource::new("nginx", "docker", "FROM nginx:{{ version | default('1.27') }}\n"),
        TemplateSource::new("vpc", "terraform", "cidr = \"{{ cidr }}\"\naz = {{ az_count }}\n"),
        TemplateSource::new("api", "docker", "FROM python:{{ python_version }}\nEXPOSE {{ port }}\n"),
    ])
    .unwrap()
}

fn names<'a>(entries: impl IntoIterator<Item = &'a templar::catalog::CatalogEntry>) -> Vec<&'a str> {
    entries.into_iter().map(|entry| entry.name.as_str()).collect()
}

#[test]
fn test_duplicate_name_is_rejected() {
    let result = Registry::load(vec![
        TemplateSource::new("vpc", "terraform", "a"),
        TemplateSource::new("vpc", "terraform", "b"),
    ]);
    match result {
        Err(Error::DuplicateTemplate { name }) => assert_eq!(name, "vpc"),
        other => panic!("expected duplicate error, got {other:?}"),
    }
}

#[test]
fn test_first_repeated_name_is_reported() {
    let sources = ["a", "b", "c", "b", "a"]
        .into_iter()
        .map(|name| TemplateSource::new(name, "ci", "{{ x }}"));
    match Registry::load(sources) {
        Err(Error::DuplicateTemplate { name }) => assert_eq!(name, "b"),
        other => panic!("expected duplicate error, got {other:?}"),
    }
}

#[test]
fn test_list_by_category_sorted_by_name() {
    let registry = sample_registry();
    assert_eq!(names(registry.list(Some("docker"))), vec!["api", "nginx"]);
    assert_eq!(names(registry.list(Some("terraform"))), vec!["vpc"]);
    assert!(registry.list(Some("k8s")).is_empty());
}

#[test]
fn test_list_without_filter_returns_all() {
    let registry = sample_registry();
    assert_eq!(names(registry.list(None)), vec!["api", "nginx", "vpc"]);
    assert_eq!(names(registry.list(Some(""))), vec!["api", "nginx", "vpc"]);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["api", "nginx", "vpc"]);
}

#[test]
fn test_show_and_get() {
    let registry = sample_registry();

    let entry = registry.show("vpc").unwrap();
    assert_eq!(entry.variable_names(), vec!["cidr", "az_count"]);

    let template = registry.get("api").unwrap();
    assert_eq!(template.category, "docker");
    assert_eq!(template.variables, vec!["python_version", "port"]);
    assert!(template.body.starts_with("FROM python:"));
}

#[test]
fn test_unknown_name_is_not_found() {
    let registry = sample_registry();
    assert!(matches!(
        registry.show("unknown-template"),
        Err(Error::TemplateNotFound { ref name }) if name == "unknown-template"
    ));
    assert!(matches!(registry.get("nope"), Err(Error::TemplateNotFound { .. })));
    assert!(matches!(
        registry.render("nope", &Bindings::new()),
        Err(Error::TemplateNotFound { .. })
    ));
}

#[test]
fn test_categories() {
    let registry = sample_registry();
    assert_eq!(
        registry.categories(),
        vec![
            CategorySummary {
                id: "docker".to_string(),
                name: None,
                description: None,
                template_count: 2
            },
            CategorySummary {
                id: "terraform".to_string(),
                name: None,
                description: None,
                template_count: 1
            },
        ]
    );
}

#[test]
fn test_categories_carry_metadata() {
    let mut categories = IndexMap::new();
    categories.insert(
        "docker".to_string(),
        CategoryMeta {
            name: Some("Docker".to_string()),
            description: Some("Container images".to_string()),
        },
    );
    categories.insert(
        "k8s".to_string(),
        CategoryMeta { name: Some("Kubernetes".to_string()), description: None },
    );
    let registry = Registry::load_with_categories(
        vec![
            TemplateSource::new("nginx", "docker", "FROM nginx"),
            TemplateSource::new("vpc", "terraform", "{{ cidr }}"),
        ],
        categories,
    )
    .unwrap();

    let summaries = registry.categories();
    let ids: Vec<&str> = summaries.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["docker", "k8s", "terraform"]);

    assert_eq!(summaries[0].name.as_deref(), Some("Docker"));
    assert_eq!(summaries[0].description.as_deref(), Some("Container images"));
    assert_eq!(summaries[0].template_count, 1);

    assert_eq!(summaries[1].name.as_deref(), Some("Kubernetes"));
    assert_eq!(summaries[1].template_count, 0);

    assert_eq!(summaries[2].name, None);
    assert_eq!(summaries[2].template_count, 1);
}

#[test]
fn test_render_registered_template() {
    let registry = sample_registry();
    let out = registry.render("nginx", &Bindings::new()).unwrap();
    assert_eq!(out, "FROM nginx:1.27\n");

    let bindings = Bindings::new().with_override("cidr", "10.1.0.0/16").with_override("az_count", 2);
    let out = registry.render("vpc", &bindings).unwrap();
    assert_eq!(out, "cidr = \"10.1.0.0/16\"\naz = 2\n");
}

#[test]
fn test_malformed_template_is_still_listed() {
    let registry = Registry::load(vec![
        TemplateSource::new("ok", "ci", "{{ a }}"),
        TemplateSource::new("broken", "ci", "{{ a }} ${{ secrets.TOKEN }}"),
    ])
    .unwrap();

    assert_eq!(names(registry.list(Some("ci"))), vec!["broken", "ok"]);
    let entry = registry.show("broken").unwrap();
    assert!(entry.warning.is_some());
    assert_eq!(entry.variable_names(), vec!["a"]);
}

#[test]
fn test_validate() {
    let registry = Registry::load(vec![
        TemplateSource::new("good", "docker", "{{ a | default(1) }} {{ b | upper }}"),
        TemplateSource::new("bad-filter", "docker", "{{ a | shout }} {{ b | default() }}"),
        TemplateSource::new("malformed", "docker", "{{ a "),
    ])
    .unwrap();

    assert_eq!(registry.validate("good").unwrap().name, "good");

    match registry.validate("bad-filter") {
        Err(Error::InvalidTemplate { name, reason }) => {
            assert_eq!(name, "bad-filter");
            assert!(reason.contains("unknown filter 'shout'"));
            assert!(reason.contains("filter 'default' on variable 'b'"));
        }
        other => panic!("expected invalid template, got {other:?}"),
    }

    match registry.validate("malformed") {
        Err(Error::InvalidTemplate { reason, .. }) => {
            assert!(reason.contains("unterminated placeholder"))
        }
        other => panic!("expected invalid template, got {other:?}"),
    }
}

#[test]
fn test_empty_registry() {
    let registry = Registry::load(Vec::new()).unwrap();
    assert!(registry.is_empty());
    assert!(registry.list(None).is_empty());
    assert!(registry.categories().is_empty());
}
