use neuron_canvas::model::{Categories, Model, ModelMetadata};
use neuron_canvas::registry::{ALL_CATEGORY, ModelRegistry};
use pretty_assertions::assert_eq;

fn fixtures() -> ModelRegistry {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    ModelRegistry::load_dir(dir).unwrap()
}

fn names(models: &[&Model]) -> Vec<String> {
    models.iter().map(|m| m.metadata.name.clone()).collect()
}

fn model(name: &str, description: &str, category: &str, tags: &[&str]) -> Model {
    Model {
        metadata: ModelMetadata {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            description: description.to_string(),
            category: Some(Categories::One(category.to_string())),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        },
        layers: vec![],
        edges: vec![],
    }
}

#[test]
fn loads_fixture_directory() {
    let registry = fixtures();
    assert_eq!(registry.len(), 2);
    assert!(registry.get_model_by_name("lenet5").is_some());
    assert!(registry.get_model_by_name("resnet-block").is_some());
    assert!(registry.get_model_by_name("vgg16").is_none());
}

#[test]
fn categories_are_sorted_behind_all() {
    assert_eq!(fixtures().all_categories(), [ALL_CATEGORY, "CNN", "ResNet"]);
}

#[test]
fn tags_are_unique_and_sorted() {
    assert_eq!(fixtures().all_tags(), ["CNN", "MNIST", "classic", "residual"]);
}

#[test]
fn search_filters_compose() {
    let registry = fixtures();
    assert_eq!(names(&registry.search("", None, &[])).len(), 2);
    assert_eq!(names(&registry.search("", Some(ALL_CATEGORY), &[])).len(), 2);
    assert_eq!(
        names(&registry.search("", Some("ResNet"), &[])),
        ["resnet-block"]
    );
    assert_eq!(names(&registry.search("LENET", None, &[])), ["lenet5"]);
    assert_eq!(
        names(&registry.search("", None, &["CNN", "MNIST"])),
        ["lenet5"]
    );
    assert!(registry.search("", Some("RNN"), &[]).is_empty());
    assert!(registry.search("lenet", Some("ResNet"), &[]).is_empty());
}

#[test]
fn query_matches_description_and_tags() {
    let registry: ModelRegistry = [
        model("alexnet", "ImageNet winner", "CNN", &["vision"]),
        model("bert", "Bidirectional transformer encoder", "Transformer", &["nlp"]),
    ]
    .into_iter()
    .collect();

    assert_eq!(names(&registry.search("imagenet", None, &[])), ["alexnet"]);
    assert_eq!(names(&registry.search("NLP", None, &[])), ["bert"]);
    assert_eq!(names(&registry.search("  imagenet \t", None, &[])), ["alexnet"]);
    assert!(registry.search("speech", None, &[]).is_empty());
    assert_eq!(names(&registry.search("", None, &["nlp"])), ["bert"]);
}

#[test]
fn later_insert_replaces_same_name() {
    let mut registry = ModelRegistry::new();
    registry.insert(model("net", "first", "CNN", &[]));
    registry.insert(model("net", "second", "RNN", &[]));
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.get_model_by_name("net").unwrap().metadata.description,
        "second"
    );
    assert_eq!(registry.all_categories(), [ALL_CATEGORY, "RNN"]);
}

#[test]
fn load_dir_reports_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    assert!(ModelRegistry::load_dir(dir.path()).is_err());

    std::fs::remove_file(dir.path().join("broken.json")).unwrap();
    assert!(ModelRegistry::load_dir(dir.path()).unwrap().is_empty());
}
