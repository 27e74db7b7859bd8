use neuron_canvas::codec::{export_to_json, import_from_json};
use neuron_canvas::factory::create_layer;
use neuron_canvas::model::{Categories, Edge, LayerKind, LayerType, Model, OutputSize, Shape};
use neuron_canvas::Error;
use pretty_assertions::assert_eq;
use serde_json::json;

fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

#[test]
fn fixtures_round_trip() {
    for name in ["lenet5.json", "residual_block.json"] {
        let model = import_from_json(&fixture(name)).unwrap();
        let text = export_to_json(&model).unwrap();
        assert_eq!(import_from_json(&text).unwrap(), model, "{name}");
        // Export is stable once normalized.
        assert_eq!(export_to_json(&import_from_json(&text).unwrap()).unwrap(), text);
    }
}

#[test]
fn every_factory_layer_round_trips() {
    let layers: Vec<_> = LayerType::ALL.iter().map(|t| create_layer(*t)).collect();
    let mut edges = Vec::new();
    for pair in layers.windows(2) {
        let mut e = Edge::new(format!("{}-{}", pair[0].id, pair[1].id), &pair[0].id, &pair[1].id);
        e.label = Some("flow".into());
        e.animated = Some(false);
        edges.push(e);
    }
    let model = Model {
        metadata: Default::default(),
        layers,
        edges,
    };
    let back = import_from_json(&export_to_json(&model).unwrap()).unwrap();
    assert_eq!(back, model);
}

#[test]
fn fixture_fields_are_typed() {
    let model = import_from_json(&fixture("residual_block.json")).unwrap();
    assert_eq!(
        model.metadata.category,
        Some(Categories::Many(vec!["CNN".into(), "ResNet".into()]))
    );
    let pool = model.layers.iter().find(|l| l.id == "pool").unwrap();
    assert_eq!(
        pool.kind,
        LayerKind::AdaptiveAvgPool2d {
            output_size: Some(OutputSize::Square(1))
        }
    );
    let input = &model.layers[0];
    assert_eq!(input.output_shape, Some(Shape::Flat(vec![64, 3, 224, 224])));
    let skip = model.edges.iter().find(|e| e.id == "e5").unwrap();
    assert_eq!(skip.edge_type.as_deref(), Some("residual"));
    assert_eq!(skip.label.as_deref(), Some("skip"));
}

#[test]
fn export_is_pretty_and_camel_cased() {
    let model = import_from_json(&fixture("lenet5.json")).unwrap();
    let text = export_to_json(&model).unwrap();
    assert!(text.contains("\n  \"metadata\": {"));
    assert!(text.contains("\"displayName\": \"LeNet-5\""));
    assert!(text.contains("\"kernelSize\": ["));
    assert!(!text.contains("kernel_size"));
}

#[test]
fn missing_arrays_are_reported_by_name() {
    let err = import_from_json(r#"{"foo": 1}"#).unwrap_err();
    assert!(matches!(err, Error::InvalidModelFormat { .. }));
    assert!(err.to_string().contains("layers"), "{err}");

    let err = import_from_json(r#"{"layers": []}"#).unwrap_err();
    assert!(err.to_string().contains("edges"), "{err}");

    let err = import_from_json(r#"{"layers": {}, "edges": []}"#).unwrap_err();
    assert!(err.to_string().contains("layers"), "{err}");
}

#[test]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(import_from_json("{ not json"), Err(Error::Json(_))));
}

#[test]
fn unknown_layer_kinds_are_invalid_format() {
    let text = json!({
        "layers": [{ "id": "x", "name": "X", "type": "lstm" }],
        "edges": []
    })
    .to_string();
    assert!(matches!(
        import_from_json(&text),
        Err(Error::InvalidModelFormat { .. })
    ));
}

#[test]
fn metadata_is_optional_on_import() {
    let model = import_from_json(r#"{"layers": [], "edges": []}"#).unwrap();
    assert_eq!(model.metadata.name, "untitled");
}

#[test]
fn scalar_window_sizes_widen_to_pairs() {
    let text = json!({
        "layers": [
            { "id": "c", "name": "C", "type": "conv2d", "filters": 16, "kernelSize": 5, "stride": 2 },
            { "id": "p", "name": "P", "type": "maxpool2d", "poolSize": 3, "padding": [1, 0] }
        ],
        "edges": []
    })
    .to_string();
    let model = import_from_json(&text).unwrap();
    assert_eq!(
        model.layers[0].kind,
        LayerKind::Conv2d {
            filters: 16,
            kernel_size: [5, 5],
            stride: [2, 2],
            padding: [0, 0],
            activation: None,
        }
    );
    let LayerKind::MaxPool2d(pool) = &model.layers[1].kind else {
        panic!("expected maxpool2d, got {:?}", model.layers[1].kind);
    };
    assert_eq!(pool.pool_size, [3, 3]);
    assert_eq!(pool.stride, [2, 2]);
    assert_eq!(pool.padding, [1, 0]);

    let exported = export_to_json(&model).unwrap();
    assert!(exported.contains("\"kernelSize\": [\n"), "{exported}");
}
