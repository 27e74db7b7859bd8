use neuron_canvas::factory::{
    available_node_types, create_branch, create_layer, create_node_by_type,
};
use neuron_canvas::model::{AttentionParams, LayerKind, LayerType, PoolParams, Shape};
use neuron_canvas::Error;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

#[test]
fn palette_lists_every_type_once() {
    let types = available_node_types();
    assert_eq!(types.len(), 22);
    let unique: HashSet<_> = types.iter().collect();
    assert_eq!(unique.len(), types.len());
    assert_eq!(types[0], LayerType::Input);
}

#[test]
fn created_layers_match_their_type() {
    for &t in available_node_types() {
        let layer = create_node_by_type(t.as_str()).unwrap();
        assert_eq!(layer.layer_type(), t);
        assert!(layer.id.starts_with(&format!("layer_{}_", t.as_str())), "{}", layer.id);
        assert_eq!(layer.name, t.display_name());
        assert!(layer.description.is_some());
        assert!(matches!(layer.output_shape, Some(Shape::Flat(_))));
    }
}

#[test]
fn defaults_for_parameterized_layers() {
    assert_eq!(
        create_layer(LayerType::Conv2d).kind,
        LayerKind::Conv2d {
            filters: 32,
            kernel_size: [3, 3],
            stride: [1, 1],
            padding: [1, 1],
            activation: None,
        }
    );
    assert_eq!(
        create_layer(LayerType::MaxPool2d).kind,
        LayerKind::MaxPool2d(PoolParams {
            pool_size: [2, 2],
            stride: [2, 2],
            padding: [0, 0],
        })
    );
    assert_eq!(
        create_layer(LayerType::SelfAttention).kind,
        LayerKind::SelfAttention(AttentionParams {
            num_heads: 8,
            head_dim: 64,
            model_dim: 512,
        })
    );
    assert_eq!(
        create_layer(LayerType::Dropout).kind,
        LayerKind::Dropout { rate: 0.5 }
    );
    assert_eq!(
        create_layer(LayerType::Embedding).output_shape,
        Some(Shape::Flat(vec![64, 100, 128]))
    );
}

#[test]
fn composites_start_empty() {
    assert_eq!(
        create_layer(LayerType::Sequential).kind,
        LayerKind::Sequential { steps: vec![] }
    );
    assert_eq!(
        create_layer(LayerType::Parallel).kind,
        LayerKind::Parallel { branches: vec![] }
    );
    assert_eq!(create_branch(2).name, "分支 3");
}

#[test]
fn ids_are_unique_across_rapid_creation() {
    let ids: HashSet<_> = (0..500)
        .map(|_| create_layer(LayerType::Relu).id)
        .collect();
    assert_eq!(ids.len(), 500);
}

#[test]
fn unknown_type_is_rejected() {
    let err = create_node_by_type("lstm").unwrap_err();
    assert!(matches!(err, Error::UnknownLayerType { ref layer_type } if layer_type == "lstm"));
    assert_eq!(err.to_string(), "Unknown layer type: lstm");
}
