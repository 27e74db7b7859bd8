//! Node factory: fresh layers with default parameters and unique ids.

use crate::error::Result;
use crate::model::{
    AttentionParams, Layer, LayerKind, LayerType, ParallelBranch, PoolParams, Shape,
};
use std::sync::atomic::{AtomicU64, Ordering};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn id_suffix() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}_{seq}_{}", &random[..7])
}

/// Returns an id of the form `layer_<type>_<millis>_<seq>_<random>`.
///
/// The sequence number is process-wide, so ids stay unique even when several layers are created
/// within the same millisecond.
pub fn generate_node_id(layer_type: LayerType) -> String {
    format!("layer_{}_{}", layer_type.as_str(), id_suffix())
}

pub fn generate_branch_id() -> String {
    format!("branch_{}", id_suffix())
}

/// Palette order.
pub fn available_node_types() -> &'static [LayerType] {
    &LayerType::ALL
}

/// Creates a layer from its `type` tag.
pub fn create_node_by_type(layer_type: &str) -> Result<Layer> {
    let layer_type: LayerType = layer_type.parse()?;
    Ok(create_layer(layer_type))
}

pub fn create_layer(layer_type: LayerType) -> Layer {
    let (kind, description, output_shape): (LayerKind, &str, &[i64]) = match layer_type {
        LayerType::Input => (LayerKind::Input, "输入层", &[64, 1, 32, 32]),
        LayerType::Embedding => (
            LayerKind::Embedding { dimension: 128 },
            "嵌入层",
            &[64, 100, 128],
        ),
        LayerType::Flatten => (LayerKind::Flatten, "展平层", &[64, 8192]),
        LayerType::Linear => (
            LayerKind::Linear {
                in_features: None,
                out_features: None,
                activation: None,
            },
            "全连接层",
            &[64, 64],
        ),
        LayerType::Conv2d => (
            LayerKind::Conv2d {
                filters: 32,
                kernel_size: [3, 3],
                stride: [1, 1],
                padding: [1, 1],
                activation: None,
            },
            "2D卷积层",
            &[64, 32, 32, 32],
        ),
        LayerType::MaxPool2d => (
            LayerKind::MaxPool2d(PoolParams::default()),
            "最大池化层",
            &[64, 32, 16, 16],
        ),
        LayerType::AvgPool2d => (
            LayerKind::AvgPool2d(PoolParams::default()),
            "平均池化层",
            &[64, 32, 16, 16],
        ),
        LayerType::AdaptiveAvgPool2d => (
            LayerKind::AdaptiveAvgPool2d { output_size: None },
            "自适应平均池化层",
            &[64, 32, 1, 1],
        ),
        LayerType::BatchNorm => (
            LayerKind::BatchNorm {
                num_features: None,
                momentum: None,
                epsilon: None,
            },
            "批归一化层",
            &[64, 32, 32, 32],
        ),
        LayerType::LayerNorm => (
            LayerKind::LayerNorm {
                normalized_shape: None,
                epsilon: None,
            },
            "层归一化层",
            &[64, 128],
        ),
        LayerType::Lrn => (
            LayerKind::Lrn {
                size: None,
                alpha: None,
                beta: None,
                k: None,
            },
            "局部响应归一化层",
            &[64, 32, 32, 32],
        ),
        LayerType::Relu => (LayerKind::Relu, "ReLU激活函数", &[64, 32, 32, 32]),
        LayerType::Sigmoid => (LayerKind::Sigmoid, "Sigmoid激活函数", &[64, 128]),
        LayerType::Tanh => (LayerKind::Tanh, "Tanh激活函数", &[64, 32, 32, 32]),
        LayerType::Softmax => (
            LayerKind::Softmax { dim: None },
            "Softmax激活函数",
            &[64, 10],
        ),
        LayerType::Dropout => (
            LayerKind::Dropout { rate: 0.5 },
            "Dropout层",
            &[64, 128],
        ),
        LayerType::Add => (
            LayerKind::Add,
            "加法层（用于残差连接）",
            &[64, 32, 32, 32],
        ),
        LayerType::Concat => (
            LayerKind::Concat { axis: None },
            "拼接层",
            &[64, 64, 32, 32],
        ),
        LayerType::Sequential => return create_sequential_layer(),
        LayerType::Parallel => return create_parallel_layer(),
        LayerType::SelfAttention => (
            LayerKind::SelfAttention(AttentionParams::default()),
            "自注意力层",
            &[64, 100, 512],
        ),
        LayerType::CrossAttention => (
            LayerKind::CrossAttention(AttentionParams::default()),
            "交叉注意力层",
            &[64, 100, 512],
        ),
    };
    build(layer_type, kind, description, output_shape)
}

pub fn create_sequential_layer() -> Layer {
    build(
        LayerType::Sequential,
        LayerKind::Sequential { steps: Vec::new() },
        "顺序模块",
        &[64, 32, 32],
    )
}

pub fn create_parallel_layer() -> Layer {
    build(
        LayerType::Parallel,
        LayerKind::Parallel {
            branches: Vec::new(),
        },
        "并行模块",
        &[64, 32, 32],
    )
}

/// An empty branch named after its position (`分支 1`, `分支 2`, ...).
pub fn create_branch(index: usize) -> ParallelBranch {
    ParallelBranch {
        id: generate_branch_id(),
        name: format!("分支 {}", index + 1),
        steps: Vec::new(),
    }
}

fn build(layer_type: LayerType, kind: LayerKind, description: &str, output_shape: &[i64]) -> Layer {
    Layer {
        id: generate_node_id(layer_type),
        name: layer_type.display_name().to_string(),
        description: Some(description.to_string()),
        input_shape: None,
        output_shape: Some(Shape::Flat(output_shape.to_vec())),
        kind,
    }
}

/// Gives `layer` and everything nested in it fresh ids.
pub fn regenerate_ids(layer: &mut Layer) {
    layer.id = generate_node_id(layer.layer_type());
    match &mut layer.kind {
        LayerKind::Sequential { steps } => steps.iter_mut().for_each(regenerate_ids),
        LayerKind::Parallel { branches } => {
            for branch in branches {
                branch.id = generate_branch_id();
                branch.steps.iter_mut().for_each(regenerate_ids);
            }
        }
        _ => {}
    }
}
