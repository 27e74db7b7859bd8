//! Graph data model: layers, edges, model metadata and node positions.
//!
//! Layers serialize to flat JSON objects. The common fields (`id`, `name`, ...) sit next to a
//! `type` discriminant and the kind-specific parameters:
//!
//! ```json
//! { "id": "c1", "name": "C1", "type": "conv2d", "filters": 6, "kernelSize": [5, 5] }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use tapir::Point;

/// User-visible node positions (top-left corner), keyed by layer id.
pub type NodePositions = IndexMap<String, Point>;

/// Tensor shape annotation: either a single shape or one shape per input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Shape {
    Flat(Vec<i64>),
    Nested(Vec<Vec<i64>>),
}

impl From<Vec<i64>> for Shape {
    fn from(dims: Vec<i64>) -> Self {
        Shape::Flat(dims)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<Shape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_shape: Option<Shape>,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            input_shape: None,
            output_shape: None,
            kind,
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.kind.layer_type()
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            LayerKind::Sequential { .. } | LayerKind::Parallel { .. }
        )
    }

    /// Number of layers nested below this one, at any depth.
    pub fn descendant_count(&self) -> usize {
        match &self.kind {
            LayerKind::Sequential { steps } => steps.iter().map(|s| 1 + s.descendant_count()).sum(),
            LayerKind::Parallel { branches } => branches
                .iter()
                .flat_map(|b| b.steps.iter())
                .map(|s| 1 + s.descendant_count())
                .sum(),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelBranch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Layer>,
}

/// A 2-D window dimension written either as `n` (square) or `[h, w]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarOrPair {
    Scalar(u32),
    Pair([u32; 2]),
}

fn scalar_or_pair<'de, D>(deserializer: D) -> Result<[u32; 2], D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ScalarOrPair::deserialize(deserializer)? {
        ScalarOrPair::Scalar(n) => [n, n],
        ScalarOrPair::Pair(pair) => pair,
    })
}

fn default_kernel() -> [u32; 2] {
    [3, 3]
}

fn default_stride() -> [u32; 2] {
    [1, 1]
}

fn default_padding() -> [u32; 2] {
    [0, 0]
}

fn default_pool() -> [u32; 2] {
    [2, 2]
}

fn default_dropout_rate() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolParams {
    #[serde(default = "default_pool", deserialize_with = "scalar_or_pair")]
    pub pool_size: [u32; 2],
    #[serde(default = "default_pool", deserialize_with = "scalar_or_pair")]
    pub stride: [u32; 2],
    #[serde(default = "default_padding", deserialize_with = "scalar_or_pair")]
    pub padding: [u32; 2],
}

impl Default for PoolParams {
    fn default() -> Self {
        Self {
            pool_size: default_pool(),
            stride: default_pool(),
            padding: default_padding(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionParams {
    pub num_heads: u32,
    pub head_dim: u32,
    pub model_dim: u32,
}

impl Default for AttentionParams {
    fn default() -> Self {
        Self {
            num_heads: 8,
            head_dim: 64,
            model_dim: 512,
        }
    }
}

/// `adaptiveavgpool2d` target size: a square side or `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSize {
    Square(u32),
    Rect([u32; 2]),
}

/// Kind-specific payload of a [`Layer`], tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum LayerKind {
    #[serde(rename = "input")]
    Input,
    #[serde(rename = "embedding")]
    Embedding { dimension: u32 },
    #[serde(rename = "flatten")]
    Flatten,
    #[serde(rename = "linear")]
    Linear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        in_features: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        out_features: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        activation: Option<String>,
    },
    #[serde(rename = "conv2d")]
    Conv2d {
        filters: u32,
        #[serde(default = "default_kernel", deserialize_with = "scalar_or_pair")]
        kernel_size: [u32; 2],
        #[serde(default = "default_stride", deserialize_with = "scalar_or_pair")]
        stride: [u32; 2],
        #[serde(default = "default_padding", deserialize_with = "scalar_or_pair")]
        padding: [u32; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        activation: Option<String>,
    },
    #[serde(rename = "maxpool2d")]
    MaxPool2d(PoolParams),
    #[serde(rename = "avgpool2d")]
    AvgPool2d(PoolParams),
    #[serde(rename = "adaptiveavgpool2d")]
    AdaptiveAvgPool2d {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_size: Option<OutputSize>,
    },
    #[serde(rename = "batchnorm")]
    BatchNorm {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_features: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        momentum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epsilon: Option<f64>,
    },
    #[serde(rename = "layernorm")]
    LayerNorm {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        normalized_shape: Option<Vec<i64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epsilon: Option<f64>,
    },
    #[serde(rename = "lrn")]
    Lrn {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alpha: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        beta: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        k: Option<f64>,
    },
    #[serde(rename = "relu")]
    Relu,
    #[serde(rename = "sigmoid")]
    Sigmoid,
    #[serde(rename = "tanh")]
    Tanh,
    #[serde(rename = "softmax")]
    Softmax {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dim: Option<i32>,
    },
    #[serde(rename = "dropout")]
    Dropout {
        #[serde(default = "default_dropout_rate")]
        rate: f64,
    },
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "concat")]
    Concat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        axis: Option<i32>,
    },
    #[serde(rename = "sequential")]
    Sequential {
        #[serde(default)]
        steps: Vec<Layer>,
    },
    #[serde(rename = "parallel")]
    Parallel {
        #[serde(default)]
        branches: Vec<ParallelBranch>,
    },
    #[serde(rename = "self-attention")]
    SelfAttention(AttentionParams),
    #[serde(rename = "cross-attention")]
    CrossAttention(AttentionParams),
}

impl LayerKind {
    pub fn layer_type(&self) -> LayerType {
        match self {
            LayerKind::Input => LayerType::Input,
            LayerKind::Embedding { .. } => LayerType::Embedding,
            LayerKind::Flatten => LayerType::Flatten,
            LayerKind::Linear { .. } => LayerType::Linear,
            LayerKind::Conv2d { .. } => LayerType::Conv2d,
            LayerKind::MaxPool2d(_) => LayerType::MaxPool2d,
            LayerKind::AvgPool2d(_) => LayerType::AvgPool2d,
            LayerKind::AdaptiveAvgPool2d { .. } => LayerType::AdaptiveAvgPool2d,
            LayerKind::BatchNorm { .. } => LayerType::BatchNorm,
            LayerKind::LayerNorm { .. } => LayerType::LayerNorm,
            LayerKind::Lrn { .. } => LayerType::Lrn,
            LayerKind::Relu => LayerType::Relu,
            LayerKind::Sigmoid => LayerType::Sigmoid,
            LayerKind::Tanh => LayerType::Tanh,
            LayerKind::Softmax { .. } => LayerType::Softmax,
            LayerKind::Dropout { .. } => LayerType::Dropout,
            LayerKind::Add => LayerType::Add,
            LayerKind::Concat { .. } => LayerType::Concat,
            LayerKind::Sequential { .. } => LayerType::Sequential,
            LayerKind::Parallel { .. } => LayerType::Parallel,
            LayerKind::SelfAttention(_) => LayerType::SelfAttention,
            LayerKind::CrossAttention(_) => LayerType::CrossAttention,
        }
    }
}

/// Discriminant of [`LayerKind`], used by the palette, the factory and the layout adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerType {
    Input,
    Embedding,
    Flatten,
    Linear,
    Conv2d,
    MaxPool2d,
    AvgPool2d,
    AdaptiveAvgPool2d,
    BatchNorm,
    LayerNorm,
    Lrn,
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
    Dropout,
    Add,
    Concat,
    Sequential,
    Parallel,
    SelfAttention,
    CrossAttention,
}

impl LayerType {
    /// Every layer type, in palette order.
    pub const ALL: [LayerType; 22] = [
        LayerType::Input,
        LayerType::Embedding,
        LayerType::Flatten,
        LayerType::Linear,
        LayerType::Conv2d,
        LayerType::MaxPool2d,
        LayerType::AvgPool2d,
        LayerType::AdaptiveAvgPool2d,
        LayerType::BatchNorm,
        LayerType::LayerNorm,
        LayerType::Lrn,
        LayerType::Relu,
        LayerType::Sigmoid,
        LayerType::Tanh,
        LayerType::Softmax,
        LayerType::Dropout,
        LayerType::Add,
        LayerType::Concat,
        LayerType::Sequential,
        LayerType::Parallel,
        LayerType::SelfAttention,
        LayerType::CrossAttention,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Input => "input",
            LayerType::Embedding => "embedding",
            LayerType::Flatten => "flatten",
            LayerType::Linear => "linear",
            LayerType::Conv2d => "conv2d",
            LayerType::MaxPool2d => "maxpool2d",
            LayerType::AvgPool2d => "avgpool2d",
            LayerType::AdaptiveAvgPool2d => "adaptiveavgpool2d",
            LayerType::BatchNorm => "batchnorm",
            LayerType::LayerNorm => "layernorm",
            LayerType::Lrn => "lrn",
            LayerType::Relu => "relu",
            LayerType::Sigmoid => "sigmoid",
            LayerType::Tanh => "tanh",
            LayerType::Softmax => "softmax",
            LayerType::Dropout => "dropout",
            LayerType::Add => "add",
            LayerType::Concat => "concat",
            LayerType::Sequential => "sequential",
            LayerType::Parallel => "parallel",
            LayerType::SelfAttention => "self-attention",
            LayerType::CrossAttention => "cross-attention",
        }
    }

    /// Localized default name given to freshly created layers.
    pub fn display_name(self) -> &'static str {
        match self {
            LayerType::Input => "输入层",
            LayerType::Embedding => "嵌入层",
            LayerType::Flatten => "展平层",
            LayerType::Linear => "全连接层",
            LayerType::Conv2d => "卷积层",
            LayerType::MaxPool2d => "最大池化层",
            LayerType::AvgPool2d => "平均池化层",
            LayerType::AdaptiveAvgPool2d => "自适应平均池化层",
            LayerType::BatchNorm => "批归一化层",
            LayerType::LayerNorm => "层归一化层",
            LayerType::Lrn => "局部响应归一化层",
            LayerType::Relu => "ReLU激活",
            LayerType::Sigmoid => "Sigmoid激活",
            LayerType::Tanh => "Tanh激活",
            LayerType::Softmax => "Softmax激活",
            LayerType::Dropout => "Dropout层",
            LayerType::Add => "加法层",
            LayerType::Concat => "拼接层",
            LayerType::Sequential => "顺序模块",
            LayerType::Parallel => "并行模块",
            LayerType::SelfAttention => "自注意力层",
            LayerType::CrossAttention => "交叉注意力层",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayerType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for LayerType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayerType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownLayerType {
                layer_type: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Rendering tag such as `normal` or `residual`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
            edge_type: None,
            animated: None,
        }
    }

    pub fn connects(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }

    pub fn touches(&self, layer_id: &str) -> bool {
        self.source == layer_id || self.target == layer_id
    }
}

/// A model category: registry files use either a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Categories {
    One(String),
    Many(Vec<String>),
}

impl Categories {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Categories::One(c) => std::slice::from_ref(c),
            Categories::Many(cs) => cs,
        };
        slice.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Categories>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            name: "untitled".to_string(),
            display_name: "未命名模型".to_string(),
            description: String::new(),
            year: None,
            authors: None,
            paper: None,
            paper_title: None,
            citations: None,
            tags: None,
            category: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub metadata: ModelMetadata,
    pub layers: Vec<Layer>,
    pub edges: Vec<Edge>,
}
