//! Label types carried by layout graphs.

use crate::graphlib::EdgeKey;
use serde::{Deserialize, Serialize};

/// Direction in which ranks advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

impl RankDir {
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LR | RankDir::RL)
    }
}

impl std::str::FromStr for RankDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(RankDir::TB),
            "BT" => Ok(RankDir::BT),
            "LR" => Ok(RankDir::LR),
            "RL" => Ok(RankDir::RL),
            other => Err(format!("unknown rank direction `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphLabel {
    pub rankdir: RankDir,
    /// Gap between neighbouring nodes of the same rank.
    pub nodesep: f64,
    /// Gap between neighbouring ranks.
    pub ranksep: f64,
    /// Gap reserved around edge dummies inside a rank.
    pub edgesep: f64,
    pub marginx: f64,
    pub marginy: f64,
    /// Number of cross-axis refinement rounds.
    pub position_iterations: usize,

    /// Output: extent of the laid out drawing, margins included.
    pub width: f64,
    pub height: f64,

    pub dummy_chains: Vec<String>,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            nodesep: 50.0,
            ranksep: 50.0,
            edgesep: 20.0,
            marginx: 0.0,
            marginy: 0.0,
            position_iterations: 8,
            width: 0.0,
            height: 0.0,
            dummy_chains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    /// Center of the node once laid out.
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rank: Option<i32>,
    pub order: Option<usize>,

    pub dummy: bool,
    pub edge_label: Option<EdgeLabel>,
    pub edge_obj: Option<EdgeKey>,
}

impl NodeLabel {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    /// Minimum number of ranks between the endpoints.
    pub minlen: usize,
    pub weight: f64,
    pub reversed: bool,
    pub forward_name: Option<String>,
    pub points: Vec<Point>,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            minlen: 1,
            weight: 1.0,
            reversed: false,
            forward_name: None,
            points: Vec::new(),
        }
    }
}
