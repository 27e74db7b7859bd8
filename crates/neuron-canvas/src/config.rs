//! Sandbox and layout configuration.
//!
//! Both structs deserialize from partial JSON: missing fields fall back to the defaults, and
//! [`SandboxConfig::merged`] deep-merges an override document over an existing config.

use crate::error::Result;
use crate::model::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use tapir::RankDir;

pub const DEFAULT_STORAGE_KEY: &str = "neuroncanvas_sandbox_data";
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub direction: RankDir,
    pub node_width: f64,
    pub node_height: f64,
    pub rank_sep: f64,
    pub node_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: RankDir::LR,
            node_width: 240.0,
            node_height: 120.0,
            rank_sep: 100.0,
            node_sep: 150.0,
            margin_x: 120.0,
            margin_y: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Maximum number of history snapshots kept for undo/redo.
    pub history_capacity: usize,
    /// Quiet period after the last commit before the session autosaves.
    pub autosave_debounce_ms: u64,
    pub storage_key: String,
    /// Flow position used when a palette entry is clicked instead of dragged.
    pub palette_drop_position: Point,
    pub layout: LayoutConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            autosave_debounce_ms: DEFAULT_AUTOSAVE_DEBOUNCE_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            palette_drop_position: Point::new(400.0, 300.0),
            layout: LayoutConfig::default(),
        }
    }
}

impl SandboxConfig {
    /// Builds a config from a (possibly partial) JSON document.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::default().merged(value)
    }

    /// Returns a copy of `self` with `overrides` deep-merged on top.
    pub fn merged(&self, overrides: &Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        deep_merge_value(&mut base, overrides);
        let mut merged: Self = serde_json::from_value(base)?;
        if merged.history_capacity == 0 {
            merged.history_capacity = 1;
        }
        Ok(merged)
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}
