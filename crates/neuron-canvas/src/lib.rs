#![forbid(unsafe_code)]

//! Layer graphs for neural network diagrams, their automatic layout, and the editing state of
//! the sandbox canvas.
//!
//! - [`model`]: layers (a tagged sum over the supported kinds), edges and model metadata
//! - [`layout`]: node sizing and layered layout on top of `tapir`
//! - [`store`]: the editable graph with undo/redo, clipboard, selection and dialogs
//! - [`canvas`] / [`shortcuts`]: gesture and keyboard translation into store operations
//! - [`session`]: store + storage + debounced autosave

pub mod canvas;
pub mod clipboard;
pub mod codec;
mod composite;
pub mod config;
pub mod error;
pub mod factory;
pub mod history;
pub mod layout;
pub mod model;
pub mod registry;
pub mod session;
pub mod shortcuts;
pub mod storage;
pub mod store;
pub mod ui;

pub use canvas::{Canvas, Viewport};
pub use codec::{export_to_json, generate_export_filename, import_from_json};
pub use config::{LayoutConfig, SandboxConfig};
pub use error::{Error, Result};
pub use factory::{create_layer, create_node_by_type};
pub use layout::{LayoutResult, calculate_layout, merge_positions};
pub use model::{Edge, Layer, LayerKind, LayerType, Model, ModelMetadata, NodePositions, Point};
pub use registry::ModelRegistry;
pub use session::EditorSession;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{Commit, CommitHook, LayerPatch, SandboxStore};
