//! Sandbox store: the editable model graph plus the visual state kept consistent with it.
//!
//! Mutations run inside edit transactions. A transaction that changed something commits
//! exactly one history snapshot, marks the store dirty, bumps the revision and notifies the
//! registered [`CommitHook`]s. Mutations that would break an invariant (duplicate edge,
//! unknown id, empty clipboard, ...) are silent no-ops and leave history untouched.

use crate::clipboard::Clipboard;
use crate::config::SandboxConfig;
use crate::history::{History, HistorySnapshot};
use crate::model::{Edge, Layer, LayerKind, Model, ModelMetadata, NodePositions, Point, Shape};
use crate::ui::{ConfirmDialog, ContextMenu, PendingAction, UiState};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;

/// Emitted once per committed transaction, and once per undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub revision: u64,
    /// Name of the first store operation that changed state in the transaction.
    pub action: &'static str,
    /// `false` for undo/redo, which move through history instead of recording.
    pub recorded: bool,
}

/// Observer run synchronously after each commit.
pub trait CommitHook {
    fn on_commit(&mut self, commit: &Commit);
}

impl<F> CommitHook for F
where
    F: FnMut(&Commit),
{
    fn on_commit(&mut self, commit: &Commit) {
        self(commit)
    }
}

/// Partial update of a layer. `None` leaves a field alone.
///
/// `kind` replaces the kind-specific parameters and must keep the layer type; the id is not
/// patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub input_shape: Option<Option<Shape>>,
    pub output_shape: Option<Option<Shape>>,
    pub kind: Option<LayerKind>,
}

impl LayerPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn kind(kind: LayerKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_output_shape(mut self, shape: Option<Shape>) -> Self {
        self.output_shape = Some(shape);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn apply(self, layer: &mut Layer) -> bool {
        let before = layer.clone();
        if let Some(name) = self.name {
            layer.name = name;
        }
        if let Some(description) = self.description {
            layer.description = description;
        }
        if let Some(shape) = self.input_shape {
            layer.input_shape = shape;
        }
        if let Some(shape) = self.output_shape {
            layer.output_shape = shape;
        }
        if let Some(kind) = self.kind {
            layer.kind = kind;
        }
        *layer != before
    }
}

pub struct SandboxStore {
    config: SandboxConfig,

    pub(crate) layers: Vec<Layer>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) metadata: Option<ModelMetadata>,
    pub(crate) node_positions: NodePositions,
    selected_node_ids: Vec<String>,

    clipboard: Clipboard,
    pub(crate) history: History,
    ui: UiState,

    pub(crate) last_saved: Option<DateTime<Utc>>,
    pub(crate) needs_save: bool,
    revision: u64,

    edit_depth: usize,
    edit_action: Option<&'static str>,
    pending_baseline: Option<HistorySnapshot>,
    hooks: Vec<Box<dyn CommitHook>>,
}

impl std::fmt::Debug for SandboxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxStore")
            .field("layers", &self.layers.len())
            .field("edges", &self.edges.len())
            .field("selected_node_ids", &self.selected_node_ids)
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("needs_save", &self.needs_save)
            .field("revision", &self.revision)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Default for SandboxStore {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}

impl SandboxStore {
    pub fn new(config: SandboxConfig) -> Self {
        let history = History::new(config.history_capacity);
        Self {
            config,
            layers: Vec::new(),
            edges: Vec::new(),
            metadata: None,
            node_positions: NodePositions::new(),
            selected_node_ids: Vec::new(),
            clipboard: Clipboard::default(),
            history,
            ui: UiState::default(),
            last_saved: None,
            needs_save: false,
            revision: 0,
            edit_depth: 0,
            edit_action: None,
            pending_baseline: None,
            hooks: Vec::new(),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn node_positions(&self) -> &NodePositions {
        &self.node_positions
    }

    pub fn selected_node_ids(&self) -> &[String] {
        &self.selected_node_ids
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn needs_save(&self) -> bool {
        self.needs_save
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Increases on every commit, undo and redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.edges.is_empty()
    }

    pub fn add_commit_hook(&mut self, hook: impl CommitHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            layers: self.layers.clone(),
            edges: self.edges.clone(),
            node_positions: self.node_positions.clone(),
        }
    }

    // Transactions

    /// Opens (or nests into) an edit transaction.
    pub fn begin_edit(&mut self) {
        if self.edit_depth == 0 {
            self.edit_action = None;
            if self.history.is_empty() {
                self.pending_baseline = Some(self.snapshot());
            }
        }
        self.edit_depth += 1;
    }

    /// Closes the innermost transaction; the outermost one records a snapshot if anything
    /// changed.
    pub fn commit_edit(&mut self) {
        if self.edit_depth == 0 {
            tracing::debug!("commit_edit without matching begin_edit ignored");
            return;
        }
        self.edit_depth -= 1;
        if self.edit_depth > 0 {
            return;
        }
        let baseline = self.pending_baseline.take();
        let Some(action) = self.edit_action.take() else {
            return;
        };
        if let Some(baseline) = baseline {
            if self.history.is_empty() {
                self.history.push(baseline);
            }
        }
        self.history.push(self.snapshot());
        self.needs_save = true;
        self.revision += 1;
        self.notify(Commit {
            revision: self.revision,
            action,
            recorded: true,
        });
    }

    /// Runs `f` as one transaction.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_edit();
        let out = f(self);
        self.commit_edit();
        out
    }

    pub fn in_transaction(&self) -> bool {
        self.edit_depth > 0
    }

    /// Runs one mutation; `f` reports whether it changed anything.
    pub(crate) fn mutate(&mut self, action: &'static str, f: impl FnOnce(&mut Self) -> bool) -> bool {
        self.begin_edit();
        let changed = f(self);
        if changed && self.edit_action.is_none() {
            self.edit_action = Some(action);
        }
        self.commit_edit();
        changed
    }

    fn notify(&mut self, commit: Commit) {
        let mut hooks = std::mem::take(&mut self.hooks);
        for hook in &mut hooks {
            hook.on_commit(&commit);
        }
        hooks.append(&mut self.hooks);
        self.hooks = hooks;
    }

    /// Records the current state as a new history entry.
    pub fn push_to_history(&mut self) {
        self.history.push(self.snapshot());
    }

    // Layers

    /// Appends `layer`; a layer whose id is already on the canvas is ignored.
    pub fn add_layer(&mut self, layer: Layer) -> bool {
        self.mutate("add_layer", |s| {
            if s.has_layer(&layer.id) {
                tracing::debug!(id = %layer.id, "add_layer ignored: id already present");
                return false;
            }
            s.layers.push(layer);
            true
        })
    }

    pub fn update_layer(&mut self, id: &str, patch: LayerPatch) -> bool {
        self.mutate("update_layer", |s| {
            let Some(layer) = s.layers.iter_mut().find(|l| l.id == id) else {
                tracing::debug!(id, "update_layer ignored: no such layer");
                return false;
            };
            if let Some(kind) = &patch.kind {
                if kind.layer_type() != layer.layer_type() {
                    tracing::warn!(
                        id,
                        from = %layer.layer_type(),
                        to = %kind.layer_type(),
                        "update_layer rejected: layer type cannot change"
                    );
                    return false;
                }
            }
            patch.apply(layer)
        })
    }

    /// Applies `f` to the layer `id` as one committed mutation.
    pub(crate) fn modify_layer(
        &mut self,
        id: &str,
        action: &'static str,
        f: impl FnOnce(&mut Layer) -> bool,
    ) -> bool {
        self.mutate(action, |s| match s.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => f(layer),
            None => {
                tracing::debug!(id, action, "ignored: no such layer");
                false
            }
        })
    }

    /// Removes a layer together with its edges, position and selection entry.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        self.mutate("remove_layer", |s| {
            let before = s.layers.len();
            s.layers.retain(|l| l.id != id);
            if s.layers.len() == before {
                tracing::debug!(id, "remove_layer ignored: no such layer");
                return false;
            }
            s.edges.retain(|e| !e.touches(id));
            s.node_positions.shift_remove(id);
            s.selected_node_ids.retain(|sel| sel != id);
            true
        })
    }

    /// Replaces all layers; edges, positions and selection referring to dropped layers go too.
    pub fn set_layers(&mut self, layers: Vec<Layer>) -> bool {
        self.mutate("set_layers", |s| {
            if s.layers == layers {
                return false;
            }
            s.layers = dedupe_layers(layers);
            s.prune_dangling();
            true
        })
    }

    // Edges

    /// Adds an edge unless one already joins the same ordered pair or an endpoint is missing.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        self.mutate("add_edge", |s| {
            if s.edges.iter().any(|e| e.connects(&edge.source, &edge.target)) {
                tracing::debug!(
                    source = %edge.source,
                    target = %edge.target,
                    "add_edge ignored: duplicate connection"
                );
                return false;
            }
            if !s.has_layer(&edge.source) || !s.has_layer(&edge.target) {
                tracing::debug!(id = %edge.id, "add_edge ignored: endpoint missing");
                return false;
            }
            s.edges.push(edge);
            true
        })
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        self.mutate("remove_edge", |s| {
            let before = s.edges.len();
            s.edges.retain(|e| e.id != id);
            if s.edges.len() == before {
                tracing::debug!(id, "remove_edge ignored: no such edge");
                return false;
            }
            true
        })
    }

    pub fn remove_edges_by_node_id(&mut self, node_id: &str) -> bool {
        self.mutate("remove_edges_by_node_id", |s| {
            let before = s.edges.len();
            s.edges.retain(|e| !e.touches(node_id));
            s.edges.len() != before
        })
    }

    /// Replaces all edges, dropping duplicates and edges with missing endpoints.
    pub fn set_edges(&mut self, edges: Vec<Edge>) -> bool {
        self.mutate("set_edges", |s| {
            let edges = sanitize_edges(&s.layers, edges);
            if s.edges == edges {
                return false;
            }
            s.edges = edges;
            true
        })
    }

    // Positions

    /// Pins a layer at `position`.
    pub fn set_node_position(&mut self, id: &str, position: Point) -> bool {
        self.mutate("set_node_position", |s| {
            if !s.has_layer(id) {
                tracing::debug!(id, "set_node_position ignored: no such layer");
                return false;
            }
            if s.node_positions.get(id) == Some(&position) {
                return false;
            }
            s.node_positions.insert(id.to_string(), position);
            true
        })
    }

    pub fn clear_node_positions(&mut self) -> bool {
        self.mutate("clear_node_positions", |s| {
            if s.node_positions.is_empty() {
                return false;
            }
            s.node_positions.clear();
            true
        })
    }

    // Selection

    pub fn set_selected_node_ids(&mut self, ids: impl IntoIterator<Item = String>) {
        let mut seen = FxHashSet::default();
        let ids: Vec<String> = ids
            .into_iter()
            .filter(|id| self.has_layer(id))
            .filter(|id| seen.insert(id.clone()))
            .collect();
        self.selected_node_ids = ids;
    }

    pub fn add_selected_node_id(&mut self, id: &str) {
        if !self.has_layer(id) || self.is_selected(id) {
            return;
        }
        self.selected_node_ids.push(id.to_string());
    }

    pub fn remove_selected_node_id(&mut self, id: &str) {
        self.selected_node_ids.retain(|sel| sel != id);
    }

    pub fn toggle_selected_node_id(&mut self, id: &str) {
        if self.is_selected(id) {
            self.remove_selected_node_id(id);
        } else {
            self.add_selected_node_id(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_node_ids.clear();
    }

    pub fn select_all(&mut self) {
        self.selected_node_ids = self.layers.iter().map(|l| l.id.clone()).collect();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_node_ids.iter().any(|sel| sel == id)
    }

    // Clipboard

    pub fn copy_to_clipboard(&mut self, layer: &Layer) {
        self.clipboard.copy(layer);
    }

    /// Copies the layer `id`; returns `false` when it does not exist.
    pub fn copy_layer_to_clipboard(&mut self, id: &str) -> bool {
        let Some(layer) = self.layer(id).cloned() else {
            tracing::debug!(id, "copy ignored: no such layer");
            return false;
        };
        self.clipboard.copy(&layer);
        true
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    /// Adds a fresh instance of the clipboard layer pinned at `position` and returns its id.
    pub fn paste_node_at_position(&mut self, position: Point) -> Option<String> {
        let Some(layer) = self.clipboard.instantiate() else {
            tracing::debug!("paste ignored: clipboard is empty");
            return None;
        };
        let id = layer.id.clone();
        self.edit(|s| {
            s.add_layer(layer);
            s.set_node_position(&id, position);
        });
        Some(id)
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            tracing::debug!("undo ignored: nothing to undo");
            return false;
        };
        self.restore(snapshot, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            tracing::debug!("redo ignored: nothing to redo");
            return false;
        };
        self.restore(snapshot, "redo");
        true
    }

    fn restore(&mut self, snapshot: HistorySnapshot, action: &'static str) {
        self.layers = snapshot.layers;
        self.edges = snapshot.edges;
        self.node_positions = snapshot.node_positions;
        let layers = &self.layers;
        self.selected_node_ids
            .retain(|id| layers.iter().any(|l| &l.id == id));
        self.close_stale_context_menu();
        self.needs_save = true;
        self.revision += 1;
        self.notify(Commit {
            revision: self.revision,
            action,
            recorded: false,
        });
    }

    // Whole model

    /// Replaces the model. Positions of layers that survive by id are kept.
    pub fn set_model(&mut self, model: Model) -> bool {
        self.mutate("set_model", |s| {
            s.layers = dedupe_layers(model.layers);
            s.edges = model.edges;
            s.metadata = Some(model.metadata);
            s.prune_dangling();
            true
        })
    }

    pub fn clear_model(&mut self) -> bool {
        self.mutate("clear_model", |s| {
            if s.is_empty() && s.node_positions.is_empty() && s.metadata.is_none() {
                tracing::debug!("clear_model ignored: canvas already empty");
                return false;
            }
            s.layers.clear();
            s.edges.clear();
            s.metadata = None;
            s.node_positions.clear();
            s.selected_node_ids.clear();
            s.ui.context_menu = None;
            true
        })
    }

    /// The current graph as an exchange model; missing metadata becomes the untitled default.
    pub fn export_model(&self) -> Model {
        Model {
            metadata: self.metadata.clone().unwrap_or_default(),
            layers: self.layers.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Drops edges, positions and selection entries that refer to missing layers, and
    /// duplicate edges.
    pub(crate) fn prune_dangling(&mut self) {
        let edges = std::mem::take(&mut self.edges);
        self.edges = sanitize_edges(&self.layers, edges);
        let ids: FxHashSet<&str> = self.layers.iter().map(|l| l.id.as_str()).collect();
        self.node_positions.retain(|id, _| ids.contains(id.as_str()));
        self.selected_node_ids.retain(|id| ids.contains(id.as_str()));
        self.close_stale_context_menu();
    }

    fn close_stale_context_menu(&mut self) {
        let stale = self
            .ui
            .context_menu
            .as_ref()
            .and_then(|m| m.node_id.as_deref())
            .is_some_and(|id| !self.layers.iter().any(|l| l.id == id));
        if stale {
            self.ui.context_menu = None;
        }
    }

    // Save state

    pub fn mark_saved(&mut self) {
        self.mark_saved_at(Utc::now());
    }

    pub fn mark_saved_at(&mut self, now: DateTime<Utc>) {
        self.last_saved = Some(now);
        self.needs_save = false;
    }

    pub fn set_needs_save(&mut self, needs_save: bool) {
        self.needs_save = needs_save;
    }

    // Dialogs and menus

    pub fn open_import_dialog(&mut self) {
        self.ui.import_dialog_open = true;
    }

    pub fn close_import_dialog(&mut self) {
        self.ui.import_dialog_open = false;
    }

    pub fn open_export_dialog(&mut self) {
        self.ui.export_dialog_open = true;
    }

    pub fn close_export_dialog(&mut self) {
        self.ui.export_dialog_open = false;
    }

    pub fn show_confirm_dialog(&mut self, dialog: ConfirmDialog) {
        self.ui.confirm_dialog = Some(dialog);
    }

    /// Runs the pending action as one transaction and closes the dialog.
    pub fn confirm(&mut self) -> bool {
        let Some(dialog) = self.ui.confirm_dialog.take() else {
            return false;
        };
        self.edit(|s| match dialog.action {
            PendingAction::RemoveLayers(ids) => {
                for id in &ids {
                    s.remove_layer(id);
                }
            }
            PendingAction::RemoveEdges(ids) => {
                for id in &ids {
                    s.remove_edge(id);
                }
            }
            PendingAction::ClearModel => {
                s.clear_model();
            }
        });
        true
    }

    /// Closes the confirmation dialog without running its action.
    pub fn cancel_confirm(&mut self) {
        self.ui.confirm_dialog = None;
    }

    pub fn open_context_menu(&mut self, menu: ContextMenu) {
        self.ui.context_menu = Some(menu);
    }

    pub fn close_context_menu(&mut self) {
        self.ui.context_menu = None;
    }

    pub fn set_zoom_level(&mut self, zoom: f64) {
        self.ui.zoom_level = zoom;
    }

    pub fn set_last_click_position(&mut self, position: Option<Point>) {
        self.ui.last_click_position = position;
    }
}

pub(crate) fn dedupe_layers(layers: Vec<Layer>) -> Vec<Layer> {
    let mut seen = FxHashSet::default();
    layers
        .into_iter()
        .filter(|l| {
            let fresh = seen.insert(l.id.clone());
            if !fresh {
                tracing::debug!(id = %l.id, "duplicate layer id dropped");
            }
            fresh
        })
        .collect()
}

fn sanitize_edges(layers: &[Layer], edges: Vec<Edge>) -> Vec<Edge> {
    let ids: FxHashSet<&str> = layers.iter().map(|l| l.id.as_str()).collect();
    let mut pairs: FxHashSet<(String, String)> = FxHashSet::default();
    edges
        .into_iter()
        .filter(|e| {
            if !ids.contains(e.source.as_str()) || !ids.contains(e.target.as_str()) {
                tracing::debug!(id = %e.id, "edge dropped: endpoint missing");
                return false;
            }
            pairs.insert((e.source.clone(), e.target.clone()))
        })
        .collect()
}
