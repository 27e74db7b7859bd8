//! Canvas interaction layer: turns pointer gestures into store operations.

use crate::codec::{export_to_json, import_from_json};
use crate::error::Result;
use crate::factory::create_node_by_type;
use crate::layout::{LayoutResult, calculate_layout, merge_positions};
use crate::model::{Edge, Point};
use crate::store::SandboxStore;
use crate::ui::{ConfirmDialog, ContextMenu};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 2.0;
const ZOOM_STEP: f64 = 1.2;
const FIT_PADDING: f64 = 0.2;

/// Pan and zoom of the visible pane. `x`/`y` are the screen coordinates of the flow origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
    /// Size of the pane in screen pixels.
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_flow_position(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn flow_to_screen_position(&self, flow: Point) -> Point {
        Point::new(flow.x * self.zoom + self.x, flow.y * self.zoom + self.y)
    }

    /// Zooms by `factor` keeping the pane center fixed.
    pub fn zoom_by(&mut self, factor: f64) {
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        let anchor = self.screen_to_flow_position(center);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.x = center.x - anchor.x * self.zoom;
        self.y = center.y - anchor.y * self.zoom;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / ZOOM_STEP);
    }

    /// Centers the flow rectangle `(min, max)` with `padding` as a fraction of its size.
    pub fn fit_bounds(&mut self, min: Point, max: Point, padding: f64) {
        let bw = (max.x - min.x).max(1.0);
        let bh = (max.y - min.y).max(1.0);
        let zoom_x = self.width / (bw * (1.0 + padding));
        let zoom_y = self.height / (bh * (1.0 + padding));
        self.zoom = zoom_x.min(zoom_y).clamp(MIN_ZOOM, MAX_ZOOM);
        let cx = min.x + bw / 2.0;
        let cy = min.y + bh / 2.0;
        self.x = self.width / 2.0 - cx * self.zoom;
        self.y = self.height / 2.0 - cy * self.zoom;
    }
}

/// Bounding box of all nodes in a view.
pub fn view_bounds(view: &LayoutResult) -> Option<(Point, Point)> {
    let mut nodes = view.nodes.iter();
    let first = nodes.next()?;
    let mut min = first.position;
    let mut max = Point::new(first.position.x + first.width, first.position.y + first.height);
    for n in nodes {
        min.x = min.x.min(n.position.x);
        min.y = min.y.min(n.position.y);
        max.x = max.x.max(n.position.x + n.width);
        max.y = max.y.max(n.position.y + n.height);
    }
    Some((min, max))
}

/// A store and a viewport, borrowed for the duration of one gesture.
pub struct Canvas<'a> {
    pub store: &'a mut SandboxStore,
    pub viewport: &'a mut Viewport,
}

impl<'a> Canvas<'a> {
    pub fn new(store: &'a mut SandboxStore, viewport: &'a mut Viewport) -> Self {
        Self { store, viewport }
    }

    /// Current rendering: computed layout with pinned positions applied.
    pub fn view(&self) -> LayoutResult {
        let result = calculate_layout(
            self.store.layers(),
            self.store.edges(),
            &self.store.config().layout,
        );
        merge_positions(result, self.store.node_positions())
    }

    fn add_node_at(&mut self, layer_type: &str, position: Point) -> Result<String> {
        let layer = create_node_by_type(layer_type)?;
        let id = layer.id.clone();
        self.store.edit(|s| {
            s.add_layer(layer);
            s.set_node_position(&id, position);
        });
        Ok(id)
    }

    /// Palette drag released over the pane at `screen`.
    pub fn drop_from_palette(&mut self, layer_type: &str, screen: Point) -> Result<String> {
        let position = self.viewport.screen_to_flow_position(screen);
        self.add_node_at(layer_type, position)
    }

    /// Palette entry clicked: the node lands at the configured default position.
    pub fn click_palette(&mut self, layer_type: &str) -> Result<String> {
        let position = self.store.config().palette_drop_position;
        self.add_node_at(layer_type, position)
    }

    pub fn node_drag_stop(&mut self, id: &str, position: Point) -> bool {
        self.store.set_node_position(id, position)
    }

    /// Creates an edge between two distinct, existing, not yet connected nodes.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<String> {
        if source == target {
            tracing::debug!(source, "connect ignored: self-loop");
            return None;
        }
        if !self.store.has_layer(source) || !self.store.has_layer(target) {
            tracing::debug!(source, target, "connect ignored: endpoint missing");
            return None;
        }
        if self.store.edges().iter().any(|e| e.connects(source, target)) {
            return None;
        }
        let millis = chrono::Utc::now().timestamp_millis();
        let mut edge = Edge::new(format!("edge_{source}_{target}_{millis}"), source, target);
        edge.edge_type = Some("normal".to_string());
        let id = edge.id.clone();
        self.store.add_edge(edge).then_some(id)
    }

    /// Plain click selects only `id`; with `multi` the node's selection is toggled.
    pub fn click_node(&mut self, id: &str, multi: bool) {
        if multi {
            self.store.toggle_selected_node_id(id);
        } else {
            self.store.set_selected_node_ids([id.to_string()]);
        }
    }

    pub fn double_click_node(&mut self, id: &str) {
        self.store.set_selected_node_ids([id.to_string()]);
    }

    pub fn click_pane(&mut self, screen: Point) {
        self.store.clear_selection();
        self.store.close_context_menu();
        let flow = self.viewport.screen_to_flow_position(screen);
        self.store.set_last_click_position(Some(flow));
    }

    pub fn request_delete_nodes(&mut self, ids: Vec<String>) -> bool {
        if ids.is_empty() {
            return false;
        }
        self.store.show_confirm_dialog(ConfirmDialog::remove_layers(ids));
        true
    }

    pub fn request_delete_edges(&mut self, ids: Vec<String>) -> bool {
        if ids.is_empty() {
            return false;
        }
        self.store.show_confirm_dialog(ConfirmDialog::remove_edges(ids));
        true
    }

    pub fn request_delete_selected(&mut self) -> bool {
        let ids = self.store.selected_node_ids().to_vec();
        self.request_delete_nodes(ids)
    }

    pub fn request_clear_canvas(&mut self) {
        self.store.show_confirm_dialog(ConfirmDialog::clear_canvas());
    }

    pub fn open_pane_context_menu(&mut self, screen: Point) {
        let flow = self.viewport.screen_to_flow_position(screen);
        self.store.open_context_menu(ContextMenu {
            screen,
            flow_position: Some(flow),
            node_id: None,
        });
    }

    pub fn open_node_context_menu(&mut self, id: &str, screen: Point) {
        if !self.store.has_layer(id) {
            return;
        }
        self.store.open_context_menu(ContextMenu {
            screen,
            flow_position: None,
            node_id: Some(id.to_string()),
        });
    }

    fn menu_flow_position(&self) -> Point {
        self.store
            .ui()
            .context_menu
            .as_ref()
            .and_then(|m| m.flow_position)
            .unwrap_or(self.store.config().palette_drop_position)
    }

    fn menu_node_id(&self) -> Option<String> {
        self.store.ui().context_menu.as_ref()?.node_id.clone()
    }

    /// Adds a node where the pane menu was opened and closes the menu.
    pub fn menu_add_node(&mut self, layer_type: &str) -> Result<String> {
        let position = self.menu_flow_position();
        let id = self.add_node_at(layer_type, position)?;
        self.store.close_context_menu();
        Ok(id)
    }

    pub fn menu_copy_node(&mut self) -> bool {
        let copied = self
            .menu_node_id()
            .is_some_and(|id| self.store.copy_layer_to_clipboard(&id));
        self.store.close_context_menu();
        copied
    }

    pub fn menu_paste(&mut self) -> Option<String> {
        let position = self.menu_flow_position();
        let id = self.store.paste_node_at_position(position);
        self.store.close_context_menu();
        id
    }

    pub fn menu_delete_node(&mut self) -> bool {
        let requested = match self.menu_node_id() {
            Some(id) => self.request_delete_nodes(vec![id]),
            None => false,
        };
        self.store.close_context_menu();
        requested
    }

    /// Pins every node at its computed position (one undo step) and fits the view.
    pub fn auto_layout(&mut self) -> LayoutResult {
        let result = calculate_layout(
            self.store.layers(),
            self.store.edges(),
            &self.store.config().layout,
        );
        self.store.edit(|s| {
            for node in &result.nodes {
                s.set_node_position(&node.id, node.position);
            }
        });
        self.fit_view_to(&result);
        result
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.store.set_zoom_level(self.viewport.zoom);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.store.set_zoom_level(self.viewport.zoom);
    }

    pub fn fit_view(&mut self) {
        let view = self.view();
        self.fit_view_to(&view);
    }

    fn fit_view_to(&mut self, view: &LayoutResult) {
        if let Some((min, max)) = view_bounds(view) {
            self.viewport.fit_bounds(min, max, FIT_PADDING);
            self.store.set_zoom_level(self.viewport.zoom);
        }
    }

    /// Replaces the model with an imported file. On error the store is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let model = import_from_json(text)?;
        self.store.set_model(model);
        self.store.close_import_dialog();
        Ok(())
    }

    pub fn export_json(&mut self) -> Result<String> {
        let text = export_to_json(&self.store.export_model())?;
        self.store.close_export_dialog();
        Ok(text)
    }
}
