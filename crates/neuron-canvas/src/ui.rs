//! Transient editor UI state: dialogs, confirmation prompts, context menu.

use crate::model::Point;

/// Destructive action waiting for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    RemoveLayers(Vec<String>),
    RemoveEdges(Vec<String>),
    ClearModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: PendingAction,
}

impl ConfirmDialog {
    pub fn remove_layers(ids: Vec<String>) -> Self {
        let message = if ids.len() == 1 {
            "确定要删除此节点吗？删除节点将同时删除相关的连接。".to_string()
        } else {
            format!(
                "确定要删除 {} 个节点吗？删除节点将同时删除相关的连接。",
                ids.len()
            )
        };
        Self {
            title: "确认删除".to_string(),
            message,
            action: PendingAction::RemoveLayers(ids),
        }
    }

    pub fn remove_edges(ids: Vec<String>) -> Self {
        Self {
            title: "确认删除".to_string(),
            message: format!("确定要删除 {} 条连接吗？", ids.len()),
            action: PendingAction::RemoveEdges(ids),
        }
    }

    pub fn clear_canvas() -> Self {
        Self {
            title: "确认清空".to_string(),
            message: "确定要清空画布吗？".to_string(),
            action: PendingAction::ClearModel,
        }
    }

    pub fn new_canvas() -> Self {
        Self {
            title: "确认新建".to_string(),
            message: "当前画布有未保存的内容，确定要清空吗？".to_string(),
            action: PendingAction::ClearModel,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    /// Where the menu is drawn.
    pub screen: Point,
    /// Flow position under the cursor; new nodes are placed here.
    pub flow_position: Option<Point>,
    /// Set when opened on a node.
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub import_dialog_open: bool,
    pub export_dialog_open: bool,
    pub confirm_dialog: Option<ConfirmDialog>,
    pub context_menu: Option<ContextMenu>,
    pub zoom_level: f64,
    pub last_click_position: Option<Point>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            import_dialog_open: false,
            export_dialog_open: false,
            confirm_dialog: None,
            context_menu: None,
            zoom_level: 1.0,
            last_click_position: None,
        }
    }
}
