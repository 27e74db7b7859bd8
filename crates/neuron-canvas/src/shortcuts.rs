//! Editor keyboard shortcuts.

use crate::canvas::Canvas;
use crate::storage::StorageBackend;
use crate::ui::ConfirmDialog;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    /// A printable key, lower-cased.
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
    pub shift: bool,
    /// Focus is in a text field; shortcuts are suppressed.
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            in_text_input: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }
}

/// Parses combos such as `Ctrl+Shift+Z`, `Delete` or `+`.
impl FromStr for KeyEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ctrl = false;
        let mut shift = false;
        let mut rest = s.trim();
        loop {
            let lower = rest.to_ascii_lowercase();
            if let Some(tail) = lower
                .strip_prefix("ctrl+")
                .or_else(|| lower.strip_prefix("cmd+"))
            {
                ctrl = true;
                rest = &rest[rest.len() - tail.len()..];
            } else if let Some(tail) = lower.strip_prefix("shift+") {
                shift = true;
                rest = &rest[rest.len() - tail.len()..];
            } else {
                break;
            }
        }
        let key = match rest.to_ascii_lowercase().as_str() {
            "delete" | "del" => Key::Delete,
            "backspace" => Key::Backspace,
            "escape" | "esc" => Key::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return Err(format!("unrecognized key `{s}`")),
                }
            }
        };
        Ok(Self {
            key,
            ctrl,
            shift,
            in_text_input: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    DeleteSelected,
    Save,
    NewCanvas,
    OpenImport,
    OpenExport,
    CloseContextMenu,
    ClearSelection,
    SelectAll,
    Undo,
    Redo,
    Copy,
    Paste,
    ZoomIn,
    ZoomOut,
    FitView,
}

/// Handles one key press and returns the action it triggered, if any.
pub fn handle_key<B: StorageBackend + ?Sized>(
    canvas: &mut Canvas<'_>,
    backend: &mut B,
    event: KeyEvent,
) -> Option<ShortcutAction> {
    if event.in_text_input {
        return None;
    }
    let action = resolve(canvas, event)?;
    tracing::debug!(?action, "shortcut");
    match action {
        ShortcutAction::DeleteSelected => {
            canvas.request_delete_selected();
        }
        ShortcutAction::Save => {
            canvas.store.save_to_storage(backend);
        }
        ShortcutAction::NewCanvas => {
            if canvas.store.layers().is_empty() {
                canvas.store.clear_model();
            } else {
                canvas.store.show_confirm_dialog(ConfirmDialog::new_canvas());
            }
        }
        ShortcutAction::OpenImport => canvas.store.open_import_dialog(),
        ShortcutAction::OpenExport => canvas.store.open_export_dialog(),
        ShortcutAction::CloseContextMenu => canvas.store.close_context_menu(),
        ShortcutAction::ClearSelection => canvas.store.clear_selection(),
        ShortcutAction::SelectAll => canvas.store.select_all(),
        ShortcutAction::Undo => {
            canvas.store.undo();
        }
        ShortcutAction::Redo => {
            canvas.store.redo();
        }
        ShortcutAction::Copy => {
            if let Some(id) = canvas.store.selected_node_ids().first().cloned() {
                canvas.store.copy_layer_to_clipboard(&id);
            }
        }
        ShortcutAction::Paste => {
            let position = canvas
                .store
                .ui()
                .last_click_position
                .unwrap_or(canvas.store.config().palette_drop_position);
            canvas.store.paste_node_at_position(position);
        }
        ShortcutAction::ZoomIn => canvas.zoom_in(),
        ShortcutAction::ZoomOut => canvas.zoom_out(),
        ShortcutAction::FitView => canvas.fit_view(),
    }
    Some(action)
}

fn resolve(canvas: &Canvas<'_>, event: KeyEvent) -> Option<ShortcutAction> {
    let store = &*canvas.store;
    let has_selection = !store.selected_node_ids().is_empty();
    match (event.key, event.ctrl) {
        (Key::Delete | Key::Backspace, _) if has_selection => Some(ShortcutAction::DeleteSelected),
        (Key::Escape, _) => {
            if store.ui().context_menu.is_some() {
                Some(ShortcutAction::CloseContextMenu)
            } else if has_selection {
                Some(ShortcutAction::ClearSelection)
            } else {
                None
            }
        }
        (Key::Char('s'), true) => Some(ShortcutAction::Save),
        (Key::Char('n'), true) => Some(ShortcutAction::NewCanvas),
        (Key::Char('o'), true) => Some(ShortcutAction::OpenImport),
        (Key::Char('e'), true) => Some(ShortcutAction::OpenExport),
        (Key::Char('a'), true) => Some(ShortcutAction::SelectAll),
        (Key::Char('z'), true) if event.shift => Some(ShortcutAction::Redo),
        (Key::Char('z'), true) => Some(ShortcutAction::Undo),
        (Key::Char('y'), true) => Some(ShortcutAction::Redo),
        (Key::Char('c'), true) if has_selection => Some(ShortcutAction::Copy),
        (Key::Char('v'), true) if !store.clipboard().is_empty() => Some(ShortcutAction::Paste),
        (Key::Char('=' | '+'), false) => Some(ShortcutAction::ZoomIn),
        (Key::Char('-' | '_'), false) => Some(ShortcutAction::ZoomOut),
        (Key::Char('f'), false) => Some(ShortcutAction::FitView),
        _ => None,
    }
}
