use neuron_canvas::canvas::{Canvas, MAX_ZOOM, Viewport};
use neuron_canvas::model::Point;
use neuron_canvas::shortcuts::{Key, KeyEvent, ShortcutAction, handle_key};
use neuron_canvas::storage::MemoryStorage;
use neuron_canvas::store::SandboxStore;
use neuron_canvas::ui::PendingAction;
use neuron_canvas::Error;
use pretty_assertions::assert_eq;

struct Fixture {
    store: SandboxStore,
    viewport: Viewport,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: SandboxStore::default(),
            viewport: Viewport::default(),
        }
    }

    fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.store, &mut self.viewport)
    }

    fn add(&mut self, layer_type: &str) -> String {
        self.canvas().click_palette(layer_type).unwrap()
    }
}

fn key(s: &str) -> KeyEvent {
    s.parse().unwrap()
}

#[test]
fn self_loops_never_reach_the_store() {
    let mut fx = Fixture::new();
    let a = fx.add("conv2d");
    assert_eq!(fx.canvas().connect(&a, &a), None);
    assert!(fx.store.edges().iter().all(|e| e.source != e.target));
    assert!(fx.store.edges().is_empty());
}

#[test]
fn connect_creates_normal_edges_once() {
    let mut fx = Fixture::new();
    let a = fx.add("input");
    let b = fx.add("linear");
    let id = fx.canvas().connect(&a, &b).unwrap();
    assert!(id.starts_with(&format!("edge_{a}_{b}_")));
    assert_eq!(fx.store.edges()[0].edge_type.as_deref(), Some("normal"));
    assert_eq!(fx.canvas().connect(&a, &b), None);
    assert_eq!(fx.canvas().connect(&a, "ghost"), None);
    assert_eq!(fx.store.edges().len(), 1);
}

#[test]
fn palette_drop_converts_screen_coordinates() {
    let mut fx = Fixture::new();
    fx.viewport = Viewport {
        x: 100.0,
        y: 50.0,
        zoom: 2.0,
        ..Default::default()
    };
    let id = fx
        .canvas()
        .drop_from_palette("maxpool2d", Point::new(300.0, 250.0))
        .unwrap();
    assert_eq!(fx.store.node_positions().get(&id), Some(&Point::new(100.0, 100.0)));
    // Layer and position are one undo step.
    assert_eq!(fx.store.history().len(), 2);
}

#[test]
fn unknown_palette_entry_is_an_error() {
    let mut fx = Fixture::new();
    let err = fx.canvas().click_palette("dense").unwrap_err();
    assert!(matches!(err, Error::UnknownLayerType { .. }));
    assert!(fx.store.layers().is_empty());
}

#[test]
fn click_palette_uses_default_position() {
    let mut fx = Fixture::new();
    let id = fx.add("relu");
    assert_eq!(fx.store.node_positions().get(&id), Some(&Point::new(400.0, 300.0)));
}

#[test]
fn clicks_drive_selection() {
    let mut fx = Fixture::new();
    let a = fx.add("relu");
    let b = fx.add("tanh");
    fx.canvas().click_node(&a, false);
    fx.canvas().click_node(&b, true);
    assert_eq!(fx.store.selected_node_ids(), [a.clone(), b.clone()]);
    fx.canvas().click_node(&a, true);
    assert_eq!(fx.store.selected_node_ids(), [b.clone()]);
    fx.canvas().double_click_node(&a);
    assert_eq!(fx.store.selected_node_ids(), [a.clone()]);

    fx.canvas().open_node_context_menu(&a, Point::new(5.0, 5.0));
    fx.canvas().click_pane(Point::new(10.0, 20.0));
    assert!(fx.store.selected_node_ids().is_empty());
    assert!(fx.store.ui().context_menu.is_none());
    assert_eq!(fx.store.ui().last_click_position, Some(Point::new(10.0, 20.0)));
}

#[test]
fn delete_requests_wait_for_confirmation() {
    let mut fx = Fixture::new();
    let a = fx.add("relu");
    let b = fx.add("relu");
    fx.canvas().connect(&a, &b);
    fx.store.select_all();

    assert!(fx.canvas().request_delete_selected());
    let dialog = fx.store.ui().confirm_dialog.clone().unwrap();
    assert_eq!(dialog.action, PendingAction::RemoveLayers(vec![a.clone(), b.clone()]));
    assert_eq!(fx.store.layers().len(), 2);

    fx.store.confirm();
    assert!(fx.store.layers().is_empty());
    assert!(fx.store.edges().is_empty());

    assert!(!fx.canvas().request_delete_nodes(vec![]));
}

#[test]
fn context_menu_actions() {
    let mut fx = Fixture::new();
    fx.canvas().open_pane_context_menu(Point::new(640.0, 480.0));
    let added = fx.canvas().menu_add_node("batchnorm").unwrap();
    assert!(fx.store.ui().context_menu.is_none());
    assert_eq!(fx.store.node_positions().get(&added), Some(&Point::new(640.0, 480.0)));

    fx.canvas().open_node_context_menu(&added, Point::new(1.0, 1.0));
    assert!(fx.canvas().menu_copy_node());
    assert_eq!(fx.store.clipboard().peek().unwrap().name, "批归一化层 副本");

    fx.canvas().open_pane_context_menu(Point::new(10.0, 10.0));
    let pasted = fx.canvas().menu_paste().unwrap();
    assert_eq!(fx.store.node_positions().get(&pasted), Some(&Point::new(10.0, 10.0)));

    fx.canvas().open_node_context_menu(&pasted, Point::new(1.0, 1.0));
    assert!(fx.canvas().menu_delete_node());
    assert_eq!(
        fx.store.ui().confirm_dialog.as_ref().map(|d| d.action.clone()),
        Some(PendingAction::RemoveLayers(vec![pasted]))
    );
}

#[test]
fn auto_layout_pins_everything_in_one_step() {
    let mut fx = Fixture::new();
    let a = fx.add("input");
    let b = fx.add("conv2d");
    fx.canvas().connect(&a, &b);
    let len = fx.store.history().len();

    let result = fx.canvas().auto_layout();
    assert_eq!(fx.store.history().len(), len + 1);
    assert_eq!(fx.store.node_positions().get(&a), Some(&result.node(&a).unwrap().position));
    assert!(result.node(&a).unwrap().position.x < result.node(&b).unwrap().position.x);
    assert!(fx.viewport.zoom <= MAX_ZOOM);
    assert_eq!(fx.store.ui().zoom_level, fx.viewport.zoom);

    fx.store.undo();
    assert_eq!(fx.store.node_positions().get(&a), Some(&Point::new(400.0, 300.0)));
}

#[test]
fn failed_import_leaves_the_store_untouched() {
    let mut fx = Fixture::new();
    fx.add("relu");
    fx.store.open_import_dialog();
    let before = fx.store.snapshot();
    let rev = fx.store.revision();

    assert!(fx.canvas().import_json(r#"{"foo": 1}"#).is_err());
    assert_eq!(fx.store.snapshot(), before);
    assert_eq!(fx.store.revision(), rev);
    assert!(fx.store.ui().import_dialog_open);

    let ok = r#"{"metadata":{"name":"m","displayName":"M","description":""},"layers":[{"id":"x","name":"X","type":"flatten"}],"edges":[]}"#;
    fx.canvas().import_json(ok).unwrap();
    assert!(!fx.store.ui().import_dialog_open);
    assert_eq!(fx.store.layers().len(), 1);
    assert!(fx.store.can_undo());
}

#[test]
fn export_json_closes_the_dialog() {
    let mut fx = Fixture::new();
    fx.add("softmax");
    fx.store.open_export_dialog();
    let text = fx.canvas().export_json().unwrap();
    assert!(text.contains("\"type\": \"softmax\""));
    assert!(!fx.store.ui().export_dialog_open);
}

#[test]
fn viewport_zoom_is_clamped_and_centered() {
    let mut vp = Viewport::default();
    let center = Point::new(vp.width / 2.0, vp.height / 2.0);
    let anchor = vp.screen_to_flow_position(center);
    vp.zoom_in();
    assert_eq!(vp.flow_to_screen_position(anchor), center);
    for _ in 0..20 {
        vp.zoom_in();
    }
    assert_eq!(vp.zoom, MAX_ZOOM);
}

#[test]
fn shortcuts_cover_history_and_clipboard() {
    let mut fx = Fixture::new();
    let mut storage = MemoryStorage::new();
    let a = fx.add("relu");
    fx.add("tanh");

    let mut press = |fx: &mut Fixture, k: &str| {
        let mut canvas = fx.canvas();
        handle_key(&mut canvas, &mut storage, key(k))
    };

    assert_eq!(press(&mut fx, "ctrl+z"), Some(ShortcutAction::Undo));
    assert_eq!(fx.store.layers().len(), 1);
    assert_eq!(press(&mut fx, "ctrl+shift+z"), Some(ShortcutAction::Redo));
    assert_eq!(fx.store.layers().len(), 2);
    press(&mut fx, "ctrl+z");
    assert_eq!(press(&mut fx, "ctrl+y"), Some(ShortcutAction::Redo));
    assert_eq!(fx.store.layers().len(), 2);

    // Copy needs a selection.
    assert_eq!(press(&mut fx, "ctrl+c"), None);
    fx.canvas().click_node(&a, false);
    fx.canvas().click_pane(Point::new(40.0, 60.0));
    fx.canvas().click_node(&a, false);
    assert_eq!(press(&mut fx, "ctrl+c"), Some(ShortcutAction::Copy));
    assert_eq!(press(&mut fx, "ctrl+v"), Some(ShortcutAction::Paste));
    assert_eq!(fx.store.layers().len(), 3);
    let pasted = &fx.store.layers()[2];
    assert_eq!(fx.store.node_positions().get(&pasted.id), Some(&Point::new(40.0, 60.0)));

    assert_eq!(press(&mut fx, "ctrl+a"), Some(ShortcutAction::SelectAll));
    assert_eq!(fx.store.selected_node_ids().len(), 3);
    assert_eq!(press(&mut fx, "escape"), Some(ShortcutAction::ClearSelection));
    assert_eq!(press(&mut fx, "escape"), None);
}

#[test]
fn delete_and_new_shortcuts_ask_first() {
    let mut fx = Fixture::new();
    let mut storage = MemoryStorage::new();
    assert_eq!(
        handle_key(&mut fx.canvas(), &mut storage, KeyEvent::new(Key::Delete)),
        None
    );
    let a = fx.add("relu");
    fx.canvas().click_node(&a, false);
    handle_key(&mut fx.canvas(), &mut storage, KeyEvent::new(Key::Backspace));
    assert!(matches!(
        fx.store.ui().confirm_dialog.as_ref().map(|d| &d.action),
        Some(PendingAction::RemoveLayers(_))
    ));
    fx.store.cancel_confirm();

    handle_key(&mut fx.canvas(), &mut storage, KeyEvent::ctrl(Key::Char('n')));
    let dialog = fx.store.ui().confirm_dialog.clone().unwrap();
    assert_eq!(dialog.title, "确认新建");
    fx.store.confirm();
    assert!(fx.store.layers().is_empty());
}

#[test]
fn shortcuts_are_ignored_in_text_fields() {
    let mut fx = Fixture::new();
    let mut storage = MemoryStorage::new();
    fx.add("relu");
    let mut ev = KeyEvent::ctrl(Key::Char('z'));
    ev.in_text_input = true;
    assert_eq!(handle_key(&mut fx.canvas(), &mut storage, ev), None);
    assert_eq!(fx.store.layers().len(), 1);
}

#[test]
fn save_and_zoom_shortcuts() {
    let mut fx = Fixture::new();
    let mut storage = MemoryStorage::new();
    fx.add("relu");
    assert!(fx.store.needs_save());
    handle_key(&mut fx.canvas(), &mut storage, key("ctrl+s"));
    assert!(!fx.store.needs_save());
    assert!(fx.store.last_saved().is_some());

    handle_key(&mut fx.canvas(), &mut storage, key("+"));
    assert!(fx.viewport.zoom > 1.0);
    assert_eq!(fx.store.ui().zoom_level, fx.viewport.zoom);
    handle_key(&mut fx.canvas(), &mut storage, key("-"));
    handle_key(&mut fx.canvas(), &mut storage, key("f"));
    assert_eq!(fx.store.ui().zoom_level, fx.viewport.zoom);
}
