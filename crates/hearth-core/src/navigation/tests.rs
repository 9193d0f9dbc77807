use serde_json::json;

use super::*;
use crate::focus_menu::{MenuItem, MenuItemKind};
use crate::state::FocusMenuState;
use crate::storage::MemoryStore;
use crate::test_utils::{RecordingSurface, RecordingTransport, mark_all_ready};

fn build(layout: PageLayout) -> (NavigationManager, RecordingTransport, RecordingSurface) {
    let transport = RecordingTransport::new();
    let surface = RecordingSurface::new();
    let messenger = WidgetMessenger::new(Box::new(transport.clone()), "*");
    let mut nav = NavigationManager::new(
        layout,
        Box::new(MemoryStore::new()),
        messenger,
        Box::new(surface.clone()),
    )
    .unwrap();
    mark_all_ready(&mut nav);
    (nav, transport, surface)
}

/// Built-in layout. Home is 3x2: clock (1,1), photos (1,2)-(2,2),
/// agenda (2,1), calendar (3,1)-(3,2). Camera is one 2x2 widget.
fn fixture() -> (NavigationManager, RecordingTransport, RecordingSurface) {
    build(PageLayout::builtin().unwrap())
}

fn item(id: &str, kind: MenuItemKind) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        label: id.to_uppercase(),
        kind,
    }
}

fn two_item_menu() -> MenuConfig {
    MenuConfig {
        enabled: true,
        items: vec![item("a", MenuItemKind::Action), item("b", MenuItemKind::View)],
        default_index: 0,
        current_view: None,
    }
}

fn pos(nav: &NavigationManager) -> (u32, u32) {
    let p = nav.state().grid_position();
    (p.row, p.col)
}

/// Cursor onto agenda with its menu registered, then focus it.
fn focus_agenda_with_menu(nav: &mut NavigationManager) {
    assert!(nav.register_widget_menu("agenda", two_item_menu()));
    nav.move_down();
    assert!(nav.handle_enter());
}

// -- grid ------------------------------------------------------------------

#[test]
fn left_at_first_column_opens_sidebar_on_main_item() {
    let (mut nav, _, _) = fixture();
    assert!(nav.move_left());
    assert!(nav.state().menu_open());
    assert_eq!(nav.state().selected_menu_item(), 0);
}

#[test]
fn left_on_second_page_selects_its_main_item() {
    let (mut nav, _, _) = fixture();
    nav.move_down();
    nav.move_down();
    assert_eq!(pos(&nav), (3, 1));
    assert!(nav.move_down());
    assert_eq!(nav.pages().current().id, "camera");
    assert_eq!(pos(&nav), (1, 1));
    assert!(nav.move_left());
    assert_eq!(nav.state().selected_menu_item(), 1);
}

#[test]
fn tall_widget_is_passed_in_one_step() {
    let (mut nav, _, _) = fixture();
    nav.move_right();
    assert_eq!(pos(&nav), (1, 2));
    nav.move_down();
    assert_eq!(pos(&nav), (3, 1));
}

#[test]
fn span_skip_then_boundary() {
    let layout = PageLayout::from_toml(
        r#"
        [[pages]]
        id = "p"
        grid_rows = 3
        grid_cols = 2
        [[pages.widgets]]
        id = "top"
        row = 1
        col = 1
        [[pages.widgets]]
        id = "tall"
        row = 2
        col = 1
        row_span = 2
        "#,
    )
    .unwrap();
    let (mut nav, _, _) = build(layout);
    assert!(nav.move_down());
    assert_eq!(pos(&nav), (2, 1));
    assert!(nav.move_down());
    assert_eq!(pos(&nav), (2, 1));
    assert_eq!(nav.pages().current_index(), 0);
}

#[test]
fn edges_without_neighbours_are_handled_noops() {
    let (mut nav, _, _) = fixture();
    assert!(nav.move_up());
    assert_eq!(pos(&nav), (1, 1));
    nav.move_right();
    assert!(nav.move_right());
    assert_eq!(pos(&nav), (1, 2));
}

#[test]
fn crossing_up_lands_on_bottom_row() {
    let (mut nav, _, _) = fixture();
    nav.switch_page(1);
    assert!(nav.move_up());
    assert_eq!(nav.pages().current().id, "home");
    assert_eq!(pos(&nav), (3, 1));
    assert_eq!(nav.state().bounds(), (3, 2));
}

#[test]
fn enter_on_empty_cell_is_unhandled() {
    let layout = PageLayout::from_toml(
        r#"
        [[pages]]
        id = "p"
        grid_rows = 1
        grid_cols = 2
        [[pages.widgets]]
        id = "only"
        row = 1
        col = 1
        "#,
    )
    .unwrap();
    let (mut nav, _, _) = build(layout);
    nav.move_right();
    assert!(!nav.handle_enter());
    assert!(nav.state().focused_widget_id().is_none());
}

#[test]
fn escape_on_grid_goes_idle() {
    let (mut nav, _, _) = fixture();
    nav.state_mut().set_idle(false);
    assert!(nav.handle_escape());
    assert!(nav.state().is_idle());
}

// -- sidebar ---------------------------------------------------------------

#[test]
fn sidebar_wraps_and_closes() {
    let (mut nav, _, _) = fixture();
    nav.open_menu();
    assert!(nav.move_up());
    assert_eq!(nav.state().selected_menu_item(), 5);
    assert!(nav.move_down());
    assert_eq!(nav.state().selected_menu_item(), 0);
    assert!(nav.move_left());
    assert!(nav.state().menu_open());
    assert!(nav.move_right());
    assert!(!nav.state().menu_open());
    assert!(nav.take_requests().is_empty());
}

#[test]
fn sidebar_items_queue_shell_work() {
    let (mut nav, _, _) = fixture();
    for (index, expected) in [
        (2, ShellRequest::Reload),
        (3, ShellRequest::Sleep),
        (4, ShellRequest::OpenSettings(None)),
        (5, ShellRequest::ConfirmExit),
    ] {
        nav.open_menu();
        assert!(nav.select_menu_item(index));
        assert!(!nav.state().menu_open());
        assert_eq!(nav.take_requests(), vec![expected]);
    }
}

#[test]
fn sidebar_enter_executes_selected_item() {
    let (mut nav, _, _) = fixture();
    nav.open_menu();
    nav.move_down();
    nav.move_down();
    assert!(nav.handle_enter());
    assert_eq!(nav.take_requests(), vec![ShellRequest::Reload]);
    assert_eq!(nav.state().selected_menu_item(), 2);
}

#[test]
fn invalid_sidebar_index_rejected() {
    let (mut nav, _, _) = fixture();
    nav.open_menu();
    assert!(!nav.select_menu_item(42));
    nav.sidebar_mut().set_enabled("reload", false);
    assert!(!nav.select_menu_item(2));
    assert!(nav.state().menu_open());
}

#[test]
fn show_page_restores_saved_position() {
    let (mut nav, _, _) = fixture();
    nav.move_down();
    nav.move_left();
    assert!(nav.select_menu_item(1));
    assert_eq!(nav.pages().current().id, "camera");
    assert_eq!(pos(&nav), (1, 1));

    nav.move_left();
    assert!(nav.select_menu_item(0));
    assert_eq!(nav.pages().current().id, "home");
    assert_eq!(pos(&nav), (2, 1));
}

#[test]
fn switching_away_and_back_refocuses_widget() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    nav.move_down();
    assert!(nav.switch_page(1));
    assert!(nav.state().focused_widget_id().is_none());
    assert!(transport.actions_to("agenda").contains(&"exit-focus".to_string()));

    assert!(nav.switch_page(0));
    assert_eq!(nav.state().focused_widget_id(), Some("agenda"));
    assert_eq!(nav.state().focus_menu().unwrap().selected, 1);
}

#[test]
fn menu_key_toggles_sidebar_only_from_grid() {
    let (mut nav, _, _) = fixture();
    assert!(nav.handle_grid_action(Action::Menu));
    assert!(nav.state().menu_open());
    assert!(nav.handle_grid_action(Action::Menu));
    assert!(!nav.state().menu_open());

    nav.handle_enter();
    assert!(!nav.handle_widget_action(Action::Menu));
    assert!(!nav.open_menu());
    assert!(!nav.state().menu_open());
}

// -- widget focus ----------------------------------------------------------

#[test]
fn focus_without_menu_activates_widget() {
    let (mut nav, transport, _) = fixture();
    assert!(nav.handle_enter());
    assert_eq!(transport.actions_to("clock"), ["enter-focus", "enter-active"]);
    let s = nav.snapshot();
    assert_eq!(s.focused_widget_id.as_deref(), Some("clock"));
    assert!(!s.focus_menu_state.active);
}

#[test]
fn focus_with_menu_starts_in_menu() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    let fm = nav.state().focus_menu_state();
    assert_eq!(
        fm,
        FocusMenuState {
            active: true,
            widget_id: Some("agenda".into()),
            menu_config: Some(two_item_menu()),
            selected_index: 0,
            in_menu: true,
        }
    );
    let sent = transport.sent_to("agenda");
    assert_eq!(sent[0], json!({"action": "enter-focus"}));
    assert_eq!(sent[1], json!({"action": "menu-active", "selectedItem": 0, "itemId": "a"}));
    assert!(!transport.actions_to("agenda").contains(&"enter-active".to_string()));
}

#[test]
fn menu_selection_clamps_without_wrap() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    transport.clear();

    assert!(nav.move_down());
    assert_eq!(nav.state().focus_menu().unwrap().selected, 1);
    assert_eq!(
        transport.sent_to("agenda"),
        [json!({"action": "menu-selection-changed", "selectedItem": 1, "itemId": "b"})]
    );

    assert!(nav.move_down());
    assert_eq!(nav.state().focus_menu().unwrap().selected, 1);
    assert_eq!(transport.sent_to("agenda").len(), 1);

    nav.move_up();
    nav.move_up();
    assert_eq!(nav.state().focus_menu().unwrap().selected, 0);
    assert_eq!(transport.sent_to("agenda").len(), 2);
}

#[test]
fn menu_enter_reports_item_and_stays_focused() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    nav.move_down();
    transport.clear();
    assert!(nav.handle_enter());
    assert_eq!(
        transport.sent_to("agenda"),
        [json!({"action": "menu-item-selected", "itemId": "b"})]
    );
    assert_eq!(nav.state().focused_widget_id(), Some("agenda"));
}

#[test]
fn menu_to_widget_and_back() {
    let (mut nav, transport, surface) = fixture();
    focus_agenda_with_menu(&mut nav);
    transport.clear();

    assert!(nav.move_right());
    assert!(!nav.state().focus_menu_state().in_menu);
    assert_eq!(transport.actions_to("agenda"), ["enter-active"]);
    let view = surface.last().unwrap();
    assert!(view.focused_widget.unwrap().menu.unwrap().dimmed);

    assert!(nav.move_up());
    assert_eq!(transport.actions_to("agenda").last().map(String::as_str), Some("up"));

    transport.clear();
    assert!(nav.move_left());
    assert!(nav.state().focus_menu_state().in_menu);
    assert_eq!(
        transport.sent_to("agenda"),
        [
            json!({"action": "exit-active"}),
            json!({"action": "menu-active", "selectedItem": 0, "itemId": "a"})
        ]
    );
}

#[test]
fn escape_steps_out_one_level_at_a_time() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    nav.move_right();

    assert!(nav.handle_escape());
    assert_eq!(nav.state().focused_widget_id(), Some("agenda"));
    assert!(nav.state().focus_menu_state().in_menu);

    transport.clear();
    assert!(nav.handle_escape());
    assert!(nav.state().focused_widget_id().is_none());
    assert_eq!(nav.state().focus_menu_state(), FocusMenuState::empty());
    assert_eq!(transport.actions_to("agenda"), ["exit-active", "exit-focus"]);
    assert_eq!(pos(&nav), (2, 1));
}

#[test]
fn left_in_menu_is_a_noop() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    transport.clear();
    assert!(nav.move_left());
    assert!(nav.state().focus_menu_state().in_menu);
    assert!(transport.sent_to("agenda").is_empty());
}

#[test]
fn widget_without_menu_receives_raw_commands() {
    let (mut nav, transport, _) = fixture();
    nav.handle_enter();
    transport.clear();
    nav.move_right();
    nav.move_left();
    nav.handle_enter();
    nav.handle_widget_action(Action::NextView);
    assert_eq!(transport.actions_to("clock"), ["right", "left", "enter", "next-view"]);
    assert_eq!(pos(&nav), (1, 1));

    assert!(nav.handle_escape());
    assert!(nav.state().focused_widget_id().is_none());
}

#[test]
fn return_to_menu_only_from_focused_widget_in_widget() {
    let (mut nav, _, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    assert!(!nav.return_to_menu("agenda"));
    nav.move_right();
    assert!(!nav.return_to_menu("clock"));
    assert!(!nav.state().focus_menu_state().in_menu);
    assert!(nav.return_to_menu("agenda"));
    assert!(nav.state().focus_menu_state().in_menu);
}

#[test]
fn defocus_twice_matches_once() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    assert!(nav.defocus_widget());
    let once = nav.snapshot();
    let sent = transport.sent_to("agenda").len();
    assert!(!nav.defocus_widget());
    assert_eq!(nav.snapshot(), once);
    assert_eq!(transport.sent_to("agenda").len(), sent);
}

#[test]
fn focusing_another_widget_defocuses_first() {
    let (mut nav, transport, _) = fixture();
    nav.handle_enter();
    assert!(nav.focus_widget("photos"));
    assert_eq!(transport.actions_to("clock").last().map(String::as_str), Some("exit-focus"));
    assert_eq!(nav.state().focused_widget_id(), Some("photos"));
    assert_eq!(pos(&nav), (1, 2));
    assert!(!nav.focus_widget("camera-feed"));
}

// -- focus menu registration -------------------------------------------------

#[test]
fn reregistering_displayed_menu_refreshes_it() {
    let (mut nav, _, surface) = fixture();
    focus_agenda_with_menu(&mut nav);
    nav.move_down();
    let rendered = surface.count();

    let mut updated = two_item_menu();
    updated.current_view = Some("b".into());
    assert!(nav.register_widget_menu("agenda", updated));
    assert!(surface.count() > rendered);
    let menu = surface.last().unwrap().focused_widget.unwrap().menu.unwrap();
    assert_eq!(menu.current_view.as_deref(), Some("b"));
    assert_eq!(menu.selected, 1);
}

#[test]
fn invalid_registration_keeps_previous_menu() {
    let (mut nav, _, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    let bad = json!({"enabled": true, "items": []});
    assert!(!nav.register_widget_menu_value("agenda", &bad));
    assert_eq!(nav.state().focus_menu().unwrap().config, two_item_menu());
    assert!(nav.menus().menu_for("agenda").is_some());
}

#[test]
fn menu_registered_after_focus_shows_dimmed() {
    let (mut nav, _, _) = fixture();
    nav.handle_enter();
    assert!(nav.register_widget_menu("clock", two_item_menu()));
    let fm = nav.state().focus_menu_state();
    assert!(fm.active);
    assert!(!fm.in_menu);
}

#[test]
fn disabling_displayed_menu_activates_widget() {
    let (mut nav, transport, _) = fixture();
    focus_agenda_with_menu(&mut nav);
    transport.clear();
    assert!(nav.register_widget_menu_value("agenda", &json!({"enabled": false})));
    assert!(nav.state().focus_menu().is_none());
    assert_eq!(transport.actions_to("agenda"), ["enter-active"]);
}

// -- touch -------------------------------------------------------------------

#[test]
fn tap_focuses_spanning_widget_at_anchor() {
    let (mut nav, _, _) = fixture();
    assert!(nav.tap_cell(3, 2));
    assert_eq!(nav.state().focused_widget_id(), Some("calendar"));
    assert_eq!(pos(&nav), (3, 1));
    assert!(nav.tap_backdrop());
    assert!(nav.state().focused_widget_id().is_none());
    assert!(!nav.tap_backdrop());
}

#[test]
fn tap_validation() {
    let (mut nav, _, _) = fixture();
    assert!(!nav.tap_cell(9, 1));
    assert!(!nav.tap_menu_item(0));
    nav.open_menu();
    assert!(nav.tap_backdrop());
    assert!(!nav.state().menu_open());
    nav.open_menu();
    assert!(nav.tap_menu_item(2));
    assert_eq!(nav.take_requests(), vec![ShellRequest::Reload]);
}

// -- timeout -----------------------------------------------------------------

#[test]
fn timeout_escapes_then_defocuses() {
    let (mut nav, transport, _) = fixture();
    nav.handle_enter();
    let generation = nav.begin_timeout().unwrap();
    assert_eq!(transport.actions_to("clock").last().map(String::as_str), Some("escape"));
    assert_eq!(nav.state().focused_widget_id(), Some("clock"));

    assert!(nav.finish_timeout(generation));
    assert!(nav.state().focused_widget_id().is_none());
    assert!(nav.state().is_idle());
    assert_eq!(transport.actions_to("clock").last().map(String::as_str), Some("exit-focus"));
}

#[test]
fn input_during_grace_window_supersedes_timeout() {
    let (mut nav, _, _) = fixture();
    nav.handle_enter();
    let generation = nav.begin_timeout().unwrap();
    nav.note_input();
    assert!(!nav.finish_timeout(generation));
    assert_eq!(nav.state().focused_widget_id(), Some("clock"));
}

#[test]
fn go_idle_closes_sidebar_and_hides_highlight() {
    let (mut nav, _, _) = fixture();
    assert!(nav.begin_timeout().is_none());
    nav.open_menu();
    nav.go_idle();
    assert!(!nav.state().menu_open());
    assert!(nav.view().highlighted.is_none());
    nav.state_mut().set_idle(false);
    assert_eq!(nav.view().highlighted, Some(GridPosition::new(1, 1)));
}

// -- invariants ----------------------------------------------------------------

mod prop {
    use proptest::prelude::*;

    use super::*;

    fn apply(nav: &mut NavigationManager, op: u8) {
        match op {
            0 => {
                nav.move_up();
            },
            1 => {
                nav.move_down();
            },
            2 => {
                nav.move_left();
            },
            3 => {
                nav.move_right();
            },
            4 => {
                nav.handle_enter();
            },
            5 => {
                nav.handle_escape();
            },
            6 => {
                nav.toggle_menu();
            },
            7 => {
                nav.register_widget_menu("agenda", two_item_menu());
            },
            8 => {
                nav.register_widget_menu_value("clock", &json!({"enabled": false}));
            },
            9 => {
                nav.return_to_menu("agenda");
            },
            10 => {
                nav.tap_cell(3, 2);
            },
            11 => {
                nav.tap_backdrop();
            },
            12 => {
                nav.tap_menu_item(1);
            },
            13 => {
                if let Some(g) = nav.begin_timeout() {
                    nav.finish_timeout(g);
                }
            },
            14 => {
                nav.switch_page(0);
            },
            _ => {
                nav.register_widget_menu("clock", two_item_menu());
            },
        }
    }

    proptest! {
        #[test]
        fn state_invariants_hold(ops in proptest::collection::vec(0u8..16, 0..80)) {
            let (mut nav, _, _) = fixture();
            for op in ops {
                apply(&mut nav, op);
                let s = nav.snapshot();
                prop_assert!(!(s.menu_open && s.focused_widget_id.is_some()));
                if s.focus_menu_state.active {
                    prop_assert_eq!(&s.focused_widget_id, &s.focus_menu_state.widget_id);
                }
                let page = nav.pages().current();
                prop_assert!(s.grid_position.row >= 1 && s.grid_position.row <= page.grid_rows);
                prop_assert!(s.grid_position.col >= 1 && s.grid_position.col <= page.grid_cols);
            }
        }

        #[test]
        fn defocus_is_idempotent(ops in proptest::collection::vec(0u8..16, 0..40)) {
            let (mut nav, _, _) = fixture();
            for op in ops {
                apply(&mut nav, op);
            }
            nav.defocus_widget();
            let once = nav.snapshot();
            nav.defocus_widget();
            prop_assert_eq!(nav.snapshot(), once);
        }
    }
}
