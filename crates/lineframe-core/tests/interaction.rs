//! Pointer-driven editing through a session, plus persistence through
//! the storage backends.

use kurbo::Point;
use lineframe_core::document::MemberOptions;
use lineframe_core::input::keys;
use lineframe_core::{
    Document, InteractionConfig, KeyEvent, MemoryStorage, MouseButton, PointerEvent, Session, Storage, ToolKind,
};

fn session_with_beam() -> Session {
    let mut doc = Document::new();
    let a = doc.find_or_create_node(Point::new(0.0, 0.0), 0.01).unwrap();
    let b = doc.find_or_create_node(Point::new(5000.0, 0.0), 0.01).unwrap();
    doc.add_member(&a, &b, MemberOptions::default()).unwrap();
    Session::with_document(doc, InteractionConfig::default())
}

fn down(s: &mut Session, x: f64, y: f64) {
    s.handle_pointer(PointerEvent::Down {
        position: Point::new(x, y),
        button: MouseButton::Left,
    });
}

fn move_to(s: &mut Session, x: f64, y: f64) {
    s.handle_pointer(PointerEvent::Move {
        position: Point::new(x, y),
    });
}

fn up(s: &mut Session, x: f64, y: f64) {
    s.handle_pointer(PointerEvent::Up {
        position: Point::new(x, y),
        button: MouseButton::Left,
    });
}

#[test]
fn test_small_pointer_jitter_is_not_a_drag() {
    let mut s = session_with_beam();
    let before = s.document.nodes().to_vec();

    down(&mut s, 125.0, 0.0);
    move_to(&mut s, 127.0, 0.0);
    up(&mut s, 127.0, 0.0);

    assert_eq!(s.history.undo_len(), 0);
    assert_eq!(s.document.nodes(), before.as_slice());
    assert!(s.document.selection().is_some());
}

#[test]
fn test_drag_records_one_history_entry() {
    let mut s = session_with_beam();

    down(&mut s, 125.0, 0.0);
    move_to(&mut s, 135.0, 0.0);
    assert_eq!(s.history.undo_len(), 1);
    for x in [140.0, 150.0, 180.0] {
        move_to(&mut s, x, 0.0);
    }
    up(&mut s, 180.0, 0.0);
    assert_eq!(s.history.undo_len(), 1);

    let member = &s.document.members()[0];
    let (start, end) = s.document.member_endpoints(member).unwrap();
    // The grab point follows the 1000 mm grid: 2500 -> 4000.
    assert_eq!(start, Point::new(1500.0, 0.0));
    assert_eq!(end, Point::new(6500.0, 0.0));

    assert!(s.undo());
    let member = &s.document.members()[0];
    let (start, _) = s.document.member_endpoints(member).unwrap();
    assert_eq!(start, Point::new(0.0, 0.0));
}

#[test]
fn test_keyboard_undo_redo_round_trip() {
    let mut s = Session::new();
    s.set_tool(ToolKind::PlaceMember);
    for p in [Point::new(0.0, 0.0), Point::new(250.0, 0.0)] {
        down(&mut s, p.x, p.y);
        up(&mut s, p.x, p.y);
    }
    let drawn = s.document.snapshot();
    assert_eq!(s.document.members().len(), 1);

    s.handle_key(KeyEvent::Pressed(keys::CONTROL.to_string()));
    assert!(s.handle_key(KeyEvent::Pressed("z".to_string())));
    assert!(s.document.members().is_empty());
    assert!(s.handle_key(KeyEvent::Pressed("y".to_string())));
    assert_eq!(s.document.snapshot(), drawn);
}

#[test]
fn test_memory_storage_round_trip() {
    let s = session_with_beam();
    let storage = MemoryStorage::new();
    storage.save("plan", &s.document).unwrap();
    assert!(storage.exists("plan").unwrap());

    let mut reopened = Session::new();
    let text = s.document.to_json().unwrap();
    reopened.open_json(&text).unwrap();
    let loaded = storage.load("plan").unwrap();
    assert_eq!(loaded.members().len(), 1);
    assert_eq!(reopened.document.nodes(), loaded.nodes());
    assert_eq!(reopened.history.undo_len(), 0);
}
