// Pointer controller unit tests

use brandmark::watermark::*;

fn rect() -> ElementRect {
    ElementRect::new(20.0, 40.0, 250.0, 162.5)
}

#[test]
fn test_committed_anchor_always_in_unit_square() {
    // Test: Anchor stays within [0,1]x[0,1] however far the pointer travels
    let mut pointer = PointerController::new();
    pointer.handle(PointerEvent::down(100.0, 100.0), &rect());

    let coords = [-1e6f32, -500.0, -1.0, 0.0, 20.0, 145.0, 270.0, 271.0, 1e4, 1e9];
    for &x in &coords {
        for &y in &coords {
            let anchor = pointer.handle(PointerEvent::moved(x, y), &rect()).unwrap();
            assert!((0.0..=1.0).contains(&anchor.x), "x out of range for {}", x);
            assert!((0.0..=1.0).contains(&anchor.y), "y out of range for {}", y);
        }
    }
}

#[test]
fn test_moves_without_down_never_commit() {
    // Test: pointer-move before any pointer-down is ignored
    let mut pointer = PointerController::new();
    for i in 0..20 {
        let v = i as f32 * 13.0;
        assert!(pointer.handle(PointerEvent::moved(v, v), &rect()).is_none());
    }
    assert_eq!(pointer.state(), DragState::Idle);
}

#[test]
fn test_full_drag_cycle() {
    // Test: down commits, moves commit, up ends, later moves ignored
    let mut pointer = PointerController::new();

    let down = pointer.handle(PointerEvent::down(20.0, 40.0), &rect());
    assert_eq!(down, Some(Anchor::new(0.0, 0.0)));

    let moved = pointer.handle(PointerEvent::moved(270.0, 202.5), &rect());
    assert_eq!(moved, Some(Anchor::new(1.0, 1.0)));

    assert!(pointer.handle(PointerEvent::up(270.0, 202.5), &rect()).is_none());
    assert!(pointer.handle(PointerEvent::moved(145.0, 121.25), &rect()).is_none());

    // A fresh press starts a new drag
    assert!(pointer.handle(PointerEvent::down(145.0, 121.25), &rect()).is_some());
    assert!(pointer.is_dragging());
}

#[test]
fn test_leave_ends_drag() {
    let mut pointer = PointerController::new();
    pointer.handle(PointerEvent::down(50.0, 50.0), &rect());
    pointer.handle(PointerEvent::leave(-10.0, -10.0), &rect());
    assert_eq!(pointer.state(), DragState::Idle);
}
