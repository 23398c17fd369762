use wetbulb_globe::RotationState;
use wetbulb_globe::interaction::{InteractionController, InteractionMode, SelectionChange};

#[test]
fn drag_rotates_from_anchor_without_drift() {
    let mut ic = InteractionController::default();
    let start = RotationState::new(-30.0, -20.0, 5.0);
    ic.pointer_down(100.0, 100.0, start);
    assert!(ic.is_dragging());

    let r = ic.pointer_move(110.0, 90.0).unwrap();
    assert!((r.lambda - -27.0).abs() < 1e-9);
    assert!((r.phi - -17.0).abs() < 1e-9);
    assert_eq!(r.gamma, 5.0);

    let _ = ic.pointer_move(180.0, 20.0);
    let back = ic.pointer_move(100.0, 100.0).unwrap();
    assert_eq!(back, start);

    ic.pointer_up();
    assert_eq!(ic.mode(), InteractionMode::AutoRotating);
    assert!(ic.pointer_move(120.0, 100.0).is_none());
}

#[test]
fn second_drag_starts_from_fresh_anchor() {
    let mut ic = InteractionController::default();
    ic.pointer_down(100.0, 100.0, RotationState::new(-30.0, -20.0, 0.0));
    let left = ic.pointer_move(150.0, 60.0).unwrap();
    ic.pointer_up();
    assert!((left.lambda - -15.0).abs() < 1e-9);
    assert!((left.phi - -8.0).abs() < 1e-9);

    ic.pointer_down(400.0, 300.0, left);
    assert_eq!(ic.pointer_move(400.0, 300.0), Some(left));
    let r = ic.pointer_move(380.0, 320.0).unwrap();
    assert!((r.lambda - (left.lambda - 20.0 * 0.3)).abs() < 1e-9);
    assert!((r.phi - (left.phi - 20.0 * 0.3)).abs() < 1e-9);
    assert_eq!(r.gamma, left.gamma);
}

#[test]
fn ticks_spin_lambda_only_when_auto_rotating() {
    let ic = InteractionController::default();
    let mut r = RotationState::default();
    for _ in 0..10 {
        r = ic.tick(r).unwrap();
    }
    assert!((r.lambda - -0.3).abs() < 1e-9);
    assert_eq!((r.phi, r.gamma), (0.0, 0.0));
}

#[test]
fn hover_pauses_and_leave_resumes() {
    let mut ic = InteractionController::default();
    assert!(ic.hover_enter("Alpha"));
    assert!(!ic.hover_enter("Alpha"));
    assert_eq!(ic.mode(), InteractionMode::HoverPaused);
    assert!(ic.tick(RotationState::default()).is_none());

    assert!(ic.hover_leave());
    assert!(!ic.hover_leave());
    assert_eq!(ic.mode(), InteractionMode::AutoRotating);
}

#[test]
fn hover_during_drag_keeps_dragging() {
    let mut ic = InteractionController::default();
    ic.pointer_down(0.0, 0.0, RotationState::default());
    ic.hover_enter("Alpha");
    assert!(ic.is_dragging());
    ic.pointer_up();
    assert_eq!(ic.mode(), InteractionMode::HoverPaused);
}

#[test]
fn click_toggles_selection() {
    let mut ic = InteractionController::default();
    assert_eq!(ic.click("Alpha"), SelectionChange::Selected("Alpha".into()));
    assert_eq!(ic.mode(), InteractionMode::Idle);
    assert!(!ic.auto_rotate_enabled());

    assert_eq!(ic.click("Alpha"), SelectionChange::Cleared("Alpha".into()));
    assert_eq!(ic.selected(), None);
    assert_eq!(ic.mode(), InteractionMode::AutoRotating);
}

#[test]
fn clicking_another_country_moves_selection() {
    let mut ic = InteractionController::default();
    ic.click("Alpha");
    assert_eq!(ic.click("Beta"), SelectionChange::Selected("Beta".into()));
    assert_eq!(ic.selected(), Some("Beta"));
}

#[test]
fn selection_holds_globe_after_hover_and_drag() {
    let mut ic = InteractionController::default();
    ic.click("Alpha");
    ic.hover_enter("Beta");
    assert_eq!(ic.mode(), InteractionMode::HoverPaused);
    ic.hover_leave();
    assert_eq!(ic.mode(), InteractionMode::Idle);

    ic.pointer_down(0.0, 0.0, RotationState::default());
    ic.pointer_up();
    assert_eq!(ic.mode(), InteractionMode::Idle);
    assert_eq!(ic.selected(), Some("Alpha"));
}
