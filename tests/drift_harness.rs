//! Out-of-band drift harness.
//!
//! The reconciliation promise is that the model stays correct when the
//! host changes state on its own: back-gestures, an already-active
//! branch re-selected, popovers dismissed by outside taps. These tests
//! inject exactly those host-originated mutations through the mock
//! host's drift hooks and assert that:
//!
//! 1. Genuine external changes rebuild the model and emit exactly one
//!    external-state-changed command carrying the previous state
//! 2. Benign transients (notifications for never-shown screens during a
//!    multi-step sequence) change nothing and emit nothing
//! 3. Host contents the model does not know about - the signature of
//!    direct manipulation bypassing the command protocol - are fatal

use std::cell::RefCell;
use std::rc::Rc;

use trellis::core::{
    AnchorTarget, ArrowDirections, PresentationStyle, ScreenUnit, StackSnapshot, TransitionStyle,
};
use trellis::dispatch::{dispatch, NavigationCommand, Outcome};
use trellis::host::{Delivery, HostHierarchy, MockHost};
use trellis::wireframe::{
    same_wireframe, LeafWireframe, StackWireframe, Wireframe, WireframeKind, WireframeRef,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Leaf double that records every external-state-changed command offered
/// to it, then declines so the owning stack still absorbs it.
struct RecordingLeaf {
    inner: Rc<LeafWireframe>,
    external_changes: RefCell<Vec<StackSnapshot>>,
}

impl RecordingLeaf {
    fn new(host: &Rc<MockHost>, label: &'static str) -> Rc<Self> {
        Rc::new(Self {
            inner: LeafWireframe::new(host.clone(), ScreenUnit::labeled(label)),
            external_changes: RefCell::new(Vec::new()),
        })
    }

    fn changes(&self) -> Vec<StackSnapshot> {
        self.external_changes.borrow().clone()
    }
}

impl Wireframe for RecordingLeaf {
    fn screen_unit(&self) -> ScreenUnit {
        self.inner.screen_unit()
    }

    fn parent(&self) -> Option<WireframeRef> {
        self.inner.parent()
    }

    fn set_parent(&self, parent: &WireframeRef) {
        self.inner.set_parent(parent);
    }

    fn active_child(&self) -> Option<WireframeRef> {
        self.inner.active_child()
    }

    fn handle(&self, command: &NavigationCommand) -> Outcome {
        if let NavigationCommand::ExternalStateChanged { previous } = command {
            self.external_changes.borrow_mut().push(previous.clone());
            return Outcome::Declined;
        }
        self.inner.handle(command)
    }

    fn was_shown(&self) -> bool {
        self.inner.was_shown()
    }

    fn mark_shown(&self) {
        self.inner.mark_shown();
    }

    fn kind(&self) -> WireframeKind {
        WireframeKind::Leaf
    }
}

fn leaf(host: &Rc<MockHost>, label: &'static str) -> Rc<LeafWireframe> {
    LeafWireframe::new(host.clone(), ScreenUnit::labeled(label))
}

// ============================================================================
// Genuine External Changes
// ============================================================================

#[test]
fn back_gesture_reconciles_and_reports_exactly_once() {
    let host = MockHost::new();
    let bottom = leaf(&host, "bottom");
    let recorder = RecordingLeaf::new(&host, "middle");
    let top = leaf(&host, "top");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![bottom.clone(), recorder.clone(), top.clone()],
    );
    assert!(top.was_shown());

    host.simulate_back(&stack.screen_unit());

    // The model shrank to match the host.
    assert_eq!(stack.depth(), 2);
    let model: Vec<ScreenUnit> = stack
        .children()
        .iter()
        .map(|child| child.screen_unit())
        .collect();
    assert_eq!(model, host.stack_contents(&stack.screen_unit()));

    // Exactly one report, carrying the pre-change state.
    let changes = recorder.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].container, stack.screen_unit());
    assert_eq!(
        changes[0].units,
        vec![
            bottom.screen_unit(),
            recorder.screen_unit(),
            top.screen_unit()
        ]
    );
}

#[test]
fn retapping_the_active_branch_pops_to_the_root() {
    let host = MockHost::new();
    let recorder = RecordingLeaf::new(&host, "root");
    let middle = leaf(&host, "middle");
    let top = leaf(&host, "top");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![recorder.clone(), middle, top],
    );

    // An already-active branch re-tap makes the host pop to the root in
    // one step.
    host.drift_stack_contents(
        &stack.screen_unit(),
        vec![recorder.screen_unit()],
        &recorder.screen_unit(),
    );

    assert_eq!(stack.depth(), 1);
    let changes = recorder.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].depth(), 3);
}

// ============================================================================
// Benign Transients
// ============================================================================

#[test]
fn intermediate_notifications_for_unshown_screens_change_nothing() {
    let host = MockHost::new();
    let root = leaf(&host, "root");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![root.clone()],
    );
    assert!(root.was_shown());

    // From here on the host lags behind commands, as a real animated
    // host does during a multi-screen sequence.
    host.set_delivery(Delivery::Queued);

    let middle = leaf(&host, "middle");
    let recorder = RecordingLeaf::new(&host, "top");
    let origin: WireframeRef = stack.clone();
    dispatch(
        &origin,
        NavigationCommand::Push {
            wireframe: middle.clone(),
            animated: true,
        },
    );
    dispatch(
        &origin,
        NavigationCommand::Push {
            wireframe: recorder.clone(),
            animated: true,
        },
    );
    let staged = stack.children();
    assert_eq!(staged.len(), 3);
    assert_eq!(host.pending_notifications(), 2);

    // The first notification reports the middle screen while the model
    // already holds the whole sequence: out of sync, but the middle
    // screen was never shown, so this is a benign transient.
    assert!(host.pump_one());
    assert_eq!(stack.depth(), 3);
    for (before, after) in staged.iter().zip(stack.children().iter()) {
        assert!(same_wireframe(before, after));
    }
    assert!(recorder.changes().is_empty());

    // Entries shown as part of the multi-step transition are treated as
    // shown even without an individual notification each.
    assert!(middle.was_shown());
    assert!(recorder.was_shown());

    // The final notification catches the host up.
    assert!(host.pump_one());
    let model: Vec<ScreenUnit> = stack
        .children()
        .iter()
        .map(|child| child.screen_unit())
        .collect();
    assert_eq!(model, host.stack_contents(&stack.screen_unit()));
    assert!(recorder.changes().is_empty());
}

// ============================================================================
// Protocol Bypass Is Fatal
// ============================================================================

#[test]
#[should_panic(expected = "which the model does not know")]
fn host_reporting_an_unknown_unit_is_fatal() {
    let host = MockHost::new();
    let bottom = leaf(&host, "bottom");
    let top = leaf(&host, "top");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![bottom.clone(), top],
    );

    // Someone slipped a unit into the host stack without a command.
    let foreign = ScreenUnit::labeled("foreign");
    host.drift_stack_contents(
        &stack.screen_unit(),
        vec![bottom.screen_unit(), foreign],
        &bottom.screen_unit(),
    );
}

#[test]
#[should_panic(expected = "lost track of the host contents")]
fn host_growing_beyond_the_model_is_fatal() {
    let host = MockHost::new();
    let bottom = leaf(&host, "bottom");
    let top = leaf(&host, "top");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![bottom.clone(), top.clone()],
    );

    // A never-shown foreign unit cannot be told apart from a transient,
    // but the host holding more than the model is impossible under the
    // command protocol.
    let foreign = ScreenUnit::labeled("foreign");
    host.drift_stack_contents(
        &stack.screen_unit(),
        vec![bottom.screen_unit(), top.screen_unit(), foreign.clone()],
        &foreign,
    );
}

// ============================================================================
// Popover Dismissal By Outside Tap
// ============================================================================

#[test]
fn outside_tap_clears_only_the_presenter_slot() {
    let host = MockHost::new();
    let root = leaf(&host, "root");
    let top = leaf(&host, "top");
    let stack = StackWireframe::new(
        host.clone(),
        ScreenUnit::labeled("stack"),
        vec![root, top.clone()],
    );

    let popover = leaf(&host, "popover");
    let origin: WireframeRef = stack.clone();
    dispatch(
        &origin,
        NavigationCommand::Present {
            wireframe: popover.clone(),
            style: PresentationStyle::PopoverFromElement {
                anchor: AnchorTarget::labeled("share"),
                arrows: ArrowDirections::ANY,
            },
            transition: TransitionStyle::CrossDissolve,
            animated: true,
        },
    );
    let presented = top.presented_child().expect("top leaf presented");
    let popover_ref: WireframeRef = popover.clone();
    assert!(same_wireframe(&presented, &popover_ref));

    host.simulate_popover_outside_tap(&top.screen_unit());

    // The presenter's slot cleared; the stack itself is untouched.
    assert!(top.presented_child().is_none());
    assert_eq!(stack.depth(), 2);
    let model: Vec<ScreenUnit> = stack
        .children()
        .iter()
        .map(|child| child.screen_unit())
        .collect();
    assert_eq!(model, host.stack_contents(&stack.screen_unit()));
}
