//! host::mock
//!
//! In-memory host hierarchy engine for tests.
//!
//! `MockHost` implements [`HostHierarchy`] without any real screen
//! behind it, and doubles as a drift harness: tests use it to inject the
//! host-originated mutations the reconciliation layer exists for
//! (back-gestures, outside-tap popover dismissals, direct manipulation
//! that bypasses the command protocol).
//!
//! # Notification Delivery
//!
//! Real engines animate, so "did finish showing" can arrive long after
//! the mutation that caused it, and a multi-step command sequence can
//! complete before the first notification lands. The mock reproduces
//! both timings:
//!
//! - [`Delivery::Immediate`] - every mutation notifies synchronously
//!   before the mutating call returns (the reentrancy worst case)
//! - [`Delivery::Queued`] - notifications accumulate and are delivered
//!   one at a time via [`MockHost::pump_one`], which is how tests stage
//!   the benign-transient scenarios
//!
//! # Invariants
//!
//! - Observers are invoked with no internal borrow held, so they may
//!   reenter any `HostHierarchy` method
//! - One stack observer per container, one popover observer per unit;
//!   a second registration panics (sole-recipient contract)

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::core::{AnchorRect, PresentationStyle, ScreenUnit, TransitionStyle};

use super::{HostHierarchy, PopoverObserver, StackObserver, Subscription};

/// Notification delivery timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Notify synchronously inside the mutating call.
    #[default]
    Immediate,

    /// Accumulate notifications; deliver via [`MockHost::pump_one`].
    Queued,
}

#[derive(Default)]
struct StackState {
    visible: Vec<ScreenUnit>,
    observer: Option<Weak<dyn StackObserver>>,
    set_stack_calls: usize,
}

struct PresentedState {
    unit: ScreenUnit,
    style: PresentationStyle,
}

struct QueuedNotice {
    container: ScreenUnit,
    contents: Vec<ScreenUnit>,
    showing: ScreenUnit,
    animated: bool,
}

#[derive(Default)]
struct HostState {
    stacks: HashMap<ScreenUnit, StackState>,
    presented: HashMap<ScreenUnit, PresentedState>,
    popover_observers: HashMap<ScreenUnit, Weak<dyn PopoverObserver>>,
    delivery: Delivery,
    queue: VecDeque<QueuedNotice>,
}

/// In-memory [`HostHierarchy`] engine.
pub struct MockHost {
    me: RefCell<Weak<MockHost>>,
    state: RefCell<HostState>,
}

impl MockHost {
    /// Create a mock engine with immediate notification delivery.
    pub fn new() -> Rc<Self> {
        let host = Rc::new(Self {
            me: RefCell::new(Weak::new()),
            state: RefCell::new(HostState::default()),
        });
        *host.me.borrow_mut() = Rc::downgrade(&host);
        host
    }

    /// Switch notification delivery timing.
    pub fn set_delivery(&self, delivery: Delivery) {
        self.state.borrow_mut().delivery = delivery;
    }

    /// Deliver the oldest queued notification.
    ///
    /// Applies the staged stack contents, then notifies the container's
    /// observer. Returns `false` when the queue is empty.
    pub fn pump_one(&self) -> bool {
        let (notice, observer) = {
            let mut state = self.state.borrow_mut();
            let Some(notice) = state.queue.pop_front() else {
                return false;
            };
            let entry = state.stacks.entry(notice.container.clone()).or_default();
            entry.visible = notice.contents.clone();
            (notice, entry.observer.clone())
        };
        log::trace!(
            "mock host: delivering did_show for {:?} in {:?}",
            notice.showing,
            notice.container
        );
        notify_stack(observer, &notice.showing, notice.animated);
        true
    }

    /// Deliver every queued notification in order.
    pub fn pump_all(&self) {
        while self.pump_one() {}
    }

    /// Number of staged, undelivered notifications.
    pub fn pending_notifications(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// How many times `set_stack` was called for `container`.
    ///
    /// Lets tests assert that a model no-op really issued no host
    /// mutation.
    pub fn set_stack_calls(&self, container: &ScreenUnit) -> usize {
        self.state
            .borrow()
            .stacks
            .get(container)
            .map(|entry| entry.set_stack_calls)
            .unwrap_or(0)
    }

    /// Simulate the user navigating back in `container` (back button or
    /// edge swipe): the visible stack shrinks by one, then the host
    /// reports having shown the uncovered unit.
    pub fn simulate_back(&self, container: &ScreenUnit) {
        let (uncovered, observer) = {
            let mut state = self.state.borrow_mut();
            let entry = state
                .stacks
                .get_mut(container)
                .expect("simulate_back: unknown container");
            assert!(
                entry.visible.len() >= 2,
                "simulate_back: host cannot pop the root of {:?}",
                container
            );
            entry.visible.pop();
            let uncovered = entry
                .visible
                .last()
                .cloned()
                .expect("stack cannot be empty after guarded pop");
            (uncovered, entry.observer.clone())
        };
        log::trace!(
            "mock host: user navigated back in {:?}, uncovering {:?}",
            container,
            uncovered
        );
        notify_stack(observer, &uncovered, true);
    }

    /// Simulate the user tapping outside the popover presented by
    /// `presenter`: the host removes the unit, then notifies the
    /// popover's observer.
    pub fn simulate_popover_outside_tap(&self, presenter: &ScreenUnit) {
        let (unit, observer) = {
            let mut state = self.state.borrow_mut();
            let presented = state
                .presented
                .remove(presenter)
                .expect("simulate_popover_outside_tap: nothing presented");
            assert!(
                presented.style.is_anchored(),
                "outside-tap dismissal only applies to anchored styles, got {:?}",
                presented.style
            );
            let observer = state.popover_observers.get(&presented.unit).cloned();
            (presented.unit, observer)
        };
        log::trace!("mock host: outside tap dismissed popover {:?}", unit);
        if let Some(observer) = observer.and_then(|weak| weak.upgrade()) {
            observer.popover_dismissed_externally();
        }
    }

    /// Simulate the host repositioning the popover presenting `unit`,
    /// offering `proposed` to the observer. Returns the (possibly
    /// adjusted) region the host would use.
    pub fn simulate_popover_reposition(
        &self,
        unit: &ScreenUnit,
        mut proposed: AnchorRect,
    ) -> AnchorRect {
        let observer = self.state.borrow().popover_observers.get(unit).cloned();
        if let Some(observer) = observer.and_then(|weak| weak.upgrade()) {
            observer.will_reposition(&mut proposed);
        }
        proposed
    }

    /// Overwrite `container`'s visible stack WITHOUT going through the
    /// command protocol, then report `shown` as having been shown.
    ///
    /// This is the out-of-band drift hook: tests use it to stage
    /// host-originated changes (an already-active branch re-selected
    /// popping to its root) as well as the disallowed direct
    /// manipulation that reconciliation must treat as fatal.
    pub fn drift_stack_contents(
        &self,
        container: &ScreenUnit,
        units: Vec<ScreenUnit>,
        shown: &ScreenUnit,
    ) {
        let observer = {
            let mut state = self.state.borrow_mut();
            let entry = state
                .stacks
                .get_mut(container)
                .expect("drift_stack_contents: unknown container");
            entry.visible = units;
            entry.observer.clone()
        };
        notify_stack(observer, shown, false);
    }

    /// The presentation style `presenter` is currently presenting with.
    pub fn presented_style(&self, presenter: &ScreenUnit) -> Option<PresentationStyle> {
        self.state
            .borrow()
            .presented
            .get(presenter)
            .map(|presented| presented.style.clone())
    }

    fn weak(&self) -> Weak<MockHost> {
        self.me.borrow().clone()
    }
}

/// Invoke a stack observer outside of any state borrow.
fn notify_stack(observer: Option<Weak<dyn StackObserver>>, unit: &ScreenUnit, animated: bool) {
    if let Some(observer) = observer.and_then(|weak| weak.upgrade()) {
        observer.will_show(unit, animated);
        observer.did_show(unit, animated);
    }
}

impl HostHierarchy for MockHost {
    fn set_stack(&self, container: &ScreenUnit, units: &[ScreenUnit], animated: bool) {
        assert!(
            !units.is_empty(),
            "set_stack: host stack contents cannot be empty"
        );
        let top = units
            .last()
            .cloned()
            .expect("non-empty contents have a top");
        let observer = {
            let mut state = self.state.borrow_mut();
            let delivery = state.delivery;
            let entry = state.stacks.entry(container.clone()).or_default();
            entry.set_stack_calls += 1;
            match delivery {
                Delivery::Immediate => {
                    entry.visible = units.to_vec();
                    entry.observer.clone()
                }
                Delivery::Queued => {
                    let notice = QueuedNotice {
                        container: container.clone(),
                        contents: units.to_vec(),
                        showing: top.clone(),
                        animated,
                    };
                    state.queue.push_back(notice);
                    None
                }
            }
        };
        notify_stack(observer, &top, animated);
    }

    fn stack_contents(&self, container: &ScreenUnit) -> Vec<ScreenUnit> {
        self.state
            .borrow()
            .stacks
            .get(container)
            .map(|entry| entry.visible.clone())
            .unwrap_or_default()
    }

    fn observe_stack(
        &self,
        container: &ScreenUnit,
        observer: Weak<dyn StackObserver>,
    ) -> Subscription {
        {
            let mut state = self.state.borrow_mut();
            let entry = state.stacks.entry(container.clone()).or_default();
            assert!(
                entry.observer.is_none(),
                "container {:?} already has a stack observer; the managing wireframe must be the sole recipient",
                container
            );
            entry.observer = Some(observer);
        }
        let host = self.weak();
        let container = container.clone();
        Subscription::new(move || {
            if let Some(host) = host.upgrade() {
                if let Some(entry) = host.state.borrow_mut().stacks.get_mut(&container) {
                    entry.observer = None;
                }
            }
        })
    }

    fn present(
        &self,
        presenter: &ScreenUnit,
        unit: &ScreenUnit,
        style: &PresentationStyle,
        transition: TransitionStyle,
        animated: bool,
    ) {
        log::trace!(
            "mock host: presenting {:?} over {:?} ({:?}, {:?}, animated: {})",
            unit,
            presenter,
            style,
            transition,
            animated
        );
        let mut state = self.state.borrow_mut();
        let prior = state.presented.get(presenter);
        assert!(
            prior.is_none(),
            "presenter {:?} already presents {:?}",
            presenter,
            prior.map(|presented| presented.unit.clone())
        );
        state.presented.insert(
            presenter.clone(),
            PresentedState {
                unit: unit.clone(),
                style: style.clone(),
            },
        );
    }

    fn dismiss(&self, presenter: &ScreenUnit, animated: bool) {
        let mut state = self.state.borrow_mut();
        let presented = state
            .presented
            .remove(presenter)
            .expect("dismiss: presenter has nothing presented");
        log::trace!(
            "mock host: dismissed {:?} from {:?} (animated: {})",
            presented.unit,
            presenter,
            animated
        );
    }

    fn presented_unit(&self, presenter: &ScreenUnit) -> Option<ScreenUnit> {
        self.state
            .borrow()
            .presented
            .get(presenter)
            .map(|presented| presented.unit.clone())
    }

    fn is_dismissing(&self, _unit: &ScreenUnit) -> bool {
        // Mock dismissals complete synchronously; nothing is ever caught
        // mid-flight.
        false
    }

    fn observe_popover(
        &self,
        unit: &ScreenUnit,
        observer: Weak<dyn PopoverObserver>,
    ) -> Subscription {
        {
            let mut state = self.state.borrow_mut();
            assert!(
                !state.popover_observers.contains_key(unit),
                "unit {:?} already has a popover observer",
                unit
            );
            state.popover_observers.insert(unit.clone(), observer);
        }
        let host = self.weak();
        let unit = unit.clone();
        Subscription::new(move || {
            if let Some(host) = host.upgrade() {
                host.state.borrow_mut().popover_observers.remove(&unit);
            }
        })
    }
}
