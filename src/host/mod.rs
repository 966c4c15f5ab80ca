//! host
//!
//! Single interface to the host hierarchy engine.
//!
//! This module is the **single doorway** between the wireframe tree and
//! whatever engine actually owns the screen: every stack mutation, modal
//! presentation, and change notification crosses this boundary and no
//! other. Wireframes never reach around it, and application code must
//! not touch the engine directly at all - doing so is exactly the
//! bypass the reconciliation layer treats as a fatal consistency
//! violation.
//!
//! # Architecture
//!
//! [`HostHierarchy`] abstracts the engine's three capabilities:
//!
//! - Stack containers: set contents as a whole, read contents back
//! - Modal presentation: present / dismiss one unit per presenter
//! - Notifications: "will show" / "did show" for stack containers, and
//!   outside-tap dismissal plus reposition callbacks for anchored
//!   popovers
//!
//! Notification delivery is synchronous and may reenter the wireframe
//! tree before the triggering call returns. Engines must invoke
//! observers with no internal borrows held, and wireframes must likewise
//! not hold borrows across any `HostHierarchy` call.
//!
//! # Invariants
//!
//! - One stack observer per container: the wireframe managing a
//!   container is the sole recipient of its notifications, and
//!   registering a second observer is a programmer error
//! - Observer registrations are owned as [`Subscription`] values and
//!   torn down deterministically when the owning wireframe leaves the
//!   tree, never leaked into a global callback table

use std::rc::Weak;

use crate::core::{AnchorRect, PresentationStyle, ScreenUnit, TransitionStyle};

pub mod mock;

pub use mock::{Delivery, MockHost};

/// Receives change notifications for one stack container.
///
/// Implemented by the stack wireframe managing the container; `did_show`
/// is the primary reconciliation trigger.
pub trait StackObserver {
    /// The host is about to show `unit` in the container.
    ///
    /// Fires even for interactive transitions that are later aborted
    /// (a started-then-cancelled back swipe), so nothing may act on it.
    fn will_show(&self, unit: &ScreenUnit, animated: bool);

    /// The host finished showing `unit` in the container.
    ///
    /// At delivery time the host's stack contents already reflect the
    /// state AFTER showing `unit`.
    fn did_show(&self, unit: &ScreenUnit, animated: bool);
}

/// Receives callbacks for one anchored (popover) presentation.
///
/// Implemented by the wireframe whose screen unit is presented in the
/// popover: it owns the popover's lifetime on the host side.
pub trait PopoverObserver {
    /// The user tapped outside the popover and the host dismissed it.
    ///
    /// The host has already removed the unit when this fires; only the
    /// model still needs correcting.
    fn popover_dismissed_externally(&self);

    /// The host is about to move the popover, e.g. on rotation.
    ///
    /// `proposed` holds the anchor region the host intends to use and
    /// may be adjusted in place.
    fn will_reposition(&self, proposed: &mut AnchorRect);
}

/// An owned observer registration.
///
/// Dropping (or explicitly cancelling) the subscription removes the
/// observer from the engine. Wireframes keep their subscriptions in
/// their own state so teardown happens exactly when they leave the tree.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Create a subscription whose teardown runs `cancel`.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Tear the registration down now instead of at drop time.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The host hierarchy engine.
///
/// Implemented by a platform adapter over the real engine, and by
/// [`MockHost`] for tests. All methods are synchronous; mutating calls
/// may deliver observer notifications before they return.
pub trait HostHierarchy {
    /// Replace the contents of the stack container owned by `container`
    /// with `units`, bottom to top.
    fn set_stack(&self, container: &ScreenUnit, units: &[ScreenUnit], animated: bool);

    /// Read the current contents of the stack container owned by
    /// `container`, bottom to top.
    ///
    /// During a host-driven transition this is the state the transition
    /// is moving toward, matching what `did_show` observers see.
    fn stack_contents(&self, container: &ScreenUnit) -> Vec<ScreenUnit>;

    /// Register `observer` as the sole notification recipient for the
    /// stack container owned by `container`.
    ///
    /// Registering a second observer for the same container is a
    /// programmer error and panics.
    fn observe_stack(
        &self,
        container: &ScreenUnit,
        observer: Weak<dyn StackObserver>,
    ) -> Subscription;

    /// Present `unit` modally on top of `presenter`.
    fn present(
        &self,
        presenter: &ScreenUnit,
        unit: &ScreenUnit,
        style: &PresentationStyle,
        transition: TransitionStyle,
        animated: bool,
    );

    /// Dismiss whatever `presenter` currently presents.
    fn dismiss(&self, presenter: &ScreenUnit, animated: bool);

    /// The unit `presenter` currently presents, if any.
    fn presented_unit(&self, presenter: &ScreenUnit) -> Option<ScreenUnit>;

    /// Whether `unit` is presented but mid-dismissal.
    fn is_dismissing(&self, unit: &ScreenUnit) -> bool;

    /// Register `observer` for outside-tap dismissal and reposition
    /// callbacks of the popover presenting `unit`.
    fn observe_popover(
        &self,
        unit: &ScreenUnit,
        observer: Weak<dyn PopoverObserver>,
    ) -> Subscription;
}
