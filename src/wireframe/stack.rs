//! wireframe::stack
//!
//! Stack wireframes and host-state reconciliation.
//!
//! A stack wireframe owns an ordered sequence of child wireframes mapped
//! 1:1 onto a host stack container. Commands mutate the model first and
//! the host second; host-originated changes (back button, edge swipe, an
//! already-active branch re-selected) arrive as `did_show` notifications
//! and are reconciled back into the model.
//!
//! # Reconciliation
//!
//! The host's stack contents and the model can legitimately disagree
//! while a multi-step command sequence is still being shown - the host
//! notifies per intermediate screen before the final one is visible. The
//! `was_shown` flag on each child tells these benign transients apart
//! from genuine external changes: only a mismatch involving a unit that
//! has already been on screen triggers a rebuild, and the rebuild
//! replaces the backing list directly so no redundant host mutation is
//! issued.
//!
//! # Invariants
//!
//! - `children` is never empty once set; a command that would empty the
//!   stack is a programmer error
//! - The model is updated before the host is instructed, so synchronous
//!   notifications observe the new model
//! - `children` is always a superset of the host's stack contents while
//!   a transition is in flight; the host reporting a unit the model does
//!   not know means the command protocol was bypassed, which is fatal

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{AnchorRect, ScreenUnit, StackSnapshot};
use crate::dispatch::{dispatch, NavigationCommand, Outcome};
use crate::host::{HostHierarchy, PopoverObserver, StackObserver, Subscription};

use super::leaf::PresenterState;
use super::{same_wireframe, WeakWireframe, Wireframe, WireframeKind, WireframeRef};

/// A wireframe owning an ordered stack of children in a host stack
/// container.
///
/// The container's own screen unit is the stack's identity toward the
/// host; the children's units are its contents. A stack wireframe is
/// also a presenter, so modal presentation commands reaching it behave
/// exactly as they do on a leaf.
pub struct StackWireframe {
    state: PresenterState,
    children: RefCell<Vec<WireframeRef>>,
    subscription: RefCell<Option<Subscription>>,
}

impl StackWireframe {
    /// Create a stack wireframe managing `container` with the given
    /// initial children, bottom to top.
    ///
    /// From this point on this wireframe manages the container: do not
    /// mutate the container's stack through the host directly, and do
    /// not register competing observers for it - the wireframe must be
    /// the sole recipient of its change notifications.
    ///
    /// # Panics
    ///
    /// Panics if `children` is empty or contains a stack-kind wireframe.
    pub fn new(
        host: Rc<dyn HostHierarchy>,
        container: ScreenUnit,
        children: Vec<WireframeRef>,
    ) -> Rc<Self> {
        let stack = Rc::new(Self {
            state: PresenterState::new(host.clone(), container.clone()),
            children: RefCell::new(Vec::new()),
            subscription: RefCell::new(None),
        });
        let me: WeakWireframe = Rc::downgrade(&(stack.clone() as Rc<dyn Wireframe>));
        stack.state.bind(me);

        let observer: std::rc::Weak<dyn StackObserver> =
            Rc::downgrade(&(stack.clone() as Rc<dyn StackObserver>));
        *stack.subscription.borrow_mut() = Some(host.observe_stack(&container, observer));

        stack.set_children(children, false);
        stack
    }

    /// The current children, bottom to top.
    pub fn children(&self) -> Vec<WireframeRef> {
        self.children.borrow().clone()
    }

    /// Number of children on the stack.
    pub fn depth(&self) -> usize {
        self.children.borrow().len()
    }

    /// Point-in-time record of the stack's contents.
    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            container: self.state.unit(),
            units: self.unit_list(),
        }
    }

    /// Install the callback adjusting this wireframe's popover anchor
    /// region when the host repositions it.
    pub fn set_reposition_callback(&self, callback: impl Fn(&mut AnchorRect) + 'static) {
        self.state.set_reposition_callback(Box::new(callback));
    }

    /// Replace the stack's children wholesale.
    ///
    /// A list identity-equal to the current one is a no-op and issues no
    /// host mutation. Otherwise the model is updated first, every entry
    /// is reparented to this wireframe, and the host is instructed to
    /// adopt the new contents; children that left the list get their
    /// [`Wireframe::detached`] hook once the host call returns.
    ///
    /// # Panics
    ///
    /// Panics if `new_children` is empty or contains a stack-kind
    /// wireframe.
    pub fn set_children(&self, new_children: Vec<WireframeRef>, animated: bool) {
        let old_children = self.children.borrow().clone();
        let unchanged = old_children.len() == new_children.len()
            && old_children
                .iter()
                .zip(&new_children)
                .all(|(old, new)| same_wireframe(old, new));
        if unchanged {
            return;
        }

        assert!(
            !new_children.is_empty(),
            "stack {:?} cannot take an empty child list",
            self.state.unit()
        );
        for child in &new_children {
            assert!(
                child.kind() != WireframeKind::Stack,
                "cannot place stack container {:?} inside stack {:?}",
                child.screen_unit(),
                self.state.unit()
            );
        }

        // The children list must be updated BEFORE the host mutation:
        // the host may notify synchronously, and reconciliation must
        // observe the new model, not the stale one.
        *self.children.borrow_mut() = new_children.clone();
        let me = self.state.me();
        for child in &new_children {
            child.set_parent(&me);
        }

        let units: Vec<ScreenUnit> = new_children
            .iter()
            .map(|child| child.screen_unit())
            .collect();
        self.state.host().set_stack(&self.state.unit(), &units, animated);

        for departed in Self::departed(&old_children, &new_children) {
            departed.detached();
        }
    }

    /// Children of `all` that do not appear in `kept`, by identity.
    fn departed<'a>(
        all: &'a [WireframeRef],
        kept: &'a [WireframeRef],
    ) -> impl Iterator<Item = &'a WireframeRef> {
        all.iter()
            .filter(move |&old| !kept.iter().any(|new| same_wireframe(new, old)))
    }

    fn push_wireframe(&self, wireframe: &WireframeRef, animated: bool) {
        let mut new_children = self.children.borrow().clone();
        new_children.push(wireframe.clone());
        self.set_children(new_children, animated);
    }

    fn pop_wireframe(&self, wireframe: &WireframeRef, animated: bool) {
        let mut new_children = self.children.borrow().clone();
        let top = new_children
            .last()
            .expect("a stack wireframe is never empty")
            .clone();
        assert!(
            same_wireframe(wireframe, &top),
            "cannot pop {:?}: the top of {:?} is {:?}",
            wireframe.screen_unit(),
            self.state.unit(),
            top.screen_unit()
        );
        new_children.pop();
        self.set_children(new_children, animated);
    }

    fn unit_list(&self) -> Vec<ScreenUnit> {
        self.children
            .borrow()
            .iter()
            .map(|child| child.screen_unit())
            .collect()
    }

    fn child_owning_unit(&self, unit: &ScreenUnit) -> Option<WireframeRef> {
        self.children
            .borrow()
            .iter()
            .find(|child| child.screen_unit() == *unit)
            .cloned()
    }
}

impl Wireframe for StackWireframe {
    fn screen_unit(&self) -> ScreenUnit {
        self.state.unit()
    }

    fn parent(&self) -> Option<WireframeRef> {
        self.state.parent()
    }

    fn set_parent(&self, parent: &WireframeRef) {
        self.state.set_parent(parent);
    }

    fn active_child(&self) -> Option<WireframeRef> {
        // The top of the stack, not the presented child: what's in front
        // under a stack container is its top entry.
        self.children.borrow().last().cloned()
    }

    fn handle(&self, command: &NavigationCommand) -> Outcome {
        if self.state.handle_presentation(command).is_accepted() {
            return Outcome::Accepted;
        }

        match command {
            NavigationCommand::Push {
                wireframe,
                animated,
            } => {
                self.push_wireframe(wireframe, *animated);
                Outcome::Accepted
            }
            NavigationCommand::Pop {
                wireframe,
                animated,
            } => {
                self.pop_wireframe(wireframe, *animated);
                Outcome::Accepted
            }
            NavigationCommand::ReplaceStack {
                wireframes,
                animated,
            } => {
                self.set_children(wireframes.clone(), *animated);
                Outcome::Accepted
            }
            NavigationCommand::ExternalStateChanged { previous } => {
                // Informational; absorbed here so a host-originated
                // change never becomes a missing-recipient panic.
                log::debug!(
                    "{:?} observed external state change (previously {:?})",
                    self.state.unit(),
                    previous
                );
                Outcome::Accepted
            }
            _ => Outcome::Declined,
        }
    }

    fn was_shown(&self) -> bool {
        self.state.was_shown()
    }

    fn mark_shown(&self) {
        self.state.mark_shown();
    }

    fn kind(&self) -> WireframeKind {
        WireframeKind::Stack
    }

    fn detached(&self) {
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.cancel();
        }
        log::debug!("{:?} detached from the wireframe tree", self.state.unit());
    }

    fn as_popover_observer(self: Rc<Self>) -> Option<Rc<dyn PopoverObserver>> {
        Some(self)
    }
}

impl StackObserver for StackWireframe {
    fn will_show(&self, _unit: &ScreenUnit, _animated: bool) {
        // Fires even for interactive transitions that are later aborted;
        // the stack must not act before did_show.
    }

    fn did_show(&self, unit: &ScreenUnit, _animated: bool) {
        let host_units = self.state.host().stack_contents(&self.state.unit());
        let model_units = self.unit_list();
        let out_of_sync = host_units != model_units;

        // The shown unit may already have been on screen (navigating
        // back), but may also not: a multi-step sequence notifies per
        // intermediate screen, and the host contents lag the model until
        // the final screen is visible.
        let target_was_shown = self
            .child_owning_unit(unit)
            .map(|child| child.was_shown())
            .unwrap_or(false);

        if out_of_sync && target_was_shown {
            // Genuine host-originated change: rebuild the model from the
            // host's current truth.
            let previous = self.snapshot();
            let known_children = self.children.borrow().clone();
            let rebuilt: Vec<WireframeRef> = host_units
                .iter()
                .map(|host_unit| {
                    known_children
                        .iter()
                        .find(|child| child.screen_unit() == *host_unit)
                        .cloned()
                        .unwrap_or_else(|| {
                            panic!(
                                "host stack for {:?} holds {:?}, which the model does not know; \
                                 the host hierarchy must only ever contain command-managed units",
                                self.state.unit(),
                                host_unit
                            )
                        })
                })
                .collect();

            log::debug!(
                "{:?} reconciling host-originated change: {} -> {} children",
                self.state.unit(),
                known_children.len(),
                rebuilt.len()
            );

            // Replace the backing list only: set_children would re-issue
            // the host mutation this change came from.
            *self.children.borrow_mut() = rebuilt.clone();
            for departed in Self::departed(&known_children, &rebuilt) {
                departed.detached();
            }

            dispatch(
                &self.state.me(),
                NavigationCommand::ExternalStateChanged { previous },
            );
        }

        assert!(
            self.children.borrow().len() >= host_units.len(),
            "stack {:?} lost track of the host contents; always navigate through commands",
            self.state.unit()
        );

        // Mark every child shown, not just the notified one: in a
        // multi-step transition the intermediate entries were shown
        // without an individual notification each.
        for child in self.children.borrow().iter() {
            child.mark_shown();
        }
    }
}

impl PopoverObserver for StackWireframe {
    fn popover_dismissed_externally(&self) {
        let me = self.state.me();
        dispatch(
            &me,
            NavigationCommand::PopoverDismissedExternally {
                wireframe: me.clone(),
            },
        );
    }

    fn will_reposition(&self, proposed: &mut AnchorRect) {
        self.state.reposition(proposed);
    }
}
