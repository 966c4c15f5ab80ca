//! wireframe::leaf
//!
//! Leaf wireframes and the shared presentation core.
//!
//! A leaf wireframe owns one screen unit and may present at most one
//! modal child over it. The presentation logic lives in
//! [`PresenterState`] so the stack wireframe, which is also a presenter,
//! handles the same commands the same way.
//!
//! # Invariants
//!
//! - At most one presented child at a time; presenting over an occupied
//!   slot is a programmer error
//! - Dismissal is always performed by the presenter, never the
//!   presentee: commands whose target is the recipient itself are
//!   declined so they bubble up to the wireframe whose slot must be
//!   cleared

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::{AnchorRect, PresentationStyle, ScreenUnit, TransitionStyle};
use crate::dispatch::{dispatch, NavigationCommand, Outcome};
use crate::host::{HostHierarchy, PopoverObserver, Subscription};

use super::{same_wireframe, WeakWireframe, Wireframe, WireframeKind, WireframeRef};

/// Callback adjusting the anchor region when the host repositions a
/// popover (rotation, resize).
pub type RepositionCallback = Box<dyn Fn(&mut AnchorRect)>;

/// A presented modal child together with its popover registration.
///
/// Dropping this (when the slot clears) tears the popover observer down
/// with it.
struct PresentedChild {
    wireframe: WireframeRef,
    _popover_subscription: Option<Subscription>,
}

/// Presentation state and behavior shared by every presenter wireframe.
///
/// Owns the screen unit, the parent back-reference, the shown flag, and
/// the presented-child slot. The embedding wireframe routes commands
/// through [`PresenterState::handle_presentation`] before its own
/// handling.
pub(crate) struct PresenterState {
    host: Rc<dyn HostHierarchy>,
    unit: ScreenUnit,
    me: RefCell<WeakWireframe>,
    parent: RefCell<WeakWireframe>,
    was_shown: Cell<bool>,
    presented: RefCell<Option<PresentedChild>>,
    reposition: RefCell<Option<RepositionCallback>>,
}

impl PresenterState {
    pub(crate) fn new(host: Rc<dyn HostHierarchy>, unit: ScreenUnit) -> Self {
        Self {
            host,
            unit,
            me: RefCell::new(std::rc::Weak::<LeafWireframe>::new()),
            parent: RefCell::new(std::rc::Weak::<LeafWireframe>::new()),
            was_shown: Cell::new(false),
            presented: RefCell::new(None),
            reposition: RefCell::new(None),
        }
    }

    /// Wire the back-reference to the wireframe embedding this state.
    /// Must be called once, right after the embedding `Rc` is created.
    pub(crate) fn bind(&self, me: WeakWireframe) {
        *self.me.borrow_mut() = me;
    }

    /// The wireframe embedding this state.
    pub(crate) fn me(&self) -> WireframeRef {
        self.me
            .borrow()
            .upgrade()
            .expect("presenter state used before bind or after teardown")
    }

    pub(crate) fn host(&self) -> &Rc<dyn HostHierarchy> {
        &self.host
    }

    pub(crate) fn unit(&self) -> ScreenUnit {
        self.unit.clone()
    }

    pub(crate) fn parent(&self) -> Option<WireframeRef> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &WireframeRef) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    pub(crate) fn was_shown(&self) -> bool {
        self.was_shown.get()
    }

    pub(crate) fn mark_shown(&self) {
        self.was_shown.set(true);
    }

    pub(crate) fn presented_child(&self) -> Option<WireframeRef> {
        self.presented
            .borrow()
            .as_ref()
            .map(|child| child.wireframe.clone())
    }

    pub(crate) fn set_reposition_callback(&self, callback: RepositionCallback) {
        *self.reposition.borrow_mut() = Some(callback);
    }

    pub(crate) fn reposition(&self, proposed: &mut AnchorRect) {
        if let Some(callback) = self.reposition.borrow().as_ref() {
            callback(proposed);
        }
    }

    /// Handle the presentation commands every presenter understands.
    ///
    /// Commands whose target is the embedding wireframe itself are
    /// declined so they bubble up to the presenter that owns the slot.
    pub(crate) fn handle_presentation(&self, command: &NavigationCommand) -> Outcome {
        match command {
            NavigationCommand::Present {
                wireframe,
                style,
                transition,
                animated,
            } => {
                self.present(wireframe, style, *transition, *animated);
                Outcome::Accepted
            }
            NavigationCommand::Dismiss {
                wireframe,
                animated,
            } => {
                if same_wireframe(wireframe, &self.me()) {
                    // dismissal must be carried out by the presenting
                    // wireframe so it can clear its presented slot
                    return Outcome::Declined;
                }
                self.dismiss(wireframe, *animated);
                Outcome::Accepted
            }
            NavigationCommand::PopoverDismissedExternally { wireframe } => {
                if same_wireframe(wireframe, &self.me()) {
                    return Outcome::Declined;
                }
                self.clear_externally_dismissed(wireframe);
                Outcome::Accepted
            }
            _ => Outcome::Declined,
        }
    }

    /// Present `wireframe` modally over the embedding wireframe.
    fn present(
        &self,
        wireframe: &WireframeRef,
        style: &PresentationStyle,
        transition: TransitionStyle,
        animated: bool,
    ) {
        assert!(
            self.presented.borrow().is_none(),
            "cannot present {:?}: {:?} is already presenting",
            wireframe.screen_unit(),
            self.unit
        );
        let occupied = self.host.presented_unit(&self.unit);
        assert!(
            occupied.is_none()
                || occupied
                    .as_ref()
                    .map(|unit| self.host.is_dismissing(unit))
                    .unwrap_or(false),
            "host presented slot of {:?} holds {:?}; always present through navigation commands",
            self.unit,
            occupied
        );

        log::debug!(
            "{:?} presenting {:?} ({:?})",
            self.unit,
            wireframe.screen_unit(),
            style
        );
        wireframe.set_parent(&self.me());

        // An anchored popover is observed by the wireframe presented in
        // it; the subscription lives in the presenter's slot so teardown
        // coincides with the slot clearing.
        let popover_subscription = if style.is_anchored() {
            let observer = wireframe.clone().as_popover_observer().unwrap_or_else(|| {
                panic!(
                    "{:?} cannot be presented as an anchored popover",
                    wireframe.screen_unit()
                )
            });
            Some(
                self.host
                    .observe_popover(&wireframe.screen_unit(), Rc::downgrade(&observer)),
            )
        } else {
            None
        };

        *self.presented.borrow_mut() = Some(PresentedChild {
            wireframe: wireframe.clone(),
            _popover_subscription: popover_subscription,
        });
        self.host.present(
            &self.unit,
            &wireframe.screen_unit(),
            style,
            transition,
            animated,
        );
    }

    /// Dismiss the presented child `wireframe`.
    fn dismiss(&self, wireframe: &WireframeRef, animated: bool) {
        let presented = self.presented_child();
        let presented = presented.unwrap_or_else(|| {
            panic!(
                "cannot dismiss {:?}: {:?} is not presenting anything",
                wireframe.screen_unit(),
                self.unit
            )
        });
        assert!(
            same_wireframe(wireframe, &presented),
            "cannot dismiss {:?}: {:?} presents {:?}",
            wireframe.screen_unit(),
            self.unit,
            presented.screen_unit()
        );

        log::debug!("{:?} dismissing {:?}", self.unit, presented.screen_unit());
        self.host.dismiss(&self.unit, animated);
        if let Some(child) = self.presented.borrow_mut().take() {
            child.wireframe.detached();
        }
    }

    /// Clear the slot after the host already dismissed the popover.
    fn clear_externally_dismissed(&self, wireframe: &WireframeRef) {
        let presented = self.presented_child();
        assert!(
            presented
                .as_ref()
                .map(|child| same_wireframe(wireframe, child))
                .unwrap_or(false),
            "externally dismissed popover {:?} is not the presented child of {:?}",
            wireframe.screen_unit(),
            self.unit
        );

        log::debug!(
            "{:?} clearing externally dismissed popover {:?}",
            self.unit,
            wireframe.screen_unit()
        );
        // No host call: the host already removed the unit.
        if let Some(child) = self.presented.borrow_mut().take() {
            child.wireframe.detached();
        }
    }
}

/// A wireframe owning exactly one screen unit.
///
/// May present a single modal child; everything else it declines, so
/// stack commands bubble to the stack wireframe above it.
///
/// # Example
///
/// ```
/// use trellis::core::ScreenUnit;
/// use trellis::host::MockHost;
/// use trellis::wireframe::LeafWireframe;
///
/// let host = MockHost::new();
/// let leaf = LeafWireframe::new(host, ScreenUnit::labeled("home"));
/// assert!(leaf.presented_child().is_none());
/// ```
pub struct LeafWireframe {
    state: PresenterState,
}

impl LeafWireframe {
    /// Create a leaf wireframe owning `unit`.
    ///
    /// From this point on the wireframe manages the unit's presentation:
    /// do not present over or dismiss from it through the host directly,
    /// and do not register competing observers for it.
    pub fn new(host: Rc<dyn HostHierarchy>, unit: ScreenUnit) -> Rc<Self> {
        let leaf = Rc::new(Self {
            state: PresenterState::new(host, unit),
        });
        let me: WeakWireframe = Rc::downgrade(&(leaf.clone() as Rc<dyn Wireframe>));
        leaf.state.bind(me);
        leaf
    }

    /// The currently presented modal child, if any.
    pub fn presented_child(&self) -> Option<WireframeRef> {
        self.state.presented_child()
    }

    /// Install the callback adjusting this wireframe's popover anchor
    /// region when the host repositions it.
    pub fn set_reposition_callback(&self, callback: impl Fn(&mut AnchorRect) + 'static) {
        self.state.set_reposition_callback(Box::new(callback));
    }
}

impl Wireframe for LeafWireframe {
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
        self.state.presented_child()
    }

    fn handle(&self, command: &NavigationCommand) -> Outcome {
        self.state.handle_presentation(command)
    }

    fn was_shown(&self) -> bool {
        self.state.was_shown()
    }

    fn mark_shown(&self) {
        self.state.mark_shown();
    }

    fn kind(&self) -> WireframeKind {
        WireframeKind::Leaf
    }

    fn detached(&self) {
        log::debug!("{:?} detached from the wireframe tree", self.state.unit());
    }

    fn as_popover_observer(self: Rc<Self>) -> Option<Rc<dyn PopoverObserver>> {
        Some(self)
    }
}

impl PopoverObserver for LeafWireframe {
    fn popover_dismissed_externally(&self) {
        // The presenter must clear its slot; dispatching from here lets
        // the command bubble past this wireframe (which declines its own
        // dismissal) up to it.
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
