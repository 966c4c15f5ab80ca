//! wireframe
//!
//! Wireframe tree nodes.
//!
//! # Architecture
//!
//! A wireframe owns exactly one screen unit and mediates every
//! navigation affecting it. Wireframes form a tree: stack wireframes own
//! ordered children mapped onto a host stack container, leaf wireframes
//! own at most one modally-presented child, and branch-switch containers
//! (implemented by applications, see [`WireframeKind::BranchSwitch`])
//! own one subtree per branch. The path from the root along
//! `active_child` links is the active chain, and commands are offered
//! along it innermost-first (see [`crate::dispatch`]).
//!
//! # Ownership
//!
//! Ownership flows strictly top-down: a wireframe is kept alive by the
//! container holding it as a child or presented child, and by nothing
//! else. `parent` back-references are `Weak` so upward traversal is a
//! lookup, never a reason to keep a node alive, and the tree tears down
//! without reference cycles.
//!
//! # Invariants
//!
//! - Only a wireframe's own `handle`/reconciliation code mutates its
//!   child state; cross-node effects travel as navigation commands
//! - Wireframe identity is allocation identity ([`same_wireframe`]);
//!   there is no value equality between wireframes

use std::rc::{Rc, Weak};

use crate::core::ScreenUnit;
use crate::dispatch::{NavigationCommand, Outcome};
use crate::host::PopoverObserver;

pub mod leaf;
pub mod stack;

pub use leaf::LeafWireframe;
pub use stack::StackWireframe;

/// Shared handle to a wireframe tree node.
pub type WireframeRef = Rc<dyn Wireframe>;

/// Non-owning handle to a wireframe tree node.
pub type WeakWireframe = Weak<dyn Wireframe>;

/// The closed set of wireframe kinds.
///
/// Used for structural assertions - a stack container never nests
/// inside another stack container - without downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireframeKind {
    /// Owns a single screen unit; may present one modal child.
    Leaf,

    /// Owns an ordered sequence of children in a host stack container.
    Stack,

    /// Owns one subtree per branch; switches the active one.
    BranchSwitch,
}

/// A node of the wireframe tree.
///
/// The capability contract every tree node implements: expose the owned
/// screen unit, a parent back-reference, the currently active child, and
/// command handling. See the module docs for ownership rules.
pub trait Wireframe {
    /// The screen unit this wireframe exclusively owns.
    fn screen_unit(&self) -> ScreenUnit;

    /// The wireframe that currently holds this one as a child.
    fn parent(&self) -> Option<WireframeRef>;

    /// Adopt a parent. Called by whichever wireframe takes this one as
    /// a child; stores only a non-owning reference.
    fn set_parent(&self, parent: &WireframeRef);

    /// The child currently representing "what's in front" under this
    /// node, or `None` at the end of the active chain.
    fn active_child(&self) -> Option<WireframeRef>;

    /// Offer a navigation command to this wireframe.
    ///
    /// [`Outcome::Declined`] means "not mine, ask my parent" - it is
    /// distinct from accepting a command that turns out to need no work.
    fn handle(&self, command: &NavigationCommand) -> Outcome;

    /// Whether this wireframe's screen unit has ever actually appeared
    /// on screen. Used by stack reconciliation to tell benign transient
    /// mismatches from genuine host-originated changes.
    fn was_shown(&self) -> bool;

    /// Record that this wireframe's screen unit has appeared on screen.
    fn mark_shown(&self);

    /// Which kind of node this is.
    fn kind(&self) -> WireframeKind;

    /// Lifecycle hook invoked by the container that removes this
    /// wireframe from the tree. Implementations tear down host
    /// subscriptions here; the default does nothing.
    fn detached(&self) {}

    /// View this wireframe as a popover observer, if it can be
    /// presented as an anchored popover.
    ///
    /// The presenting wireframe uses this to register the presented
    /// wireframe for outside-tap dismissal and reposition callbacks.
    fn as_popover_observer(self: Rc<Self>) -> Option<Rc<dyn PopoverObserver>> {
        None
    }
}

/// Identity comparison between wireframe handles.
///
/// Compares allocation addresses only, so handles obtained through
/// different trait objects to the same node still compare equal.
pub fn same_wireframe(a: &WireframeRef, b: &WireframeRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Walk `parent` links up from `wireframe` to the tree root.
pub fn root_of(wireframe: &WireframeRef) -> WireframeRef {
    let mut current = wireframe.clone();
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// The active chain: `root` first, then each `active_child` down to the
/// deepest currently-displayed wireframe.
pub fn active_chain(root: &WireframeRef) -> Vec<WireframeRef> {
    let mut chain = vec![root.clone()];
    let mut current = root.clone();
    while let Some(child) = current.active_child() {
        chain.push(child.clone());
        current = child;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Minimal tree node for traversal tests.
    struct Node {
        unit: ScreenUnit,
        parent: RefCell<WeakWireframe>,
        child: RefCell<Option<WireframeRef>>,
    }

    impl Node {
        fn new(label: &'static str) -> Rc<Self> {
            Rc::new(Self {
                unit: ScreenUnit::labeled(label),
                parent: RefCell::new(Weak::<Self>::new()),
                child: RefCell::new(None),
            })
        }
    }

    impl Wireframe for Node {
        fn screen_unit(&self) -> ScreenUnit {
            self.unit.clone()
        }

        fn parent(&self) -> Option<WireframeRef> {
            self.parent.borrow().upgrade()
        }

        fn set_parent(&self, parent: &WireframeRef) {
            *self.parent.borrow_mut() = Rc::downgrade(parent);
        }

        fn active_child(&self) -> Option<WireframeRef> {
            self.child.borrow().clone()
        }

        fn handle(&self, _command: &NavigationCommand) -> Outcome {
            Outcome::Declined
        }

        fn was_shown(&self) -> bool {
            false
        }

        fn mark_shown(&self) {}

        fn kind(&self) -> WireframeKind {
            WireframeKind::Leaf
        }
    }

    fn link(parent: &Rc<Node>, child: &Rc<Node>) {
        let parent_ref: WireframeRef = parent.clone();
        let child_ref: WireframeRef = child.clone();
        child_ref.set_parent(&parent_ref);
        *parent.child.borrow_mut() = Some(child_ref);
    }

    #[test]
    fn identity_compares_allocations() {
        let a: WireframeRef = Node::new("a");
        let b: WireframeRef = Node::new("b");
        assert!(same_wireframe(&a, &a.clone()));
        assert!(!same_wireframe(&a, &b));
    }

    #[test]
    fn root_of_walks_to_the_top() {
        let root = Node::new("root");
        let mid = Node::new("mid");
        let tip = Node::new("tip");
        link(&root, &mid);
        link(&mid, &tip);

        let tip_ref: WireframeRef = tip;
        let root_ref: WireframeRef = root;
        assert!(same_wireframe(&root_of(&tip_ref), &root_ref));
        assert!(same_wireframe(&root_of(&root_ref), &root_ref));
    }

    #[test]
    fn active_chain_runs_root_to_deepest() {
        let root = Node::new("root");
        let mid = Node::new("mid");
        let tip = Node::new("tip");
        link(&root, &mid);
        link(&mid, &tip);

        let root_ref: WireframeRef = root;
        let chain = active_chain(&root_ref);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0].screen_unit().label(), Some("root"));
        assert_eq!(chain[2].screen_unit().label(), Some("tip"));
    }

    #[test]
    fn parent_reference_does_not_keep_nodes_alive() {
        let child = Node::new("child");
        {
            let parent = Node::new("parent");
            let parent_ref: WireframeRef = parent.clone();
            let child_ref: WireframeRef = child.clone();
            child_ref.set_parent(&parent_ref);
        }
        let child_ref: WireframeRef = child;
        assert!(child_ref.parent().is_none());
    }
}
