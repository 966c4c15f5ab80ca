//! dispatch
//!
//! Navigation commands and active-chain dispatch.
//!
//! # Architecture
//!
//! Application code never mutates the host hierarchy; it builds a
//! [`NavigationCommand`] and hands it to [`dispatch`]. Dispatch resolves
//! the tree root from wherever the command originates, computes the
//! active chain (root down to the deepest currently-displayed
//! wireframe), and offers the command to each wireframe starting from
//! the deepest and walking up, stopping at the first acceptance.
//!
//! Reaching the root without an acceptance means the tree cannot service
//! the command at all - a structurally invalid configuration - and
//! panics rather than dropping the command on the floor.
//!
//! # Ordering
//!
//! A [`NavigationCommandSequence`] is dispatched strictly one command
//! after another: each command fully resolves, including any synchronous
//! host notifications and the reconciliation they trigger, before the
//! next is offered. There is no queueing and no cancellation.
//!
//! # Invariants
//!
//! - Commands are immutable values and are not reused after dispatch
//! - [`Outcome::Declined`] is "pass to ancestor", distinct from a
//!   successful no-op, which is an acceptance

use std::fmt;

use crate::core::{BranchTag, PresentationStyle, StackSnapshot, TransitionStyle};
use crate::wireframe::{active_chain, root_of, Wireframe, WireframeRef};

/// Result of offering a command to one wireframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The wireframe recognized and fully handled the command.
    Accepted,

    /// Not this wireframe's command; offer it to the next ancestor.
    Declined,
}

impl Outcome {
    /// Check if the command was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    /// Check if the command was declined.
    pub fn is_declined(&self) -> bool {
        matches!(self, Outcome::Declined)
    }
}

/// One declarative navigation intent.
///
/// Each variant describes a single structural change to "which screens
/// exist, in what arrangement, and who is active". Commands carry the
/// wireframes they affect; they carry no mutable state.
#[derive(Clone)]
pub enum NavigationCommand {
    /// Push `wireframe` onto the active stack container.
    Push {
        wireframe: WireframeRef,
        animated: bool,
    },

    /// Pop `wireframe` off the active stack container. `wireframe` must
    /// be the current top of that stack.
    Pop {
        wireframe: WireframeRef,
        animated: bool,
    },

    /// Replace the active stack container's contents wholesale.
    ReplaceStack {
        wireframes: Vec<WireframeRef>,
        animated: bool,
    },

    /// Present `wireframe` modally over the deepest active wireframe.
    Present {
        wireframe: WireframeRef,
        style: PresentationStyle,
        transition: TransitionStyle,
        animated: bool,
    },

    /// Dismiss the modally-presented `wireframe`. Handled by its
    /// presenter, never by `wireframe` itself.
    Dismiss {
        wireframe: WireframeRef,
        animated: bool,
    },

    /// The host auto-dismissed the popover containing `wireframe`
    /// because the user tapped outside it. Synthesized by the popover
    /// observer; handled by the presenter, never by `wireframe` itself.
    PopoverDismissedExternally { wireframe: WireframeRef },

    /// Make the branch tagged `tag` the active one in the nearest
    /// branch-switch container.
    SwitchBranch { tag: BranchTag },

    /// A stack reconciled itself against a host-originated change.
    /// `previous` is what the stack looked like before the change.
    ExternalStateChanged { previous: StackSnapshot },
}

impl fmt::Debug for NavigationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationCommand::Push {
                wireframe,
                animated,
            } => write!(f, "Push({:?}, animated: {})", wireframe.screen_unit(), animated),
            NavigationCommand::Pop {
                wireframe,
                animated,
            } => write!(f, "Pop({:?}, animated: {})", wireframe.screen_unit(), animated),
            NavigationCommand::ReplaceStack {
                wireframes,
                animated,
            } => {
                let units: Vec<_> = wireframes
                    .iter()
                    .map(|wireframe| wireframe.screen_unit())
                    .collect();
                write!(f, "ReplaceStack({:?}, animated: {})", units, animated)
            }
            NavigationCommand::Present {
                wireframe,
                style,
                transition,
                animated,
            } => write!(
                f,
                "Present({:?}, {:?}, {:?}, animated: {})",
                wireframe.screen_unit(),
                style,
                transition,
                animated
            ),
            NavigationCommand::Dismiss {
                wireframe,
                animated,
            } => write!(
                f,
                "Dismiss({:?}, animated: {})",
                wireframe.screen_unit(),
                animated
            ),
            NavigationCommand::PopoverDismissedExternally { wireframe } => write!(
                f,
                "PopoverDismissedExternally({:?})",
                wireframe.screen_unit()
            ),
            NavigationCommand::SwitchBranch { tag } => write!(f, "SwitchBranch({})", tag),
            NavigationCommand::ExternalStateChanged { previous } => {
                write!(f, "ExternalStateChanged(previous: {:?})", previous)
            }
        }
    }
}

/// A finite ordered list of commands dispatched strictly in order.
#[derive(Debug, Clone, Default)]
pub struct NavigationCommandSequence(Vec<NavigationCommand>);

impl NavigationCommandSequence {
    /// Create a sequence from commands in dispatch order.
    pub fn new(commands: Vec<NavigationCommand>) -> Self {
        Self(commands)
    }

    /// Append a command to the end of the sequence.
    pub fn push(&mut self, command: NavigationCommand) {
        self.0.push(command);
    }

    /// Number of commands in the sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the sequence contains no commands.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for NavigationCommandSequence {
    type Item = NavigationCommand;
    type IntoIter = std::vec::IntoIter<NavigationCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<NavigationCommand> for NavigationCommandSequence {
    fn from_iter<I: IntoIterator<Item = NavigationCommand>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A reusable recipe producing a command sequence.
///
/// Application code packages multi-step flows (push these five screens,
/// switch branch, push five more) behind this trait and dispatches them
/// with [`dispatch_chain`].
pub trait NavigationCommandChain {
    /// Produce the sequence to dispatch, in order.
    fn navigation_command_sequence(&self) -> NavigationCommandSequence;
}

/// Dispatch one command along the active chain.
///
/// `origin` can be any wireframe in the tree; the root is resolved by
/// walking its parents. The command is offered innermost-first along the
/// active chain.
///
/// # Panics
///
/// Panics if no wireframe on the active chain accepts the command - a
/// command with no eligible recipient means the tree is structurally
/// misconfigured.
pub fn dispatch(origin: &WireframeRef, command: NavigationCommand) {
    let root = root_of(origin);
    let chain = active_chain(&root);
    log::debug!(
        "dispatching {:?} along an active chain of {}",
        command,
        chain.len()
    );
    for wireframe in chain.iter().rev() {
        if wireframe.handle(&command).is_accepted() {
            log::trace!("{:?} accepted by {:?}", command, wireframe.screen_unit());
            return;
        }
    }
    panic!(
        "no wireframe on the active chain accepted {:?}; the wireframe tree cannot service this command",
        command
    );
}

/// Dispatch a sequence of commands strictly one after another.
///
/// Each command fully resolves - including synchronous host
/// notifications and any reconciliation they trigger - before the next
/// is dispatched.
pub fn dispatch_sequence(origin: &WireframeRef, sequence: NavigationCommandSequence) {
    for command in sequence {
        dispatch(origin, command);
    }
}

/// Dispatch the sequence produced by a command chain.
pub fn dispatch_chain(origin: &WireframeRef, chain: &dyn NavigationCommandChain) {
    dispatch_sequence(origin, chain.navigation_command_sequence());
}
