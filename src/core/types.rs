//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ScreenUnit`] - Opaque, identity-comparable handle for one screen of
//!   application content
//! - [`AnchorTarget`] - Opaque handle for a host UI element a popover can
//!   anchor to
//! - [`BranchTag`] - Validated tag naming one branch of a branch-switch
//!   container
//! - [`PresentationStyle`] / [`TransitionStyle`] - Modal presentation
//!   metadata
//! - [`AnchorRect`] / [`ArrowDirections`] - Popover anchoring geometry
//! - [`StackSnapshot`] - Point-in-time record of a stack's contents
//!
//! # Identity
//!
//! `ScreenUnit` and `AnchorTarget` are handles, not values: cloning one
//! yields another handle to the same underlying host object, and equality
//! compares identity only. Labels exist purely for diagnostics and never
//! participate in comparison.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("branch tag cannot be empty")]
    Empty,

    #[error("branch tag cannot contain whitespace or control characters: {0:?}")]
    IllegalCharacter(String),
}

/// An opaque handle for one screen of application-supplied content.
///
/// Wireframes register screen units into the host hierarchy and remove
/// them again; they never introspect or mutate the content behind the
/// handle. Two handles are equal exactly when they refer to the same
/// underlying unit, so a clone compares equal to its original.
///
/// # Example
///
/// ```
/// use trellis::core::ScreenUnit;
///
/// let unit = ScreenUnit::labeled("settings");
/// let handle = unit.clone();
/// assert_eq!(unit, handle);
/// assert_ne!(unit, ScreenUnit::labeled("settings"));
/// ```
#[derive(Clone)]
pub struct ScreenUnit {
    id: Uuid,
    label: Option<&'static str>,
}

impl ScreenUnit {
    /// Create a handle for a new screen unit.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
        }
    }

    /// Create a handle carrying a diagnostic label.
    ///
    /// The label shows up in log output and panic messages. It has no
    /// effect on identity.
    pub fn labeled(label: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: Some(label),
        }
    }

    /// The diagnostic label, if one was attached.
    pub fn label(&self) -> Option<&'static str> {
        self.label
    }
}

impl Default for ScreenUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ScreenUnit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScreenUnit {}

impl std::hash::Hash for ScreenUnit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ScreenUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "ScreenUnit({})", label),
            None => write!(f, "ScreenUnit({})", &self.id.to_string()[..8]),
        }
    }
}

/// An opaque handle for a host UI element a popover can anchor to.
///
/// The bar-button or view the application hands over stays a black box;
/// only identity matters for routing reposition callbacks.
#[derive(Clone)]
pub struct AnchorTarget {
    id: Uuid,
    label: Option<&'static str>,
}

impl AnchorTarget {
    /// Create a handle for a new anchor element.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
        }
    }

    /// Create a handle carrying a diagnostic label.
    pub fn labeled(label: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: Some(label),
        }
    }
}

impl Default for AnchorTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AnchorTarget {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AnchorTarget {}

impl fmt::Debug for AnchorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "AnchorTarget({})", label),
            None => write!(f, "AnchorTarget({})", &self.id.to_string()[..8]),
        }
    }
}

/// A validated tag naming one branch of a branch-switch container.
///
/// Tags must be non-empty and free of whitespace and control characters.
///
/// # Example
///
/// ```
/// use trellis::core::BranchTag;
///
/// let tag = BranchTag::new("library").unwrap();
/// assert_eq!(tag.as_str(), "library");
///
/// assert!(BranchTag::new("").is_err());
/// assert!(BranchTag::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchTag(String);

impl BranchTag {
    /// Create a new validated branch tag.
    ///
    /// # Errors
    ///
    /// Returns `TagError` if the tag is empty or contains whitespace or
    /// control characters.
    pub fn new(tag: impl Into<String>) -> Result<Self, TagError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(TagError::Empty);
        }
        if tag.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TagError::IllegalCharacter(tag));
        }
        Ok(Self(tag))
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rectangle in host coordinates, used for region-anchored popovers and
/// reposition callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Permitted popover arrow directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowDirections {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl ArrowDirections {
    /// All directions permitted.
    pub const ANY: Self = Self {
        up: true,
        down: true,
        left: true,
        right: true,
    };

    /// Vertical directions only.
    pub const VERTICAL: Self = Self {
        up: true,
        down: true,
        left: false,
        right: false,
    };
}

impl Default for ArrowDirections {
    fn default() -> Self {
        Self::ANY
    }
}

/// How a modally-presented screen unit is laid out by the host.
///
/// The anchored variants carry the geometry the host needs to position a
/// popover; the presenting wireframe additionally wires up the popover
/// observer for them (see `wireframe::LeafWireframe`).
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationStyle {
    /// Cover the full screen.
    FullScreen,

    /// Popover anchored to a host UI element such as a bar button.
    PopoverFromElement {
        anchor: AnchorTarget,
        arrows: ArrowDirections,
    },

    /// Popover anchored to a rectangular region of the presenter.
    PopoverFromRegion {
        region: AnchorRect,
        arrows: ArrowDirections,
    },
}

impl PresentationStyle {
    /// Whether this style is dismissed by the user tapping outside it.
    pub fn is_anchored(&self) -> bool {
        matches!(
            self,
            PresentationStyle::PopoverFromElement { .. }
                | PresentationStyle::PopoverFromRegion { .. }
        )
    }
}

/// How the host animates a modal presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionStyle {
    #[default]
    CoverVertical,
    CrossDissolve,
    FlipHorizontal,
}

/// Point-in-time record of a stack container's contents, bottom to top.
///
/// Captured before a reconciliation rewrites the model, and carried by
/// the synthetic external-state-changed command so collaborators can see
/// what was on screen before the host-originated change.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSnapshot {
    /// The stack container's own screen unit.
    pub container: ScreenUnit,

    /// The units on the stack at capture time, bottom to top.
    pub units: Vec<ScreenUnit>,
}

impl StackSnapshot {
    /// Number of units on the stack at capture time.
    pub fn depth(&self) -> usize {
        self.units.len()
    }

    /// The unit that was on top at capture time.
    ///
    /// A snapshot is only ever taken of a non-empty stack, but this stays
    /// an `Option` so callers do not have to reason about that invariant.
    pub fn top(&self) -> Option<&ScreenUnit> {
        self.units.last()
    }
}
