//! FiberNode - one position in one buffer of the fiber tree.
//!
//! A fiber mirrors an element but is mutable and persistent: the same pair
//! of fibers (current + alternate) represents a tree position across every
//! render that keeps the position alive.

use std::rc::Rc;

use crate::element::{ElementType, PropValue, Props};
use crate::error::{ReconcileError, Result};
use crate::types::{FiberLifecycle, Flags, WorkTag};

use super::FiberId;

// =============================================================================
// Fiber Props
// =============================================================================

/// Props requested for, or committed by, a fiber.
///
/// Text fibers carry their content instead of a prop map.
#[derive(Debug, Clone, PartialEq)]
pub enum FiberProps {
    Props(Props),
    Text(Rc<str>),
}

impl FiberProps {
    pub fn as_props(&self) -> Option<&Props> {
        match self {
            Self::Props(props) => Some(props),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Props(_) => None,
        }
    }

    /// The `children` prop, if any.
    pub fn children(&self) -> Option<&PropValue> {
        self.as_props().and_then(Props::children)
    }
}

impl Default for FiberProps {
    fn default() -> Self {
        Self::Props(Props::new())
    }
}

// =============================================================================
// Fiber Node
// =============================================================================

/// A unit of work and a node of the fiber tree.
///
/// Links are arena ids. `return_fiber`, `child` and `sibling` describe the
/// structure of the buffer this fiber belongs to; `alternate` is a
/// navigational lookup into the other buffer and never implies ownership.
///
/// `I` is the host instance handle type supplied by the host config.
#[derive(Debug, Clone)]
pub struct FiberNode<I> {
    raw_tag: u8,
    pub key: Option<Rc<str>>,
    /// `None` for the host root and for text fibers.
    pub element_type: Option<ElementType>,

    pub pending_props: FiberProps,
    pub memoized_props: Option<FiberProps>,
    /// Host instance this fiber is responsible for. Owned by the host.
    pub state_node: Option<I>,

    // =========================================================================
    // Tree links
    // =========================================================================
    pub return_fiber: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Position among siblings.
    pub index: usize,
    pub alternate: Option<FiberId>,

    // =========================================================================
    // Effects
    // =========================================================================
    pub flags: Flags,
    pub subtree_flags: Flags,
    /// Current children to remove during commit.
    pub deletions: Vec<FiberId>,
    pub lifecycle: FiberLifecycle,
}

impl<I> FiberNode<I> {
    /// Create a detached fiber.
    pub fn new(
        tag: WorkTag,
        key: Option<Rc<str>>,
        element_type: Option<ElementType>,
        pending_props: FiberProps,
    ) -> Self {
        Self::with_raw_tag(tag.raw(), key, element_type, pending_props)
    }

    /// Create a detached fiber from a raw tag value.
    ///
    /// Used when fibers are restored from a raw representation. The passes
    /// reject tags outside the registry when they reach such a fiber.
    pub fn with_raw_tag(
        raw_tag: u8,
        key: Option<Rc<str>>,
        element_type: Option<ElementType>,
        pending_props: FiberProps,
    ) -> Self {
        Self {
            raw_tag,
            key,
            element_type,
            pending_props,
            memoized_props: None,
            state_node: None,
            return_fiber: None,
            child: None,
            sibling: None,
            index: 0,
            alternate: None,
            flags: Flags::NO_FLAGS,
            subtree_flags: Flags::NO_FLAGS,
            deletions: Vec::new(),
            lifecycle: FiberLifecycle::Pending,
        }
    }

    /// The raw tag value as stored.
    pub fn raw_tag(&self) -> u8 {
        self.raw_tag
    }

    /// The work tag, or `UnknownWorkTag` if the raw value is unregistered.
    ///
    /// `id` is only used to label the error.
    pub fn tag(&self, id: FiberId) -> Result<WorkTag> {
        WorkTag::from_raw(self.raw_tag).ok_or(ReconcileError::UnknownWorkTag {
            tag: self.raw_tag,
            fiber: id,
        })
    }

    /// Whether this fiber has the given registered tag.
    pub fn is(&self, tag: WorkTag) -> bool {
        self.raw_tag == tag.raw()
    }

    /// Whether an existing fiber can be reused for `key` and `element_type`.
    pub fn matches(&self, key: Option<&str>, element_type: Option<&ElementType>) -> bool {
        self.key.as_deref() == key && self.element_type.as_ref() == element_type
    }
}
