//! Core types for spark-fiber.
//!
//! These types define the foundation that everything builds on.
//! They flow through the render and commit passes and define what the
//! reconciler understands about a fiber.

use crate::element::ElementType;

// =============================================================================
// Work Tags - Closed registry of fiber kinds
// =============================================================================

/// The structural kind of a fiber.
///
/// Discriminants are stable for the whole session: a value is never reused
/// for a different meaning, because fibers outlive individual renders.
/// Gaps in the numbering are reserved for kinds this crate does not build
/// (class components, portals, fragments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkTag {
    /// A function component. Its output is its child subtree.
    FunctionComponent = 0,
    /// The root of a render target. Owns no host instance of its own.
    HostRoot = 3,
    /// A host element (`div`, `box`, ...).
    HostComponent = 5,
    /// A host text node.
    HostText = 6,
}

impl WorkTag {
    /// Every registered tag, in discriminant order.
    pub const ALL: [WorkTag; 4] = [
        WorkTag::FunctionComponent,
        WorkTag::HostRoot,
        WorkTag::HostComponent,
        WorkTag::HostText,
    ];

    /// Look up a raw discriminant. Returns `None` for unregistered values.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::FunctionComponent),
            3 => Some(Self::HostRoot),
            5 => Some(Self::HostComponent),
            6 => Some(Self::HostText),
            _ => None,
        }
    }

    /// The raw discriminant.
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// The tag a fiber created from an element of this type gets.
    pub fn from_element_type(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(_) => Self::HostComponent,
            ElementType::Function(_) => Self::FunctionComponent,
        }
    }

    /// Whether fibers of this kind own a host instance.
    #[inline]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostText)
    }

    /// Whether fibers of this kind can act as a host parent during commit.
    #[inline]
    pub const fn is_host_parent(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostRoot)
    }
}

// =============================================================================
// Flags (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Pending side effects as a bitfield.
    ///
    /// Set on a single fiber by the render passes, unioned into ancestors'
    /// `subtree_flags` by bubbling, consumed by commit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        const NO_FLAGS = 0;
        /// The host instance must be inserted into its host parent.
        const PLACEMENT = 1 << 1;
        /// The host instance must be patched with new props or text.
        const UPDATE = 1 << 2;
        /// One or more current children are scheduled for removal.
        const CHILD_DELETION = 1 << 4;
    }
}

impl Flags {
    /// Flags the mutation phase of commit has to visit.
    pub const MUTATION_MASK: Self = Self::PLACEMENT
        .union(Self::UPDATE)
        .union(Self::CHILD_DELETION);
}

// =============================================================================
// Fiber Lifecycle
// =============================================================================

/// Where a fiber is in the render/commit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FiberLifecycle {
    /// Created or reused for this render, not completed yet.
    #[default]
    Pending,
    /// Complete work has run; effects are recorded but inert.
    Completed,
    /// Effects have been flushed to the host.
    Committed,
}

// =============================================================================
// Tests
// =============================================================================
