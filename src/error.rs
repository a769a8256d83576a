//! Error types for reconciliation.
//!
//! Malformed authoring input never produces an error (it is defaulted while
//! building elements). Everything here is a programming error inside a pass
//! or a misuse of the render/commit sequence.

use crate::engine::FiberId;

/// Errors reported by the render and commit passes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A fiber carries a raw tag that is not part of the work-tag registry.
    #[error("unknown work tag {tag} on fiber {fiber:?}")]
    UnknownWorkTag { tag: u8, fiber: FiberId },

    /// A fiber id does not resolve in the arena (freed or never allocated).
    #[error("fiber {0:?} is not in the tree")]
    MissingFiber(FiberId),

    /// Complete work was entered before every child finished.
    #[error("fiber {fiber:?} completed before its child {child:?}")]
    IncompleteChildren { fiber: FiberId, child: FiberId },

    /// A fiber lacks data its tag requires (a component, a host tag, text,
    /// a host instance).
    #[error("fiber {fiber:?} has no {expected}")]
    MalformedFiber { fiber: FiberId, expected: &'static str },

    /// A value that cannot be rendered was used as a child.
    #[error("invalid child under fiber {fiber:?}: {reason}")]
    InvalidChild { fiber: FiberId, reason: String },

    /// `work` or `commit` was called with no render in progress.
    #[error("no render in progress")]
    NoWorkInProgress,

    /// `commit` was called before the work loop finished.
    #[error("render has not completed yet")]
    RenderIncomplete,

    /// Tree linkage or alternate symmetry is violated.
    #[error("broken tree link at fiber {fiber:?}: {reason}")]
    BrokenLink { fiber: FiberId, reason: String },
}

/// Result alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;
