//! # spark-fiber
//!
//! Double-buffered fiber reconciler with pluggable host configs.
//!
//! ## Architecture
//!
//! Authoring code describes UI as immutable [`Element`] values. The
//! reconciler lowers them into fibers, one per tree position, kept in two
//! buffers that live in one arena: the `current` tree mirrors what the host
//! shows, the work-in-progress tree is the next frame under construction.
//!
//! ```text
//! Element ─► begin_work ─► fibers ─► complete_work ─► flags ─► commit ─► HostConfig
//!            (top-down)              (bottom-up)               (host mutations)
//! ```
//!
//! The render passes never touch attached host nodes, so a render can
//! yield between units of work and be resumed or abandoned. Commit applies
//! the recorded effects and swaps the buffers.
//!
//! ## Modules
//!
//! - [`types`] - Work tags, effect flags, fiber lifecycle
//! - [`element`] - Elements, props, the `jsx` factory
//! - [`engine`] - Fiber nodes and the double-buffered fiber tree
//! - [`host`] - Host config trait and the terminal reference host
//! - [`reconciler`] - Render and commit passes
//! - [`error`] - Reconciliation errors

pub mod element;
pub mod engine;
pub mod error;
pub mod host;
pub mod reconciler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use element::{
    create_element, is_valid_element, jsx, jsx_dev, Callback, Config, Element, ElementType,
    FunctionComponent, PropChange, PropValue, Props, CHILDREN, ELEMENT_MARKER,
};

pub use engine::{FiberId, FiberNode, FiberProps, FiberTree};

pub use error::{ReconcileError, Result};

pub use host::terminal::{HostOp, NodeId, TerminalContainer, TerminalHost};
pub use host::HostConfig;

pub use reconciler::{CommitSummary, Reconciler, ReconcilerConfig, RenderStatus};
