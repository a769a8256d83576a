//! Fiber engine - fiber nodes and the double-buffered fiber tree.
//!
//! The engine manages the core data structures:
//! - FiberNode: one tree position in one buffer, with effect metadata
//! - FiberTree: arena owning both buffers, link mutation, alternates
//!
//! # Architecture
//!
//! Fibers are NOT linked by pointers. They are ids into one arena:
//!
//! ```text
//!   current                  work-in-progress
//!   root  ◄── alternate ──►  root'
//!    │                        │
//!   div   ◄── alternate ──►  div'
//!    │                        │
//!   "a" ─sibling─► "b"       "a'" ─sibling─► "b'"
//! ```
//!
//! Each buffer has its own `child`/`sibling`/`return` links; `alternate`
//! connects the two fibers of a position and is the only cross-buffer link.

mod fiber;
mod tree;

pub use fiber::*;
pub use tree::*;
