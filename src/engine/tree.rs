//! FiberTree - arena holding both buffers of the fiber tree.
//!
//! Fibers of the current and the work-in-progress tree live in one
//! `SlotMap`. Each buffer is a separate structure (its own `return`,
//! `child` and `sibling` links); the only cross-buffer relation is the
//! symmetric `alternate` id. Freed ids never resolve again, so a stale
//! link reads as "missing" instead of aliasing a new fiber.

use std::collections::HashSet;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::element::{Element, ElementType};
use crate::error::{ReconcileError, Result};
use crate::types::{FiberLifecycle, Flags, WorkTag};

use super::{FiberNode, FiberProps};

slotmap::new_key_type! {
    /// Arena id of a fiber.
    pub struct FiberId;
}

/// Arena of fibers for one render target.
#[derive(Debug)]
pub struct FiberTree<I> {
    fibers: SlotMap<FiberId, FiberNode<I>>,
    /// Fibers allocated since the last `begin_render`.
    created: Vec<FiberId>,
}

impl<I> Default for FiberTree<I> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
            created: Vec::new(),
        }
    }
}

impl<I: Clone> FiberTree<I> {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Number of live fibers across both buffers.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn get(&self, id: FiberId) -> Option<&FiberNode<I>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut FiberNode<I>> {
        self.fibers.get_mut(id)
    }

    /// Like [`FiberTree::get`] but reports a missing fiber as an error.
    pub fn fiber(&self, id: FiberId) -> Result<&FiberNode<I>> {
        self.fibers.get(id).ok_or(ReconcileError::MissingFiber(id))
    }

    /// Like [`FiberTree::get_mut`] but reports a missing fiber as an error.
    pub fn fiber_mut(&mut self, id: FiberId) -> Result<&mut FiberNode<I>> {
        self.fibers.get_mut(id).ok_or(ReconcileError::MissingFiber(id))
    }

    /// Iterate the direct children of `parent` in sibling order.
    pub fn children(&self, parent: FiberId) -> Children<'_, I> {
        Children {
            tree: self,
            next: self.fibers.get(parent).and_then(|f| f.child),
        }
    }

    /// Pre-order list of `root` and its descendants in `root`'s buffer.
    pub fn descendants(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            let children: Vec<FiberId> = self.children(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Insert a detached fiber.
    pub fn insert(&mut self, fiber: FiberNode<I>) -> FiberId {
        let id = self.fibers.insert(fiber);
        self.created.push(id);
        id
    }

    /// Create the root fiber of a render target.
    pub fn create_host_root(&mut self) -> FiberId {
        self.insert(FiberNode::new(WorkTag::HostRoot, None, None, FiberProps::default()))
    }

    pub fn create_fiber(
        &mut self,
        tag: WorkTag,
        key: Option<Rc<str>>,
        element_type: Option<ElementType>,
        pending_props: FiberProps,
    ) -> FiberId {
        self.insert(FiberNode::new(tag, key, element_type, pending_props))
    }

    /// Create a fiber carrying an arbitrary raw tag.
    pub fn create_fiber_with_raw_tag(&mut self, raw_tag: u8, pending_props: FiberProps) -> FiberId {
        self.insert(FiberNode::with_raw_tag(raw_tag, None, None, pending_props))
    }

    /// Create a fresh fiber for an element.
    pub fn create_fiber_from_element(&mut self, element: &Element) -> FiberId {
        let ty = element.element_type().clone();
        let tag = WorkTag::from_element_type(&ty);
        self.insert(FiberNode::new(
            tag,
            element.key_rc(),
            Some(ty),
            FiberProps::Props(element.props().clone()),
        ))
    }

    /// Create a fresh text fiber.
    pub fn create_fiber_from_text(&mut self, text: Rc<str>) -> FiberId {
        self.insert(FiberNode::new(WorkTag::HostText, None, None, FiberProps::Text(text)))
    }

    /// Get or lazily create the work-in-progress twin of `current`.
    ///
    /// The first call for a position allocates the alternate; every later
    /// render reuses it, resetting its effects. Links inside the new buffer
    /// (`child`, `sibling`, `index`) start as copies of `current`'s and are
    /// overwritten as the work-in-progress tree is built.
    pub fn create_work_in_progress(
        &mut self,
        current_id: FiberId,
        pending_props: FiberProps,
    ) -> Result<FiberId> {
        let current = self.fiber(current_id)?;
        let raw_tag = current.raw_tag();
        let key = current.key.clone();
        let element_type = current.element_type.clone();
        let child = current.child;
        let sibling = current.sibling;
        let index = current.index;
        let memoized_props = current.memoized_props.clone();
        let state_node = current.state_node.clone();
        let existing = current.alternate.filter(|id| self.contains(*id));

        let wip_id = match existing {
            Some(id) => {
                let wip = self.fiber_mut(id)?;
                wip.pending_props = pending_props;
                wip.element_type = element_type;
                wip.flags = Flags::NO_FLAGS;
                wip.subtree_flags = Flags::NO_FLAGS;
                wip.deletions.clear();
                id
            }
            None => {
                let mut wip = FiberNode::with_raw_tag(raw_tag, key, element_type, pending_props);
                wip.alternate = Some(current_id);
                let id = self.insert(wip);
                self.fiber_mut(current_id)?.alternate = Some(id);
                id
            }
        };

        let wip = self.fiber_mut(wip_id)?;
        wip.child = child;
        wip.sibling = sibling;
        wip.index = index;
        wip.memoized_props = memoized_props;
        wip.state_node = state_node;
        wip.lifecycle = FiberLifecycle::Pending;
        Ok(wip_id)
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Make `children` the ordered child list of `parent`.
    pub fn link_children(&mut self, parent: FiberId, children: &[FiberId]) -> Result<()> {
        for (index, &child) in children.iter().enumerate() {
            let sibling = children.get(index + 1).copied();
            let fiber = self.fiber_mut(child)?;
            fiber.return_fiber = Some(parent);
            fiber.sibling = sibling;
            fiber.index = index;
        }
        self.fiber_mut(parent)?.child = children.first().copied();
        log::trace!("link_children: parent={:?} children={:?}", parent, children);
        Ok(())
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Mark the start of a render. Fibers allocated from now on are freed by
    /// [`FiberTree::discard_work_in_progress`].
    pub fn begin_render(&mut self) {
        self.created.clear();
    }

    /// Forget the allocations of a render that is being committed.
    pub fn end_render(&mut self) {
        self.created.clear();
    }

    /// Fibers allocated since `begin_render`.
    pub fn created(&self) -> &[FiberId] {
        &self.created
    }

    /// Free every fiber allocated since `begin_render`.
    ///
    /// Reused alternates stay allocated as the spare buffer; their stale
    /// effects are reset the next time they are reused.
    pub fn discard_work_in_progress(&mut self) -> usize {
        let created = std::mem::take(&mut self.created);
        let mut freed = 0;
        for id in created {
            if self.free_fiber(id) {
                freed += 1;
            }
        }
        freed
    }

    /// Free `root`, its descendants and the alternates of all of them.
    pub fn free_subtree(&mut self, root: FiberId) -> usize {
        let mut freed = 0;
        for id in self.descendants(root) {
            let alternate = self.fibers.get(id).and_then(|f| f.alternate);
            if self.free_fiber(id) {
                freed += 1;
            }
            if let Some(alternate) = alternate {
                if self.free_fiber(alternate) {
                    freed += 1;
                }
            }
        }
        freed
    }

    fn free_fiber(&mut self, id: FiberId) -> bool {
        let Some(fiber) = self.fibers.remove(id) else {
            return false;
        };
        if let Some(alternate) = fiber.alternate {
            if let Some(other) = self.fibers.get_mut(alternate) {
                if other.alternate == Some(id) {
                    other.alternate = None;
                }
            }
        }
        true
    }

    // =========================================================================
    // Invariant checks
    // =========================================================================

    /// Check the buffer rooted at `root`.
    ///
    /// Every child's `return` must point at its parent, `index` must match
    /// its position, no fiber may be reachable twice, and every `alternate`
    /// must point back.
    pub fn verify_links(&self, root: FiberId) -> Result<()> {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(ReconcileError::BrokenLink {
                    fiber: id,
                    reason: "reachable from two parents".to_string(),
                });
            }
            let fiber = self.fiber(id)?;

            if let Some(alternate) = fiber.alternate {
                let twin = self.fiber(alternate)?;
                if twin.alternate != Some(id) {
                    return Err(ReconcileError::BrokenLink {
                        fiber: id,
                        reason: format!("alternate {:?} does not point back", alternate),
                    });
                }
            }

            let mut next = fiber.child;
            let mut index = 0;
            while let Some(child_id) = next {
                let child = self.fiber(child_id)?;
                if child.return_fiber != Some(id) {
                    return Err(ReconcileError::BrokenLink {
                        fiber: child_id,
                        reason: format!("return is {:?}, expected {:?}", child.return_fiber, id),
                    });
                }
                if child.index != index {
                    return Err(ReconcileError::BrokenLink {
                        fiber: child_id,
                        reason: format!("index is {}, expected {}", child.index, index),
                    });
                }
                if index > self.fibers.len() {
                    return Err(ReconcileError::BrokenLink {
                        fiber: id,
                        reason: "sibling list does not terminate".to_string(),
                    });
                }
                stack.push(child_id);
                next = child.sibling;
                index += 1;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Child iteration
// =============================================================================

/// Iterator over a fiber's direct children.
pub struct Children<'a, I> {
    tree: &'a FiberTree<I>,
    next: Option<FiberId>,
}

impl<I> Iterator for Children<'_, I> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.tree.fibers.get(id).and_then(|f| f.sibling);
        Some(id)
    }
}
