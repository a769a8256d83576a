//! Complete work - bottom-up materialization of host instances.
//!
//! Runs once per fiber after all of its children completed. Host fibers
//! either keep their instance (flagging `UPDATE` when props changed) or get
//! a fresh one that is assembled off-screen with every host descendant and
//! flagged `PLACEMENT`. Every fiber then bubbles its subtree's flags up.

use crate::element::Props;
use crate::engine::{FiberId, FiberTree};
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::{FiberLifecycle, Flags, WorkTag};

/// Complete `wip`, creating or diffing its host instance.
pub(crate) fn complete_work<H: HostConfig>(
    tree: &mut FiberTree<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<()> {
    let tag = tree.fiber(wip)?.tag(wip)?;
    ensure_children_completed(tree, wip)?;
    log::trace!("complete_work: {:?} {:?}", tag, wip);

    match tag {
        WorkTag::HostRoot | WorkTag::FunctionComponent => {}
        WorkTag::HostComponent => complete_host_component(tree, host, wip)?,
        WorkTag::HostText => complete_host_text(tree, host, wip)?,
    }

    bubble_properties(tree, wip)?;
    tree.fiber_mut(wip)?.lifecycle = FiberLifecycle::Completed;
    Ok(())
}

fn ensure_children_completed<I: Clone>(tree: &FiberTree<I>, wip: FiberId) -> Result<()> {
    for child in tree.children(wip) {
        if tree.fiber(child)?.lifecycle != FiberLifecycle::Completed {
            return Err(ReconcileError::IncompleteChildren { fiber: wip, child });
        }
    }
    Ok(())
}

fn complete_host_component<H: HostConfig>(
    tree: &mut FiberTree<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<()> {
    let fiber = tree.fiber(wip)?;
    let Some(host_tag) = fiber.element_type.as_ref().and_then(|ty| ty.host_tag()) else {
        return Err(ReconcileError::MalformedFiber { fiber: wip, expected: "host tag" });
    };
    let host_tag = host_tag.to_string();
    let Some(new_props) = fiber.pending_props.as_props().cloned() else {
        return Err(ReconcileError::MalformedFiber { fiber: wip, expected: "props" });
    };

    let current = fiber.alternate.and_then(|id| tree.get(id));
    let reusable = match current {
        Some(current) if fiber.state_node.is_some() => {
            if current.element_type == fiber.element_type {
                Some(current.memoized_props.as_ref().and_then(|p| p.as_props()).cloned())
            } else {
                log::warn!("complete_work: {:?} changed type in place, recreating", wip);
                None
            }
        }
        _ => None,
    };

    match reusable {
        Some(old_props) => {
            let old_props = old_props.unwrap_or_default();
            if !Props::diff(&old_props, &new_props).is_empty() {
                tree.fiber_mut(wip)?.flags |= Flags::UPDATE;
            }
        }
        None => {
            let instance = host.create_instance(&host_tag, &new_props);
            append_all_children(tree, host, wip, &instance)?;
            let fiber = tree.fiber_mut(wip)?;
            fiber.state_node = Some(instance);
            fiber.flags |= Flags::PLACEMENT;
        }
    }
    Ok(())
}

fn complete_host_text<H: HostConfig>(
    tree: &mut FiberTree<H::Instance>,
    host: &mut H,
    wip: FiberId,
) -> Result<()> {
    let fiber = tree.fiber(wip)?;
    let Some(new_text) = fiber.pending_props.as_text() else {
        return Err(ReconcileError::MalformedFiber { fiber: wip, expected: "text" });
    };

    let current = fiber.alternate.and_then(|id| tree.get(id));
    match current {
        Some(current) if fiber.state_node.is_some() => {
            let old_text = current.memoized_props.as_ref().and_then(|p| p.as_text());
            if old_text != Some(new_text) {
                tree.fiber_mut(wip)?.flags |= Flags::UPDATE;
            }
        }
        _ => {
            let instance = host.create_text_instance(new_text);
            let fiber = tree.fiber_mut(wip)?;
            fiber.state_node = Some(instance);
            fiber.flags |= Flags::PLACEMENT;
        }
    }
    Ok(())
}

/// Attach the nearest host descendants of `wip` to its fresh `instance`.
///
/// Function components have no instance of their own, so the walk
/// descends through them to reach their host children.
fn append_all_children<H: HostConfig>(
    tree: &FiberTree<H::Instance>,
    host: &mut H,
    wip: FiberId,
    instance: &H::Instance,
) -> Result<()> {
    let mut next = tree.fiber(wip)?.child;
    while let Some(id) = next {
        let node = tree.fiber(id)?;
        if node.tag(id)?.is_host() {
            let Some(child) = node.state_node.as_ref() else {
                return Err(ReconcileError::MalformedFiber { fiber: id, expected: "host instance" });
            };
            host.append_initial_child(instance, child);
        } else if let Some(child) = node.child {
            next = Some(child);
            continue;
        }

        let mut node_id = id;
        loop {
            let node = tree.fiber(node_id)?;
            if let Some(sibling) = node.sibling {
                next = Some(sibling);
                break;
            }
            match node.return_fiber {
                Some(parent) if parent != wip => node_id = parent,
                _ => return Ok(()),
            }
        }
    }
    Ok(())
}

/// Recompute `subtree_flags` from the immediate children and own flags.
///
/// The result only depends on the current child list, so running it again
/// yields the same value.
pub(crate) fn bubble_properties<I: Clone>(tree: &mut FiberTree<I>, wip: FiberId) -> Result<Flags> {
    let mut subtree = Flags::NO_FLAGS;
    for child in tree.children(wip) {
        let child = tree.fiber(child)?;
        subtree |= child.flags | child.subtree_flags;
    }
    let fiber = tree.fiber_mut(wip)?;
    subtree |= fiber.flags;
    fiber.subtree_flags = subtree;
    Ok(subtree)
}
