//! Begin work - top-down lowering of elements into child fibers.
//!
//! Matching is positional: the new child at index `i` reuses the current
//! child at index `i` when both key and type agree, otherwise the old fiber
//! is scheduled for deletion and a fresh one takes the slot. There is no
//! key map and no move detection.

use std::rc::Rc;

use crate::element::{CHILDREN, Element, ElementType, PropValue, Props};
use crate::engine::{FiberId, FiberProps, FiberTree};
use crate::error::{ReconcileError, Result};
use crate::types::{Flags, WorkTag};

/// A flattened child produced by a fiber's render output.
#[derive(Debug, Clone)]
enum ChildNode {
    Element(Element),
    Text(Rc<str>),
}

/// Run begin work on `wip` and return its first child, if any.
pub(crate) fn begin_work<I: Clone>(
    tree: &mut FiberTree<I>,
    wip: FiberId,
) -> Result<Option<FiberId>> {
    let fiber = tree.fiber(wip)?;
    let tag = fiber.tag(wip)?;
    log::trace!("begin_work: {:?} {:?}", tag, wip);

    let next_children = match tag {
        WorkTag::HostRoot | WorkTag::HostComponent => {
            fiber.pending_props.children().cloned().unwrap_or_default()
        }
        WorkTag::FunctionComponent => {
            let Some(ElementType::Function(component)) = fiber.element_type.clone() else {
                return Err(ReconcileError::MalformedFiber {
                    fiber: wip,
                    expected: "function component",
                });
            };
            let props = fiber.pending_props.as_props().cloned().unwrap_or_default();
            component.render(&props)
        }
        WorkTag::HostText => PropValue::Undefined,
    };

    let fiber = tree.fiber_mut(wip)?;
    fiber.memoized_props = Some(fiber.pending_props.clone());

    if tag == WorkTag::HostText {
        fiber.child = None;
        return Ok(None);
    }

    reconcile_children(tree, wip, &next_children)?;
    Ok(tree.fiber(wip)?.child)
}

/// Rebuild the child list of `wip` from `next_children`.
fn reconcile_children<I: Clone>(
    tree: &mut FiberTree<I>,
    wip: FiberId,
    next_children: &PropValue,
) -> Result<()> {
    let mut nodes = Vec::new();
    flatten_children(next_children, wip, &mut nodes)?;

    let current = tree.fiber(wip)?.alternate;
    let old_children: Vec<FiberId> = match current {
        Some(current) => tree.children(current).collect(),
        None => Vec::new(),
    };

    let mut new_children = Vec::with_capacity(nodes.len());
    let mut deletions = Vec::new();

    for (index, node) in nodes.iter().enumerate() {
        let old = old_children.get(index).copied();
        let reused = match (old, node) {
            (Some(old_id), ChildNode::Text(text)) if tree.fiber(old_id)?.is(WorkTag::HostText) => {
                Some(tree.create_work_in_progress(old_id, FiberProps::Text(text.clone()))?)
            }
            (Some(old_id), ChildNode::Element(element))
                if tree
                    .fiber(old_id)?
                    .matches(element.key(), Some(element.element_type())) =>
            {
                let props = FiberProps::Props(element.props().clone());
                Some(tree.create_work_in_progress(old_id, props)?)
            }
            _ => None,
        };

        let id = match reused {
            Some(id) => id,
            None => {
                deletions.extend(old);
                match node {
                    ChildNode::Element(element) => tree.create_fiber_from_element(element),
                    ChildNode::Text(text) => tree.create_fiber_from_text(text.clone()),
                }
            }
        };
        new_children.push(id);
    }
    deletions.extend(old_children.iter().skip(nodes.len()).copied());

    tree.link_children(wip, &new_children)?;
    if !deletions.is_empty() {
        log::trace!("reconcile_children: {:?} deletes {:?}", wip, deletions);
        let fiber = tree.fiber_mut(wip)?;
        fiber.deletions = deletions;
        fiber.flags |= Flags::CHILD_DELETION;
    }
    Ok(())
}

/// Flatten nested lists and drop values that render nothing.
fn flatten_children(value: &PropValue, parent: FiberId, out: &mut Vec<ChildNode>) -> Result<()> {
    match value {
        PropValue::Undefined | PropValue::Null | PropValue::Bool(_) => {}
        PropValue::Str(_) | PropValue::Int(_) | PropValue::Float(_) => {
            if let Some(text) = value.as_text() {
                out.push(ChildNode::Text(text));
            }
        }
        PropValue::Element(element) => {
            if !element.is_valid() {
                return Err(ReconcileError::InvalidChild {
                    fiber: parent,
                    reason: format!("element without kind marker (found {:#x})", element.marker()),
                });
            }
            out.push(ChildNode::Element(element.clone()));
        }
        PropValue::List(items) => {
            for item in items {
                flatten_children(item, parent, out)?;
            }
        }
        PropValue::Callback(_) => {
            return Err(ReconcileError::InvalidChild {
                fiber: parent,
                reason: "functions are not valid as a child".to_string(),
            });
        }
    }
    Ok(())
}

/// Props a host root holds for `element`.
pub(crate) fn root_props(element: PropValue) -> FiberProps {
    FiberProps::Props(Props::new().with(CHILDREN, element))
}
