//! Commit - apply the finished render to the host.
//!
//! Effects are applied depth-first, guided by `subtree_flags`. At each
//! fiber: its deletions, then its children, then its own placement and
//! update. Children of a host fiber that was created in the same render
//! were attached off-screen during complete work, so only the topmost new
//! host fiber of a subtree is inserted.

use crate::engine::FiberId;
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::{FiberLifecycle, Flags, WorkTag};

use super::Reconciler;

/// Counts of the effects a commit applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Host nodes inserted into an attached parent or the container.
    pub placements: usize,
    pub updates: usize,
    /// Deleted fiber subtrees.
    pub deletions: usize,
}

/// Where a fiber's host nodes live.
enum HostParent<I> {
    Container,
    Instance(I),
}

impl<H: HostConfig> Reconciler<H> {
    /// Apply the finished render and make it the current buffer.
    pub fn commit(&mut self) -> Result<CommitSummary> {
        let Some(finished) = self.finished.take() else {
            return Err(if self.wip_root.is_some() {
                ReconcileError::RenderIncomplete
            } else {
                ReconcileError::NoWorkInProgress
            });
        };

        let mut summary = CommitSummary::default();
        if let Err(err) = self.commit_mutation_effects(finished, &mut summary) {
            // Effects already applied cannot be replayed; the render is gone.
            log::warn!("commit: {}; dropping the finished render", err);
            self.reset_render();
            return Err(err);
        }

        for id in self.tree.descendants(finished) {
            self.tree.fiber_mut(id)?.lifecycle = FiberLifecycle::Committed;
        }
        self.current = finished;
        self.wip_root = None;
        self.next_unit = None;
        self.tree.end_render();

        log::debug!(
            "commit: {} placements, {} updates, {} deletions",
            summary.placements,
            summary.updates,
            summary.deletions
        );
        Ok(summary)
    }

    fn commit_mutation_effects(&mut self, id: FiberId, summary: &mut CommitSummary) -> Result<()> {
        let fiber = self.tree.fiber(id)?;
        let tag = fiber.tag(id)?;
        let deletions = fiber.deletions.clone();
        let flags = fiber.flags;
        let subtree_flags = fiber.subtree_flags;

        for deleted in deletions {
            self.commit_deletion(id, deleted)?;
            summary.deletions += 1;
        }

        if subtree_flags.intersects(Flags::MUTATION_MASK) {
            let children: Vec<FiberId> = self.tree.children(id).collect();
            for child in children {
                self.commit_mutation_effects(child, summary)?;
            }
        }

        if flags.contains(Flags::PLACEMENT) && tag.is_host() && self.commit_placement(id)? {
            summary.placements += 1;
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(id, tag)?;
            summary.updates += 1;
        }
        Ok(())
    }

    // =========================================================================
    // Placement
    // =========================================================================

    /// Insert the host node of `id`. Returns false when it was already
    /// attached off-screen to a new parent.
    fn commit_placement(&mut self, id: FiberId) -> Result<bool> {
        let (parent_id, parent) = self.host_parent(id)?;
        if self.tree.fiber(parent_id)?.flags.contains(Flags::PLACEMENT) {
            return Ok(false);
        }

        let instance = self.instance_of(id)?;
        let before = self.host_sibling(id)?;
        log::trace!("commit_placement: {:?} (insert before sibling: {})", id, before.is_some());
        match (parent, before) {
            (HostParent::Container, Some(before)) => {
                self.host
                    .insert_in_container_before(&mut self.container, &instance, &before)
            }
            (HostParent::Container, None) => {
                self.host.append_child_to_container(&mut self.container, &instance)
            }
            (HostParent::Instance(parent), Some(before)) => {
                self.host.insert_before(&parent, &instance, &before)
            }
            (HostParent::Instance(parent), None) => self.host.append_child(&parent, &instance),
        }
        Ok(true)
    }

    /// Nearest ancestor that owns host children, and its handle.
    fn host_parent(&self, id: FiberId) -> Result<(FiberId, HostParent<H::Instance>)> {
        let mut next = self.tree.fiber(id)?.return_fiber;
        while let Some(parent_id) = next {
            let parent = self.tree.fiber(parent_id)?;
            match parent.tag(parent_id)? {
                WorkTag::HostRoot => return Ok((parent_id, HostParent::Container)),
                WorkTag::HostComponent => {
                    return Ok((parent_id, HostParent::Instance(self.instance_of(parent_id)?)));
                }
                WorkTag::FunctionComponent | WorkTag::HostText => next = parent.return_fiber,
            }
        }
        Err(ReconcileError::BrokenLink {
            fiber: id,
            reason: "no host parent above fiber".to_string(),
        })
    }

    /// First host node after `id` in document order that is already
    /// attached, staying under the same host parent.
    fn host_sibling(&self, id: FiberId) -> Result<Option<H::Instance>> {
        let mut node = id;
        'siblings: loop {
            loop {
                let fiber = self.tree.fiber(node)?;
                if let Some(sibling) = fiber.sibling {
                    node = sibling;
                    break;
                }
                match fiber.return_fiber {
                    Some(parent) if !self.tree.fiber(parent)?.tag(parent)?.is_host_parent() => {
                        node = parent;
                    }
                    _ => return Ok(None),
                }
            }

            loop {
                let fiber = self.tree.fiber(node)?;
                if fiber.flags.contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                if fiber.tag(node)?.is_host() {
                    return Ok(fiber.state_node.clone());
                }
                match fiber.child {
                    Some(child) => node = child,
                    None => continue 'siblings,
                }
            }
        }
    }

    // =========================================================================
    // Update
    // =========================================================================

    fn commit_update(&mut self, id: FiberId, tag: WorkTag) -> Result<()> {
        let fiber = self.tree.fiber(id)?;
        let instance = self.instance_of(id)?;
        let old = fiber
            .alternate
            .and_then(|alt| self.tree.get(alt))
            .and_then(|alt| alt.memoized_props.clone());
        let new = fiber.memoized_props.clone().unwrap_or_else(|| fiber.pending_props.clone());

        match tag {
            WorkTag::HostComponent => {
                let old_props = old
                    .as_ref()
                    .and_then(|p| p.as_props())
                    .cloned()
                    .unwrap_or_default();
                let new_props = new.as_props().cloned().unwrap_or_default();
                log::trace!("commit_update: {:?}", id);
                self.host.commit_update(&instance, &old_props, &new_props);
            }
            WorkTag::HostText => {
                let old_text = old.as_ref().and_then(|p| p.as_text()).unwrap_or_default();
                let new_text = new.as_text().unwrap_or_default();
                log::trace!("commit_text_update: {:?} {:?}", id, new_text);
                self.host.commit_text_update(&instance, old_text, new_text);
            }
            WorkTag::HostRoot | WorkTag::FunctionComponent => {
                log::warn!("commit_update: {:?} has no host node to update", id);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Detach every top-level host node of the current subtree `deleted`,
    /// then free both buffers of it.
    fn commit_deletion(&mut self, parent_wip: FiberId, deleted: FiberId) -> Result<()> {
        let parent = match self.tree.fiber(parent_wip)?.tag(parent_wip)? {
            WorkTag::HostRoot => HostParent::Container,
            WorkTag::HostComponent => HostParent::Instance(self.instance_of(parent_wip)?),
            WorkTag::FunctionComponent | WorkTag::HostText => self.host_parent(parent_wip)?.1,
        };

        let mut stack = vec![deleted];
        while let Some(id) = stack.pop() {
            let fiber = self.tree.fiber(id)?;
            if fiber.tag(id)?.is_host() {
                let instance = self.instance_of(id)?;
                match &parent {
                    HostParent::Container => {
                        self.host.remove_child_from_container(&mut self.container, &instance)
                    }
                    HostParent::Instance(parent) => self.host.remove_child(parent, &instance),
                }
                continue;
            }
            stack.extend(self.tree.children(id));
        }

        let freed = self.tree.free_subtree(deleted);
        log::trace!("commit_deletion: {:?} freed {} fibers", deleted, freed);
        Ok(())
    }

    fn instance_of(&self, id: FiberId) -> Result<H::Instance> {
        self.tree.fiber(id)?.state_node.clone().ok_or(ReconcileError::MalformedFiber {
            fiber: id,
            expected: "host instance",
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config;
    use crate::element::{FunctionComponent, PropValue, jsx};
    use crate::host::terminal::{HostOp, TerminalContainer, TerminalHost};
    use crate::reconciler::{Reconciler, RenderStatus};

    fn reconciler() -> Reconciler<TerminalHost> {
        Reconciler::new(TerminalHost::recording(), TerminalContainer::new())
    }

    #[test]
    fn test_commit_without_render_fails() {
        let mut reconciler = reconciler();
        assert_eq!(reconciler.commit(), Err(crate::ReconcileError::NoWorkInProgress));
    }

    #[test]
    fn test_commit_before_completion_fails() {
        let mut reconciler = reconciler();
        reconciler.render(jsx("div", &config! {}, vec!["a".into()])).unwrap();
        assert_eq!(reconciler.work(1).unwrap(), RenderStatus::Yielded);
        assert_eq!(reconciler.commit(), Err(crate::ReconcileError::RenderIncomplete));
    }

    #[test]
    fn test_only_topmost_new_host_node_is_inserted() {
        let mut reconciler = reconciler();
        let tree = jsx(
            "div",
            &config! {},
            vec![jsx("span", &config! {}, vec!["a".into()]).into(), "b".into()],
        );
        let summary = reconciler.update_container(tree).unwrap();

        assert_eq!(summary.placements, 1);
        let inserts: Vec<&HostOp> = reconciler
            .host()
            .ops()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    HostOp::AppendChild { .. }
                        | HostOp::InsertBefore { .. }
                        | HostOp::AppendToContainer { .. }
                        | HostOp::InsertInContainerBefore { .. }
                )
            })
            .collect();
        assert_eq!(inserts.len(), 1);
        assert!(matches!(inserts[0], HostOp::AppendToContainer { .. }));
    }

    #[test]
    fn test_inserted_child_goes_before_existing_sibling() {
        let mut reconciler = reconciler();
        let maybe = FunctionComponent::new("Maybe", |props| {
            if props.get("show") == Some(&PropValue::Bool(true)) {
                jsx("p", &config! {}, vec!["a".into()]).into()
            } else {
                PropValue::Null
            }
        });
        let view = |show: bool| {
            jsx(
                "ul",
                &config! {},
                vec![
                    jsx(&maybe, &config! { "show" => show }, vec![]).into(),
                    jsx("li", &config! {}, vec!["b".into()]).into(),
                ],
            )
        };

        reconciler.update_container(view(false)).unwrap();
        reconciler.host_mut().take_ops();
        let summary = reconciler.update_container(view(true)).unwrap();

        assert_eq!(summary.placements, 1);
        assert!(reconciler
            .host()
            .ops()
            .iter()
            .any(|op| matches!(op, HostOp::InsertBefore { .. })));
        let (host, container) = reconciler.host_and_container();
        assert_eq!(host.markup(container), "<ul><p>a</p><li>b</li></ul>");
    }

    #[test]
    fn test_failed_commit_drops_the_render() {
        let mut reconciler = reconciler();
        reconciler
            .render(jsx("div", &config! {}, vec!["a".into()]))
            .unwrap();
        reconciler.work_until_complete().unwrap();

        // A placed fiber without an instance cannot be attached.
        let wip = reconciler.work_in_progress_root().unwrap();
        let div = reconciler.tree.get(wip).unwrap().child.unwrap();
        reconciler.tree.get_mut(div).unwrap().state_node = None;

        assert!(matches!(
            reconciler.commit(),
            Err(crate::ReconcileError::MalformedFiber { fiber, .. }) if fiber == div
        ));
        assert!(!reconciler.is_rendering());
        assert_eq!(reconciler.work(1), Err(crate::ReconcileError::NoWorkInProgress));
        assert_eq!(reconciler.commit(), Err(crate::ReconcileError::NoWorkInProgress));

        reconciler
            .update_container(jsx("div", &config! {}, vec!["b".into()]))
            .unwrap();
        let (host, container) = reconciler.host_and_container();
        assert_eq!(host.markup(container), "<div>b</div>");
    }

    #[test]
    fn test_fibers_are_committed() {
        let mut reconciler = reconciler();
        reconciler
            .update_container(jsx("div", &config! {}, vec!["a".into()]))
            .unwrap();

        let root = reconciler.current_root();
        for id in reconciler.tree().descendants(root) {
            assert_eq!(
                reconciler.tree().get(id).unwrap().lifecycle,
                crate::types::FiberLifecycle::Committed
            );
        }
    }
}
