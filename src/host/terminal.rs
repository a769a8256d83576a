//! Terminal host - an in-memory host tree rendered with crossterm.
//!
//! Instances are ids into a node arena. Removing a node from its parent or
//! the container releases it together with its subtree. A host built with
//! [`TerminalHost::recording`] also logs every call as a [`HostOp`], which
//! shows the exact effects a render and commit produce; the log grows until
//! [`TerminalHost::take_ops`] drains it. The tree can be written to any
//! `io::Write` as a colored outline, or serialized to markup.
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::host::terminal::{TerminalContainer, TerminalHost};
//! use spark_fiber::reconciler::Reconciler;
//!
//! let mut reconciler = Reconciler::new(TerminalHost::new(), TerminalContainer::new());
//! reconciler.update_container(app_element)?;
//!
//! let (host, container) = reconciler.host_and_container();
//! host.render(container, &mut std::io::stdout())?;
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use slotmap::SlotMap;

use super::HostConfig;
use crate::element::{CHILDREN, PropChange, PropValue, Props};

// =============================================================================
// Nodes
// =============================================================================

slotmap::new_key_type! {
    /// Handle of a terminal host node.
    pub struct NodeId;
}

/// Content of a host node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element { tag: Rc<str>, props: Props },
    Text(String),
}

/// One host node.
#[derive(Debug, Clone, PartialEq)]
pub struct HostNode {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Root render target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerminalContainer {
    pub children: Vec<NodeId>,
}

impl TerminalContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// Operation log
// =============================================================================

/// A recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateInstance { node: NodeId, tag: Rc<str> },
    CreateText { node: NodeId, text: String },
    AppendInitialChild { parent: NodeId, child: NodeId },
    AppendChild { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, child: NodeId, before: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    AppendToContainer { child: NodeId },
    InsertInContainerBefore { child: NodeId, before: NodeId },
    RemoveFromContainer { child: NodeId },
    CommitUpdate { node: NodeId, changes: Vec<PropChange> },
    CommitTextUpdate { node: NodeId, text: String },
    DiscardInstance { node: NodeId },
}

// =============================================================================
// Terminal Host
// =============================================================================

/// Host config backed by an in-memory node arena.
#[derive(Debug, Default)]
pub struct TerminalHost {
    nodes: SlotMap<NodeId, HostNode>,
    ops: Vec<HostOp>,
    record_ops: bool,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that logs every call into [`TerminalHost::ops`].
    pub fn recording() -> Self {
        Self {
            record_ops: true,
            ..Self::default()
        }
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes.get(id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Recorded operations since the last [`TerminalHost::take_ops`].
    /// Always empty unless the host was built with `recording`.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Text content of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Serialize the container's tree as markup.
    ///
    /// Attributes are written in prop order; `children` and callbacks are
    /// skipped.
    pub fn markup(&self, container: &TerminalContainer) -> String {
        let mut out = String::new();
        for &child in &container.children {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, props } => {
                let _ = write!(out, "<{}", tag);
                for (name, value) in props.iter() {
                    if name == CHILDREN || matches!(value, PropValue::Callback(_)) {
                        continue;
                    }
                    let _ = write!(out, " {}=\"{}\"", name, value);
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    /// Write the container's tree to `out` as an indented, colored outline.
    pub fn render<W: Write>(&self, container: &TerminalContainer, out: &mut W) -> io::Result<()> {
        for &child in &container.children {
            self.render_node(child, 0, out)?;
        }
        out.flush()
    }

    fn render_node<W: Write>(&self, id: NodeId, depth: usize, out: &mut W) -> io::Result<()> {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Text(text) => {
                queue!(out, Print(&indent), Print(text), Print("\r\n"))?;
            }
            NodeKind::Element { tag, props } => {
                queue!(
                    out,
                    Print(&indent),
                    SetForegroundColor(Color::Cyan),
                    SetAttribute(Attribute::Bold),
                    Print(tag),
                    SetAttribute(Attribute::Reset)
                )?;
                for (name, value) in props.iter() {
                    if name == CHILDREN || matches!(value, PropValue::Callback(_)) {
                        continue;
                    }
                    queue!(
                        out,
                        SetForegroundColor(Color::DarkGrey),
                        Print(format!(" {}=", name)),
                        SetForegroundColor(Color::Yellow),
                        Print(format!("{:?}", value.to_string()))
                    )?;
                }
                queue!(out, ResetColor, Print("\r\n"))?;
                for &child in &node.children {
                    self.render_node(child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, op: HostOp) {
        if self.record_ops {
            self.record(op);
        }
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.insert(HostNode {
            kind,
            children: Vec::new(),
            parent: None,
        })
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.detach(child);
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return;
        };
        let siblings = &mut parent_node.children;
        let position = before
            .and_then(|b| siblings.iter().position(|&c| c == b))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        if let Some(child) = self.nodes.get_mut(child) {
            child.parent = Some(parent);
        }
    }

    /// Detach `id` and free it with all of its descendants.
    fn release(&mut self, id: NodeId) -> usize {
        self.detach(id);
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }
}

impl HostConfig for TerminalHost {
    type Instance = NodeId;
    type Container = TerminalContainer;

    fn create_instance(&mut self, ty: &str, props: &Props) -> NodeId {
        let tag: Rc<str> = Rc::from(ty);
        let node = self.push_node(NodeKind::Element {
            tag: tag.clone(),
            props: props.clone(),
        });
        self.record(HostOp::CreateInstance { node, tag });
        node
    }

    fn create_text_instance(&mut self, text: &str) -> NodeId {
        let node = self.push_node(NodeKind::Text(text.to_string()));
        self.record(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn append_initial_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
        self.record(HostOp::AppendInitialChild {
            parent: *parent,
            child: *child,
        });
    }

    fn commit_update(&mut self, instance: &NodeId, old_props: &Props, new_props: &Props) {
        let changes = Props::diff(old_props, new_props);
        if let Some(HostNode {
            kind: NodeKind::Element { props, .. },
            ..
        }) = self.nodes.get_mut(*instance)
        {
            for change in &changes {
                match &change.value {
                    Some(value) => props.insert(change.name.clone(), value.clone()),
                    None => {
                        props.remove(&change.name);
                    }
                }
            }
        }
        self.record(HostOp::CommitUpdate {
            node: *instance,
            changes,
        });
    }

    fn commit_text_update(&mut self, instance: &NodeId, _old_text: &str, new_text: &str) {
        if let Some(HostNode {
            kind: NodeKind::Text(text),
            ..
        }) = self.nodes.get_mut(*instance)
        {
            *text = new_text.to_string();
        }
        self.record(HostOp::CommitTextUpdate {
            node: *instance,
            text: new_text.to_string(),
        });
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
        self.record(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, before: &NodeId) {
        self.attach(*parent, *child, Some(*before));
        self.record(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        let freed = self.release(*child);
        log::trace!("remove_child: released {} host nodes", freed);
        self.record(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
    }

    fn append_child_to_container(&mut self, container: &mut TerminalContainer, child: &NodeId) {
        self.detach(*child);
        container.children.retain(|c| c != child);
        container.children.push(*child);
        self.record(HostOp::AppendToContainer { child: *child });
    }

    fn insert_in_container_before(
        &mut self,
        container: &mut TerminalContainer,
        child: &NodeId,
        before: &NodeId,
    ) {
        self.detach(*child);
        container.children.retain(|c| c != child);
        let position = container
            .children
            .iter()
            .position(|c| c == before)
            .unwrap_or(container.children.len());
        container.children.insert(position, *child);
        self.record(HostOp::InsertInContainerBefore {
            child: *child,
            before: *before,
        });
    }

    fn remove_child_from_container(&mut self, container: &mut TerminalContainer, child: &NodeId) {
        container.children.retain(|c| c != child);
        let freed = self.release(*child);
        log::trace!("remove_child_from_container: released {} host nodes", freed);
        self.record(HostOp::RemoveFromContainer { child: *child });
    }

    fn discard_instance(&mut self, instance: &NodeId) {
        if self.release(*instance) > 0 {
            self.record(HostOp::DiscardInstance { node: *instance });
        }
    }
}
