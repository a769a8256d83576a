//! Host Config - the capability the reconciler renders through.
//!
//! The core never creates or mutates host nodes itself. A host config is
//! handed to the [`Reconciler`](crate::reconciler::Reconciler) at
//! construction and called:
//! - during complete work, to create instances and assemble new subtrees
//!   off-screen (`create_instance`, `create_text_instance`,
//!   `append_initial_child`);
//! - during commit, to attach, patch and detach them;
//! - when a render is abandoned, to release the instances it created.
//!
//! - [`terminal`] - reference host that renders to a terminal

pub mod terminal;

use crate::element::Props;

/// Host environment operations.
///
/// `Instance` is a cheap handle (an id, an `Rc`, a DOM node reference);
/// fibers store clones of it but the host owns the actual node.
/// `Container` is the render target the root mounts into.
pub trait HostConfig {
    type Instance: Clone;
    type Container;

    // =========================================================================
    // Render phase
    // =========================================================================

    /// Create an element instance for host tag `ty` with `props`.
    fn create_instance(&mut self, ty: &str, props: &Props) -> Self::Instance;

    /// Create a text instance.
    fn create_text_instance(&mut self, text: &str) -> Self::Instance;

    /// Append `child` to a parent that is not attached yet.
    fn append_initial_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    // =========================================================================
    // Commit phase
    // =========================================================================

    /// Patch an element instance from `old_props` to `new_props`.
    fn commit_update(&mut self, instance: &Self::Instance, old_props: &Props, new_props: &Props);

    /// Replace the content of a text instance.
    fn commit_text_update(&mut self, instance: &Self::Instance, old_text: &str, new_text: &str);

    fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    fn insert_before(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        before: &Self::Instance,
    );

    fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    fn append_child_to_container(
        &mut self,
        container: &mut Self::Container,
        child: &Self::Instance,
    );

    fn insert_in_container_before(
        &mut self,
        container: &mut Self::Container,
        child: &Self::Instance,
        before: &Self::Instance,
    );

    fn remove_child_from_container(
        &mut self,
        container: &mut Self::Container,
        child: &Self::Instance,
    );

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Release an instance created by a render that was abandoned before
    /// commit. It was never attached to the container; its off-screen
    /// children may be released with it.
    fn discard_instance(&mut self, _instance: &Self::Instance) {}
}
