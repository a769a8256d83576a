//! Reconciler - render and commit passes over the fiber tree.
//!
//! A render builds the work-in-progress buffer one unit of work at a time:
//!
//! ```text
//!   render(element) ─► work(budget) ─► work(budget) ─► ... ─► commit()
//!                        │ Yielded        │ Completed           │
//!                        └─ resumable ────┘                     └─ host mutations,
//!                                                                  buffer swap
//! ```
//!
//! - `begin_work`: lower a fiber's props or render output into children
//! - `complete_work`: create or diff host instances, bubble flags
//! - `commit`: apply the flagged effects through the host config
//!
//! Nothing the host can observe happens before `commit`. A render may be
//! dropped at any point with [`Reconciler::abandon`].

mod begin_work;
mod commit;
mod complete_work;

use crate::element::PropValue;
use crate::engine::{FiberId, FiberTree};
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::Flags;

pub use commit::CommitSummary;

// =============================================================================
// Configuration
// =============================================================================

/// Tuning for a [`Reconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Units of work [`Reconciler::update_container`] runs before yielding.
    pub units_per_slice: usize,
    /// Check tree links and alternate symmetry when a render completes.
    pub verify_links: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            units_per_slice: 256,
            verify_links: cfg!(debug_assertions),
        }
    }
}

/// Outcome of a bounded slice of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The budget ran out with units left; call `work` again to resume.
    Yielded,
    /// Every unit finished; the render is ready to commit.
    Completed,
}

// =============================================================================
// Reconciler
// =============================================================================

/// Drives renders of one container through a host config.
pub struct Reconciler<H: HostConfig> {
    host: H,
    container: H::Container,
    tree: FiberTree<H::Instance>,
    config: ReconcilerConfig,
    /// Root of the committed buffer.
    current: FiberId,
    /// Root of the buffer under construction.
    wip_root: Option<FiberId>,
    /// Next unit of work.
    next_unit: Option<FiberId>,
    /// Set once the work loop ran out of units.
    finished: Option<FiberId>,
}

impl<H: HostConfig> Reconciler<H> {
    pub fn new(host: H, container: H::Container) -> Self {
        Self::with_config(host, container, ReconcilerConfig::default())
    }

    pub fn with_config(host: H, container: H::Container, config: ReconcilerConfig) -> Self {
        let mut tree = FiberTree::new();
        let current = tree.create_host_root();
        tree.end_render();
        Self {
            host,
            container,
            tree,
            config,
            current,
            wip_root: None,
            next_unit: None,
            finished: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn container(&self) -> &H::Container {
        &self.container
    }

    /// Both at once, for hosts that need the container to present output.
    pub fn host_and_container(&self) -> (&H, &H::Container) {
        (&self.host, &self.container)
    }

    pub fn tree(&self) -> &FiberTree<H::Instance> {
        &self.tree
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Root fiber of the committed buffer.
    pub fn current_root(&self) -> FiberId {
        self.current
    }

    /// Root fiber of the buffer under construction, if a render is active.
    pub fn work_in_progress_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    pub fn is_rendering(&self) -> bool {
        self.wip_root.is_some()
    }

    // =========================================================================
    // Render phase
    // =========================================================================

    /// Start a render of `element` into the container.
    ///
    /// A render that is still in progress is abandoned first.
    pub fn render(&mut self, element: impl Into<PropValue>) -> Result<()> {
        if self.wip_root.is_some() {
            log::debug!("render: restarting over an unfinished render");
            self.abandon();
        }

        self.tree.begin_render();
        let root = self
            .tree
            .create_work_in_progress(self.current, begin_work::root_props(element.into()))?;
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.finished = None;
        log::debug!("render: started at {:?}", root);
        Ok(())
    }

    /// Run at most `budget` units of work.
    ///
    /// A failing unit abandons the render before the error is returned.
    pub fn work(&mut self, budget: usize) -> Result<RenderStatus> {
        let Some(root) = self.wip_root else {
            return Err(ReconcileError::NoWorkInProgress);
        };
        if self.finished.is_some() {
            return Ok(RenderStatus::Completed);
        }

        let mut units = 0;
        while let Some(unit) = self.next_unit {
            if units >= budget {
                log::trace!("work: yielding after {} units", units);
                return Ok(RenderStatus::Yielded);
            }
            if let Err(err) = self.perform_unit_of_work(unit) {
                log::warn!("work: {}; abandoning render", err);
                self.abandon();
                return Err(err);
            }
            units += 1;
        }

        if self.config.verify_links {
            if let Err(err) = self.tree.verify_links(root) {
                log::warn!("work: {}; abandoning render", err);
                self.abandon();
                return Err(err);
            }
        }
        self.finished = Some(root);
        log::debug!("work: render completed");
        Ok(RenderStatus::Completed)
    }

    /// Run the active render to completion without yielding.
    pub fn work_until_complete(&mut self) -> Result<()> {
        self.work(usize::MAX).map(|_| ())
    }

    /// Drop the render in progress.
    ///
    /// Fibers allocated by the render are freed and the host instances it
    /// created are handed back through [`HostConfig::discard_instance`].
    /// None of them was attached to the container.
    pub fn abandon(&mut self) -> usize {
        let fresh: Vec<H::Instance> = self
            .tree
            .created()
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .filter(|fiber| fiber.flags.contains(Flags::PLACEMENT))
            .filter_map(|fiber| fiber.state_node.clone())
            .collect();
        for instance in &fresh {
            self.host.discard_instance(instance);
        }

        let freed = self.reset_render();
        log::debug!(
            "abandon: freed {} fibers, discarded {} host instances",
            freed,
            fresh.len()
        );
        freed
    }

    /// Forget the render in progress and free its fibers.
    fn reset_render(&mut self) -> usize {
        self.wip_root = None;
        self.next_unit = None;
        self.finished = None;
        self.tree.discard_work_in_progress()
    }

    /// Render `element`, working in slices of `units_per_slice`, and commit.
    pub fn update_container(&mut self, element: impl Into<PropValue>) -> Result<CommitSummary> {
        self.render(element)?;
        let budget = self.config.units_per_slice.max(1);
        let mut slices = 1;
        while self.work(budget)? == RenderStatus::Yielded {
            slices += 1;
        }
        log::trace!("update_container: rendered in {} slices", slices);
        self.commit()
    }

    fn perform_unit_of_work(&mut self, unit: FiberId) -> Result<()> {
        match begin_work::begin_work(&mut self.tree, unit)? {
            Some(child) => self.next_unit = Some(child),
            None => self.complete_unit_of_work(unit)?,
        }
        Ok(())
    }

    /// Complete `unit` and climb until a sibling has work left.
    fn complete_unit_of_work(&mut self, unit: FiberId) -> Result<()> {
        let mut node = unit;
        loop {
            complete_work::complete_work(&mut self.tree, &mut self.host, node)?;
            if Some(node) == self.wip_root {
                self.next_unit = None;
                return Ok(());
            }

            let fiber = self.tree.fiber(node)?;
            if let Some(sibling) = fiber.sibling {
                self.next_unit = Some(sibling);
                return Ok(());
            }
            match fiber.return_fiber {
                Some(parent) => node = parent,
                None => {
                    self.next_unit = None;
                    return Ok(());
                }
            }
        }
    }
}
