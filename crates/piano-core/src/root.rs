use std::sync::Arc;

use piano_ui_graphics::Size;
use piano_ui_layout::BoxConstraints;

use crate::element::{ElementId, ElementTree};
use crate::platform::FrameScheduler;
use crate::runtime::{DefaultScheduler, Runtime};
use crate::surface::{Connection, Frame, SurfaceHost, SurfaceId};
use crate::widget::Widget;
use crate::PianoResult;

/// Settings for [`PianoRoot::mount`].
#[derive(Clone, Debug)]
pub struct MountOptions {
    /// Size of the root frame and of the first layout pass.
    pub viewport: Size,
    /// Name given to the root frame surface.
    pub root_name: String,
    /// Log the element tree at debug level after mounting.
    pub log_tree: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            viewport: Size::new(800.0, 600.0),
            root_name: "PianoRoot".to_owned(),
            log_tree: false,
        }
    }
}

impl MountOptions {
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn with_log_tree(mut self, log_tree: bool) -> Self {
        self.log_tree = log_tree;
        self
    }
}

/// What one [`PianoRoot::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Dirty elements that were rebuilt.
    pub rebuilt: usize,
    /// Queued elements skipped because they were already clean or gone.
    pub skipped: usize,
    /// Layout passes re-run.
    pub relaid_out: usize,
    /// Dependents marked by provider announcements.
    pub notified: usize,
}

/// A mounted element tree and the runtime that schedules its rebuilds.
pub struct PianoRoot {
    runtime: Runtime,
    tree: ElementTree,
    root: ElementId,
    root_surface: SurfaceId,
    _size_connection: Connection,
}

impl PianoRoot {
    /// Mounts `home` into a new root frame on `host`.
    pub fn mount(host: impl SurfaceHost, home: Widget, options: MountOptions) -> PianoResult<Self> {
        Self::mount_with_scheduler(host, home, options, Arc::new(DefaultScheduler))
    }

    pub fn mount_with_scheduler(
        host: impl SurfaceHost,
        home: Widget,
        options: MountOptions,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> PianoResult<Self> {
        let runtime = Runtime::new(scheduler);
        let mut tree = ElementTree::new(Box::new(host), runtime.handle());

        let mut frame = Frame::new(options.viewport);
        frame.name = options.root_name.clone();
        let root_surface = tree.host_mut().insert(Box::new(frame));

        let root = tree.create_root(root_surface);
        tree.mount(root, None, Some(root))?;
        let home_element = tree.inflate_widget(root, home, Some(0))?;

        let component = tree.find_child_with_component(root)?;
        tree.layout(component, viewport_constraints(options.viewport))?;

        let relayout = runtime.handle();
        let size_connection = tree.host_mut().connect_absolute_size_changed(
            root_surface,
            Box::new(move |size| relayout.request_relayout(size)),
        )?;

        log::debug!(
            "mounted {} under {}",
            tree.widget(home_element).map(Widget::name).unwrap_or("?"),
            options.root_name
        );
        if options.log_tree {
            log::debug!("element tree:\n{}", tree.dump_tree(root));
        }

        Ok(Self {
            runtime,
            tree,
            root,
            root_surface,
            _size_connection: size_connection,
        })
    }

    pub fn root_element(&self) -> ElementId {
        self.root
    }

    pub fn home_element(&self) -> Option<ElementId> {
        self.tree.child(self.root, 0)
    }

    pub fn root_surface(&self) -> SurfaceId {
        self.root_surface
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn host<H: SurfaceHost>(&self) -> Option<&H> {
        self.tree.host().downcast_ref::<H>()
    }

    pub fn host_mut<H: SurfaceHost>(&mut self) -> Option<&mut H> {
        self.tree.host_mut().downcast_mut::<H>()
    }

    /// Whether a tick would currently do any work.
    pub fn needs_frame(&self) -> bool {
        self.runtime.needs_frame()
    }

    /// Queues `id` for rebuild on the next tick.
    pub fn add_to_rebuild(&self, id: ElementId) -> PianoResult<bool> {
        self.tree.mark_rebuild(id)
    }

    /// Lays the tree out again against the root frame's current size.
    pub fn relayout(&mut self) -> PianoResult<()> {
        let size = self.tree.host().get(self.root_surface)?.absolute_size();
        self.relayout_to(size)
    }

    fn relayout_to(&mut self, size: Size) -> PianoResult<()> {
        let component = self.tree.find_child_with_component(self.root)?;
        self.tree.layout(component, viewport_constraints(size))
    }

    /// Processes one frame of queued work.
    ///
    /// Applies a pending root resize, rebuilds every element queued before
    /// the tick started, re-lays out what they produced, then runs deferred
    /// provider announcements. Rebuilds those announcements request run on
    /// the next tick.
    pub fn tick(&mut self) -> PianoResult<TickStats> {
        let mut stats = TickStats::default();

        if let Some(size) = self.runtime.take_relayout() {
            self.relayout_to(size)?;
            stats.relaid_out += 1;
        }

        let pending: Vec<ElementId> = self.runtime.take_pending_rebuilds().into_iter().collect();
        for (position, id) in pending.iter().copied().enumerate() {
            if !self.tree.contains(id) || !self.tree.is_dirty(id) {
                stats.skipped += 1;
                continue;
            }
            if let Err(err) = self.rebuild_and_relayout(id, &mut stats) {
                log::error!("rebuild of element {id} failed: {err}");
                for remaining in &pending[position..] {
                    // still dirty; retried next tick
                    let _ = self.tree.mark_rebuild(*remaining);
                }
                return Err(err);
            }
        }

        let tasks = self.runtime.take_tasks();
        stats.notified = self.tree.run_deferred(tasks)?;

        if !self.runtime.has_work() {
            self.runtime.set_needs_frame(false);
        }
        if stats != TickStats::default() {
            log::trace!("tick: {:?}", stats);
        }
        Ok(stats)
    }

    fn rebuild_and_relayout(&mut self, id: ElementId, stats: &mut TickStats) -> PianoResult<()> {
        self.tree.rebuild(id)?;
        stats.rebuilt += 1;

        let component = self.tree.find_child_with_component(id)?;
        if let Some(constraints) = self.tree.constraints(component) {
            self.tree.layout(component, constraints)?;
            stats.relaid_out += 1;
            return Ok(());
        }
        // a freshly inflated subtree has never been laid out; redo the
        // nearest ancestor that has
        let mut current = self.tree.parent(component);
        while let Some(ancestor) = current {
            if let Some(constraints) = self.tree.constraints(ancestor) {
                self.tree.layout(ancestor, constraints)?;
                stats.relaid_out += 1;
                return Ok(());
            }
            current = self.tree.parent(ancestor);
        }
        self.relayout()?;
        stats.relaid_out += 1;
        Ok(())
    }

    /// Unmounts the whole tree, destroying every surface it created.
    pub fn unmount(mut self) -> PianoResult<Box<dyn SurfaceHost>> {
        self.tree.unmount(self.root)?;
        let PianoRoot { tree, .. } = self;
        Ok(tree.into_host())
    }
}

fn viewport_constraints(size: Size) -> BoxConstraints {
    BoxConstraints::from_size(size)
}

impl std::fmt::Debug for PianoRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PianoRoot")
            .field("root", &self.root)
            .field("elements", &self.tree.len())
            .finish()
    }
}
