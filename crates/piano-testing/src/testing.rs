use std::cell::Cell;
use std::rc::Rc;

use piano_core::{
    Connection, ElementId, MemoryHost, MountOptions, PianoError, PianoResult, PianoRoot, Size,
    Surface, SurfaceError, SurfaceHost, SurfaceId, TickStats, Widget,
};

/// Counters a [`RecordingHost`] bumps as the tree drives it.
#[derive(Debug, Default)]
pub struct HostStats {
    created: Cell<usize>,
    destroyed: Cell<usize>,
    reparented: Cell<usize>,
    connected: Cell<usize>,
    disconnected: Cell<usize>,
}

impl HostStats {
    pub fn created(&self) -> usize {
        self.created.get()
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.get()
    }

    /// Surfaces created and not yet destroyed.
    pub fn live(&self) -> usize {
        self.created.get() - self.destroyed.get()
    }

    pub fn reparented(&self) -> usize {
        self.reparented.get()
    }

    pub fn connected(&self) -> usize {
        self.connected.get()
    }

    pub fn disconnected(&self) -> usize {
        self.disconnected.get()
    }

    fn bump(counter: &Cell<usize>) {
        counter.set(counter.get() + 1);
    }
}

/// A [`MemoryHost`] that counts what is done to it.
#[derive(Default)]
pub struct RecordingHost {
    inner: MemoryHost,
    stats: Rc<HostStats>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters; they stay readable after the host is dropped.
    pub fn stats(&self) -> Rc<HostStats> {
        Rc::clone(&self.stats)
    }

    pub fn memory(&self) -> &MemoryHost {
        &self.inner
    }

    pub fn memory_mut(&mut self) -> &mut MemoryHost {
        &mut self.inner
    }

    /// First live surface whose name is `name`.
    pub fn find_by_name(&self, name: &str) -> Option<SurfaceId> {
        self.inner
            .snapshot()
            .into_iter()
            .find(|(_, _, surface_name)| surface_name == name)
            .map(|(id, _, _)| id)
    }

    /// Live surfaces whose class is `class_name`, in creation order.
    pub fn find_by_class(&self, class_name: &str) -> Vec<SurfaceId> {
        self.inner
            .snapshot()
            .into_iter()
            .filter(|(_, class, _)| *class == class_name)
            .map(|(id, _, _)| id)
            .collect()
    }
}

impl SurfaceHost for RecordingHost {
    fn insert(&mut self, surface: Box<dyn Surface>) -> SurfaceId {
        HostStats::bump(&self.stats.created);
        let id = self.inner.insert(surface);
        log::trace!("created surface {id}");
        id
    }

    fn get(&self, id: SurfaceId) -> Result<&dyn Surface, SurfaceError> {
        self.inner.get(id)
    }

    fn get_mut(&mut self, id: SurfaceId) -> Result<&mut dyn Surface, SurfaceError> {
        self.inner.get_mut(id)
    }

    fn set_parent(&mut self, id: SurfaceId, parent: Option<SurfaceId>) -> Result<(), SurfaceError> {
        self.inner.set_parent(id, parent)?;
        HostStats::bump(&self.stats.reparented);
        Ok(())
    }

    fn parent(&self, id: SurfaceId) -> Result<Option<SurfaceId>, SurfaceError> {
        self.inner.parent(id)
    }

    fn destroy(&mut self, id: SurfaceId) -> Result<(), SurfaceError> {
        self.inner.destroy(id)?;
        HostStats::bump(&self.stats.destroyed);
        log::trace!("destroyed surface {id}");
        Ok(())
    }

    fn connect_absolute_size_changed(
        &mut self,
        id: SurfaceId,
        handler: Box<dyn Fn(Size)>,
    ) -> Result<Connection, SurfaceError> {
        let inner = self.inner.connect_absolute_size_changed(id, handler)?;
        HostStats::bump(&self.stats.connected);
        let stats = Rc::clone(&self.stats);
        Ok(Connection::new(move || {
            inner.disconnect();
            HostStats::bump(&stats.disconnected);
        }))
    }
}

/// A [`PianoRoot`] mounted on a [`RecordingHost`].
pub struct Harness {
    root: PianoRoot,
    stats: Rc<HostStats>,
}

impl Harness {
    pub const DEFAULT_VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    /// Mounts `home` into a viewport of [`Self::DEFAULT_VIEWPORT`].
    pub fn mount(home: impl Into<Widget>) -> PianoResult<Self> {
        Self::mount_with(
            home,
            MountOptions::default().with_viewport(Self::DEFAULT_VIEWPORT),
        )
    }

    pub fn mount_with(home: impl Into<Widget>, options: MountOptions) -> PianoResult<Self> {
        let host = RecordingHost::new();
        let stats = host.stats();
        let root = PianoRoot::mount(host, home.into(), options)?;
        Ok(Self { root, stats })
    }

    pub fn root(&self) -> &PianoRoot {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut PianoRoot {
        &mut self.root
    }

    pub fn stats(&self) -> &HostStats {
        &self.stats
    }

    pub fn host(&self) -> Option<&RecordingHost> {
        self.root.host::<RecordingHost>()
    }

    pub fn host_mut(&mut self) -> Option<&mut RecordingHost> {
        self.root.host_mut::<RecordingHost>()
    }

    pub fn home(&self) -> PianoResult<ElementId> {
        let root = self.root.root_element();
        self.root
            .home_element()
            .ok_or(PianoError::MissingElement { id: root })
    }

    /// Reconciles the home slot against `home` and lays the tree out again.
    ///
    /// A widget of another type replaces the home element.
    pub fn update_home(&mut self, home: impl Into<Widget>) -> PianoResult<()> {
        let root = self.root.root_element();
        self.root
            .tree_mut()
            .update_child(root, 0, None, Some(home.into()))?;
        self.root.relayout()
    }

    pub fn tick(&mut self) -> PianoResult<TickStats> {
        self.root.tick()
    }

    /// Ticks until no work is left, at most `max_ticks` times. Returns the
    /// number of ticks run.
    pub fn settle(&mut self, max_ticks: usize) -> PianoResult<usize> {
        let mut ticks = 0;
        while ticks < max_ticks && self.root.needs_frame() {
            self.root.tick()?;
            ticks += 1;
        }
        if self.root.needs_frame() {
            log::warn!("harness still has work after {max_ticks} ticks");
        }
        Ok(ticks)
    }

    /// The surface owned by the nearest host-backed element at or below
    /// `id`.
    pub fn surface_of(&self, id: ElementId) -> PianoResult<&dyn Surface> {
        let tree = self.root.tree();
        let component = tree.find_child_with_component(id)?;
        let surface = tree
            .surface(component)
            .ok_or(PianoError::NotHostBacked { id: component })?;
        Ok(tree.host().get(surface)?)
    }

    /// Unmounts the tree and hands back the counters.
    pub fn unmount(self) -> PianoResult<Rc<HostStats>> {
        let Harness { root, stats } = self;
        root.unmount()?;
        Ok(stats)
    }
}
