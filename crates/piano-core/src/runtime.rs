use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use indexmap::IndexSet;
use piano_ui_graphics::Size;

use crate::platform::FrameScheduler;
use crate::ElementId;

/// Work the runtime defers to the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeferredTask {
    /// A provider changed; ask the dependent's selector whether to rebuild.
    AnnounceDependencyChange {
        dependent: ElementId,
        provider: ElementId,
    },
}

struct RuntimeInner {
    scheduler: Arc<dyn FrameScheduler>,
    needs_frame: Cell<bool>,
    pending_rebuilds: RefCell<IndexSet<ElementId>>,
    deferred: RefCell<VecDeque<DeferredTask>>,
    pending_relayout: Cell<Option<Size>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            pending_rebuilds: RefCell::new(IndexSet::new()),
            deferred: RefCell::new(VecDeque::new()),
            pending_relayout: Cell::new(None),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn register_rebuild(&self, id: ElementId) {
        let inserted = self.pending_rebuilds.borrow_mut().insert(id);
        if inserted {
            self.schedule();
        }
    }

    fn forget(&self, id: ElementId) {
        self.pending_rebuilds.borrow_mut().shift_remove(&id);
    }

    fn take_pending_rebuilds(&self) -> IndexSet<ElementId> {
        std::mem::take(&mut *self.pending_rebuilds.borrow_mut())
    }

    fn has_pending_rebuilds(&self) -> bool {
        !self.pending_rebuilds.borrow().is_empty()
    }

    fn enqueue_task(&self, task: DeferredTask) {
        self.deferred.borrow_mut().push_back(task);
        self.schedule();
    }

    fn take_tasks(&self) -> Vec<DeferredTask> {
        self.deferred.borrow_mut().drain(..).collect()
    }

    fn has_tasks(&self) -> bool {
        !self.deferred.borrow().is_empty()
    }

    fn request_relayout(&self, size: Size) {
        self.pending_relayout.set(Some(size));
        self.schedule();
    }

    fn take_relayout(&self) -> Option<Size> {
        self.pending_relayout.take()
    }

    fn has_work(&self) -> bool {
        self.has_pending_rebuilds() || self.has_tasks() || self.pending_relayout.get().is_some()
    }
}

/// Owns the queues shared by every element of one mounted tree.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    pub fn has_pending_rebuilds(&self) -> bool {
        self.inner.has_pending_rebuilds()
    }

    pub fn has_work(&self) -> bool {
        self.inner.has_work()
    }

    pub(crate) fn take_pending_rebuilds(&self) -> IndexSet<ElementId> {
        self.inner.take_pending_rebuilds()
    }

    pub(crate) fn take_relayout(&self) -> Option<Size> {
        self.inner.take_relayout()
    }

    pub(crate) fn take_tasks(&self) -> Vec<DeferredTask> {
        self.inner.take_tasks()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl FrameScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

/// Weak reference to a [`Runtime`]; every call is a no-op once the runtime is gone.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub(crate) fn register_rebuild(&self, id: ElementId) {
        if let Some(inner) = self.0.upgrade() {
            inner.register_rebuild(id);
        }
    }

    pub(crate) fn forget(&self, id: ElementId) {
        if let Some(inner) = self.0.upgrade() {
            inner.forget(id);
        }
    }

    pub(crate) fn enqueue_task(&self, task: DeferredTask) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(task);
        } else {
            log::debug!("dropping {:?}: runtime is gone", task);
        }
    }

    pub fn request_relayout(&self, size: Size) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_relayout(size);
        }
    }
}
