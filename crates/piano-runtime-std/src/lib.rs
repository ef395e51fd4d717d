//! Standard runtime services backed by Rust's `std` library.
//!
//! [`StdScheduler`] implements [`piano_core::FrameScheduler`] with an atomic
//! frame-request flag and an optional waker, so an event loop can sleep
//! until a [`PianoRoot`] has queued work. [`StdRuntime`] bundles it with
//! mounting and a tick pump.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use piano_core::{FrameScheduler, MountOptions, PianoResult, PianoRoot, SurfaceHost, Widget};

type FrameWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records frame requests in an atomic flag.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    frame_waker: RwLock<Option<FrameWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            frame_waker: RwLock::new(None),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a new frame is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_frame_waker(&self) {
        *self
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .frame_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl FrameScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Mounts roots on a shared [`StdScheduler`] and pumps their ticks.
#[derive(Clone, Default)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Mounts `home` with this runtime's scheduler.
    pub fn mount(
        &self,
        host: impl SurfaceHost,
        home: Widget,
        options: MountOptions,
    ) -> PianoResult<PianoRoot> {
        PianoRoot::mount_with_scheduler(host, home, options, self.scheduler())
    }

    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    /// Ticks `root` while frames keep being requested, at most `max_ticks`
    /// times. Returns the number of ticks run.
    pub fn pump(&self, root: &mut PianoRoot, max_ticks: usize) -> PianoResult<usize> {
        let mut ticks = 0;
        while ticks < max_ticks && (self.take_frame_request() || root.needs_frame()) {
            let stats = root.tick()?;
            log::trace!("tick {ticks}: {stats:?}");
            ticks += 1;
        }
        if root.needs_frame() {
            log::warn!("still dirty after {max_ticks} ticks");
        }
        Ok(ticks)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
