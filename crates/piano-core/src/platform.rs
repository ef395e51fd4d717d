//! Platform abstraction for the host's per-frame signal.
//!
//! Piano never drives its own loop. The host owns the frame signal and
//! calls [`crate::PianoRoot::tick`]; the runtime only tells the host that a
//! tick would do useful work.

/// Receives frame requests from the Piano runtime.
///
/// Implementations must be cheap to call repeatedly; the runtime requests a
/// frame every time new work is queued.
pub trait FrameScheduler: Send + Sync {
    /// Request that the host run [`crate::PianoRoot::tick`] on its next frame.
    fn schedule_frame(&self);
}
