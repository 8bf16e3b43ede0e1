//! Deferred work abstraction

/// Cancellable deferred task bound to one port
///
/// The driver uses one of these per port for falling-edge wake release.
/// The task body calls back into the driver
/// (`Controller::wake_release_work`).
pub trait DeferredWork {
    /// Queue the task
    ///
    /// Queuing an already-queued task is a no-op. Queuing a task that is
    /// currently running makes it run once more afterwards.
    fn schedule(&self);

    /// Try to stop the task without waiting for it
    ///
    /// Returns `true` when the task is not running and will not run until
    /// it is scheduled again (it was idle, or it was queued and has been
    /// dequeued). Returns `false` when the task body has already started.
    fn try_cancel(&self) -> bool;
}
