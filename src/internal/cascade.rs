//! Deferred cascade notification delivery.
//!
//! Readiness notifications travel against the edge direction, from a
//! dependency up to its watchers. Delivering one while a node lock is held
//! would acquire locks in the reverse of the dependency-directed order used
//! by `advance`, so notifications are queued per thread and the outermost
//! entry call drains the queue once every node lock has been released.
//!
//! The queue is discarded when the outermost call fails or unwinds: a fatal
//! configuration error aborts the operation that triggered the cascade.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::LifecycleResult;
use crate::holder::{ServiceHolder, WeakHolder};
use crate::qualified_id::QualifiedServiceId;

thread_local! {
    static CASCADE_TLS: RefCell<CascadeTls> = RefCell::new(CascadeTls::default());
}

#[derive(Default)]
struct CascadeTls {
    depth: usize,
    queue: VecDeque<(WeakHolder, QualifiedServiceId)>,
}

/// Queues a readiness notification for delivery by the outermost frame.
pub(crate) fn enqueue(watcher: WeakHolder, from: QualifiedServiceId) {
    CASCADE_TLS.with(|tls| tls.borrow_mut().queue.push_back((watcher, from)));
}

struct FrameGuard {
    outermost: bool,
}

impl FrameGuard {
    fn enter() -> Self {
        CASCADE_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            let outermost = tls.depth == 0;
            tls.depth += 1;
            FrameGuard { outermost }
        })
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        CASCADE_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            tls.depth = tls.depth.saturating_sub(1);
            if self.outermost {
                // Empty on the success path; drops stale entries on error
                // or unwind.
                tls.queue.clear();
            }
        });
    }
}

/// Runs an entry-point operation inside a cascade frame.
///
/// Nested frames only queue; the outermost frame delivers queued
/// notifications after its body returns, with no node lock held. Deliveries
/// may queue further notifications, which the same loop picks up. Watchers
/// dropped since they were queued are skipped.
pub(crate) fn with_frame<T>(body: impl FnOnce() -> LifecycleResult<T>) -> LifecycleResult<T> {
    let guard = FrameGuard::enter();
    let result = body()?;
    if guard.outermost {
        loop {
            let next = CASCADE_TLS.with(|tls| tls.borrow_mut().queue.pop_front());
            let Some((watcher, from)) = next else {
                break;
            };
            if let Some(watcher) = ServiceHolder::from_weak(&watcher) {
                watcher.on_ready(&from)?;
            }
        }
    }
    Ok(result)
}
