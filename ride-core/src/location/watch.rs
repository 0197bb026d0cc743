//! Continuous location subscriptions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::geo::distance;

use super::device::{LocationSample, SampleStream, WatchOptions};

/// Callback receiving admitted samples.
pub(crate) type SampleCallback = Box<dyn FnMut(LocationSample) + Send + 'static>;

/// State shared between a [`WatchHandle`] and its forwarding task.
struct Subscription {
    callback: Mutex<Option<SampleCallback>>,
    stopped: AtomicBool,
    /// Thread currently running the callback, if any.
    delivering: Mutex<Option<ThreadId>>,
}

impl Subscription {
    fn set_delivering(&self, thread: Option<ThreadId>) {
        *self.delivering.lock().unwrap_or_else(PoisonError::into_inner) = thread;
    }

    fn delivering_on_current_thread(&self) -> bool {
        *self.delivering.lock().unwrap_or_else(PoisonError::into_inner)
            == Some(thread::current().id())
    }
}

/// Lifecycle of a watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Watching,
    Stopped,
}

/// Decides which device samples are forwarded to the subscriber.
///
/// A sample is admitted when both the interval and the distance since the
/// last admitted sample exceed the configured minimums. The first sample is
/// always admitted.
#[derive(Debug, Clone)]
pub(crate) struct Throttle {
    options: WatchOptions,
    last: Option<LocationSample>,
}

impl Throttle {
    pub(crate) fn new(options: WatchOptions) -> Self {
        Self {
            options,
            last: None,
        }
    }

    pub(crate) fn admit(&mut self, sample: &LocationSample) -> bool {
        if let Some(last) = &self.last {
            let elapsed = sample.timestamp.signed_duration_since(last.timestamp);
            let interval_ok = elapsed
                .to_std()
                .map(|e| e >= self.options.min_interval)
                .unwrap_or(false);
            let moved = distance(&last.coordinate, &sample.coordinate);

            if !interval_ok || moved <= self.options.min_distance_meters {
                return false;
            }
        }

        self.last = Some(sample.clone());
        true
    }
}

/// Handle to a running watch.
///
/// [`stop`](Self::stop) is idempotent and, once it returns, the callback
/// will not run again; a sample already travelling through the pipeline is
/// discarded. Called from another thread while a delivery is in progress,
/// `stop` waits for that delivery to finish. Called from inside the
/// callback, it returns at once and the callback is dropped when it
/// returns. Dropping the handle stops the watch.
pub struct WatchHandle {
    shared: Arc<Subscription>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Spawn the forwarding task for a device stream.
    pub(crate) fn spawn(
        mut stream: SampleStream,
        options: WatchOptions,
        on_sample: SampleCallback,
        last_fix: Arc<Mutex<Option<LocationSample>>>,
    ) -> Self {
        let shared = Arc::new(Subscription {
            callback: Mutex::new(Some(on_sample)),
            stopped: AtomicBool::new(false),
            delivering: Mutex::new(None),
        });
        let sub = shared.clone();

        let task = tokio::spawn(async move {
            let mut throttle = Throttle::new(options);

            while let Some(sample) = stream.next().await {
                *last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(sample.clone());

                if !throttle.admit(&sample) {
                    trace!(timestamp = %sample.timestamp, "watch sample throttled");
                    continue;
                }

                // The callback runs under the slot lock so that `stop` from
                // another thread cannot return mid-delivery.
                let mut guard = sub.callback.lock().unwrap_or_else(PoisonError::into_inner);
                if sub.stopped.load(Ordering::Acquire) {
                    break;
                }
                let Some(cb) = guard.as_mut() else { break };

                sub.set_delivering(Some(thread::current().id()));
                cb(sample);
                sub.set_delivering(None);

                if sub.stopped.load(Ordering::Acquire) {
                    // Stopped from inside the callback. Release the lock
                    // before dropping it, since the callback may own the handle.
                    let finished = guard.take();
                    drop(guard);
                    drop(finished);
                    break;
                }
            }
        });

        Self { shared, task }
    }

    /// Stop the subscription and release the device stream.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::AcqRel) {
            trace!("watch stopped");
        }
        self.task.abort();

        if self.shared.delivering_on_current_thread() {
            return;
        }
        let previous = self
            .shared
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(previous);
    }

    pub fn state(&self) -> WatchState {
        if self.shared.stopped.load(Ordering::Acquire) || self.task.is_finished() {
            WatchState::Stopped
        } else {
            WatchState::Watching
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == WatchState::Watching
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
