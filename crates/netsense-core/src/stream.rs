// ── Reactive streams ──
//
// `SensorStream` wraps a platform listener so that dropping the stream
// releases the registration. `StateStream` is the subscription handle
// vended by the screen state holders.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use netsense_api::platform::{ListenerId, LocationManager, SensorManager};

/// Unregisters a platform listener when dropped.
pub struct ListenerGuard {
    registration: Registration,
}

enum Registration {
    Sensor(Arc<dyn SensorManager>, ListenerId),
    Location(Arc<dyn LocationManager>, ListenerId),
}

impl ListenerGuard {
    pub(crate) fn sensor(manager: Arc<dyn SensorManager>, id: ListenerId) -> Self {
        Self {
            registration: Registration::Sensor(manager, id),
        }
    }

    pub(crate) fn location(manager: Arc<dyn LocationManager>, id: ListenerId) -> Self {
        Self {
            registration: Registration::Location(manager, id),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        match &self.registration {
            Registration::Sensor(manager, id) => {
                manager.unregister_listener(*id);
                debug!(?id, "sensor listener released");
            }
            Registration::Location(manager, id) => {
                manager.remove_updates(*id);
                debug!(?id, "location updates released");
            }
        }
    }
}

/// A stream of sensor-derived values that owns its platform listeners.
///
/// The listeners stay registered exactly as long as the stream is alive.
pub struct SensorStream<T> {
    inner: Pin<Box<dyn Stream<Item = T> + Send>>,
    guards: Vec<ListenerGuard>,
}

impl<T> SensorStream<T> {
    pub(crate) fn new<S>(inner: S, guards: Vec<ListenerGuard>) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            guards,
        }
    }

    /// A stream that ends immediately and holds no listener.
    pub fn empty() -> Self
    where
        T: Send + 'static,
    {
        Self::new(futures_util::stream::empty(), Vec::new())
    }

    /// Number of platform registrations held by this stream.
    pub fn listener_count(&self) -> usize {
        self.guards.len()
    }
}

impl<T> Stream for SensorStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// A subscription to a screen state holder.
///
/// Provides the snapshot at subscription time plus change notification
/// via [`changed`](Self::changed) or by converting into a `Stream`.
pub struct StateStream<S> {
    current: Arc<S>,
    receiver: watch::Receiver<Arc<S>>,
}

impl<S: Send + Sync + 'static> StateStream<S> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<S>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &Arc<S> {
        &self.current
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Arc<S> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the holder is gone.
    pub async fn changed(&mut self) -> Option<Arc<S>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` yielding every new snapshot, starting with
    /// the current one.
    pub fn into_stream(self) -> WatchStream<Arc<S>> {
        WatchStream::new(self.receiver)
    }
}
