use std::sync::Arc;
use tokio::sync::watch;

/// Publishes a stage's state and puts it back to idle when dropped, so a stage is
/// idle again after success, failure or cancellation alike.
pub(crate) struct StateGuard<S: Copy + Send + Sync + 'static> {
    tx: Arc<watch::Sender<S>>,
    idle: S,
}

impl<S: Copy + Send + Sync + 'static> StateGuard<S> {
    pub(crate) fn enter(tx: &Arc<watch::Sender<S>>, active: S, idle: S) -> Self {
        tx.send_replace(active);
        Self {
            tx: Arc::clone(tx),
            idle,
        }
    }

    pub(crate) fn set(&self, state: S) {
        self.tx.send_replace(state);
    }
}

impl<S: Copy + Send + Sync + 'static> Drop for StateGuard<S> {
    fn drop(&mut self) {
        self.tx.send_replace(self.idle);
    }
}
