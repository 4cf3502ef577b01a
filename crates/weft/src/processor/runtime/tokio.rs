use tokio::runtime::Handle;

use crate::{error::Result, processor::Spawner};

/// Runs passes on a Tokio runtime's blocking thread pool.
///
/// Handlers are synchronous and may block, so passes go through
/// [`Handle::spawn_blocking`] rather than onto the async workers.
///
/// Once the runtime has shut down, `spawn_blocking` drops the task unrun;
/// `enqueue` then fails with [`Error::Spawn`] and items stay pending.
///
/// [`Error::Spawn`]: crate::Error::Spawn
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running in, if any.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Spawner for TokioSpawner {
    fn spawn<F>(&self, _name: &str, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        // Detached: the pass owns everything it needs.
        drop(self.handle.spawn_blocking(task));
        Ok(())
    }
}
