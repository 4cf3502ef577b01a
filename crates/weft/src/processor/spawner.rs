use std::thread;

use crate::error::{Error, Result};

/// Decides where a processing pass runs.
///
/// A pass is a blocking loop that calls the handler for every drained item, so
/// implementations should hand it to a thread that is allowed to block.
pub trait Spawner: Send + Sync + 'static {
    /// Runs `task` off the caller's thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the task could not be scheduled. The task
    /// has then been dropped without running.
    ///
    /// Returning `Ok` and dropping the task anyway is tolerated: the processor
    /// notices the task was discarded and reports it as a spawn failure.
    fn spawn<F>(&self, name: &str, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static;
}

/// Runs every pass on a freshly spawned, named OS thread.
///
/// Passes are short-lived: a thread exists only while there is work to drain.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn<F>(&self, name: &str, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        // Thread names cannot carry interior NULs.
        let thread_name = format!("weft-{}", name.replace('\0', ""));
        thread::Builder::new()
            .name(thread_name)
            .spawn(task)
            .map(drop)
            .map_err(|e| Error::Spawn {
                name: name.to_owned(),
                reason: e.to_string(),
            })
    }
}
