use crate::{error::Result, processor::Spawner};

/// Runs passes on smol's blocking thread pool via [`smol::unblock`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SmolSpawner;

impl Spawner for SmolSpawner {
    fn spawn<F>(&self, _name: &str, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        smol::unblock(task).detach();
        Ok(())
    }
}
