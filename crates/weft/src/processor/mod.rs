mod buffered;
mod config;
mod handler;
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
mod runtime;
mod spawner;
mod stats;

pub use buffered::*;
pub use config::*;
pub use handler::*;
#[cfg_attr(docsrs, doc(cfg(any(feature = "async-tokio", feature = "async-smol"))))]
#[cfg(any(feature = "async-tokio", feature = "async-smol"))]
pub use runtime::*;
pub use spawner::*;
pub use stats::*;
