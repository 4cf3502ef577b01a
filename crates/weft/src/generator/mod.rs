mod config;
mod global;
mod sequential;
mod status;
#[cfg(test)]
mod tests;

pub use config::*;
pub use global::*;
pub use sequential::*;
pub use status::*;
