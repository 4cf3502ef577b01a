#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
#[cfg(feature = "generator")]
mod generator;
#[cfg(feature = "generator")]
mod id;
mod mutex;
#[cfg(feature = "processor")]
mod processor;
#[cfg(feature = "generator")]
mod time;

pub use crate::error::*;
#[cfg_attr(docsrs, doc(cfg(feature = "generator")))]
#[cfg(feature = "generator")]
pub use crate::generator::*;
#[cfg_attr(docsrs, doc(cfg(feature = "generator")))]
#[cfg(feature = "generator")]
pub use crate::id::*;
pub use crate::mutex::*;
#[cfg_attr(docsrs, doc(cfg(feature = "processor")))]
#[cfg(feature = "processor")]
pub use crate::processor::*;
#[cfg_attr(docsrs, doc(cfg(feature = "generator")))]
#[cfg(feature = "generator")]
pub use crate::time::*;
