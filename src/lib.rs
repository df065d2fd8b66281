//! This crate generates a dynamic loader for Vulkan procedures from the
//! Vulkan XML registry.
//!
//! The registry is parsed with `parse_file` into a `Registry`, turned into the
//! list of core procedures by `Model::from_registry`, annotated by
//! `classify_all` and rendered by `emit::generate` as a C header and source.
//! `run` does all of that and writes the files, optionally compiling them
//! into a static library.

#[cfg(feature = "serialize")]
#[macro_use]
extern crate serde_derive;

mod classify;
mod config;
mod driver;
pub mod emit;
mod model;
mod parse;
mod types;

pub use classify::*;
pub use config::*;
pub use driver::*;
pub use model::*;
pub use parse::parse_file;
pub use parse::parse_stream;
pub use types::*;
