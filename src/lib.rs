//! shelf application library
//!
//! Wires the hosted data store collaborators into the `books` module and
//! runs it on the shelf HTTP facade.

pub mod bootstrap;
pub mod modules;

pub use bootstrap::{prepare, run, Collaborators};
