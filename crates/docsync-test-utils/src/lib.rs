//! Shared test utilities for the docsync workspace.
//!
//! Dev-dependency only. Kept free of workspace crates so every crate's
//! tests can use it without dependency cycles.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`] builder for a temporary docsync project

pub mod project;

pub use project::TestProject;
