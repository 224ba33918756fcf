//! Test utilities for the localai workspace
//!
//! In-memory stand-ins for the container runtime, the platform fetcher and the
//! operator prompt, plus builders for services documents and project trees.

pub mod helpers;

pub use helpers::catalog_builder::{TestCatalogBuilder, TestServiceBuilder};
pub use helpers::fakes::{FakeFetcher, ScriptedConfirm};
pub use helpers::project::TestProject;
pub use helpers::recording_runtime::RecordingRuntime;
