pub mod catalog_builder;
pub mod fakes;
pub mod project;
pub mod recording_runtime;
