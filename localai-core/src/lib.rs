pub mod bootstrap;
pub mod cleanup;
pub mod config;
pub mod deps;
pub mod directive;
pub mod env;
pub mod errors;
pub mod first_run;
pub mod gate;
pub mod layout;
pub mod platform;
pub mod process;
pub mod prompt;
pub mod resolve;
pub mod runtime;
pub mod secret;

pub use bootstrap::{Bootstrap, BootstrapReport, LaunchOptions, Stage};
pub use errors::{LaunchError, Result};
pub use layout::ProjectLayout;
