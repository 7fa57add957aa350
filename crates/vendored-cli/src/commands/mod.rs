//! Command implementations for vendored-cli

pub mod check;
pub mod install;
pub mod remove;
pub mod validate;

pub use check::run_check;
pub use install::{InstallRequest, run_install};
pub use remove::run_remove;
pub use validate::run_validate;
