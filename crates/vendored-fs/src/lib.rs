//! Filesystem layer for vendored
//!
//! Resolves paths inside the `.vendored/` control directory and provides the
//! write-temp-then-rename primitives every persisted artifact goes through.

pub mod constants;
pub mod document;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use constants::ControlPath;
pub use document::{load_object, save_object};
pub use error::{Error, Result};
pub use layout::ControlLayout;
pub use path::{NormalizedPath, escapes_root, normalize_relative};
