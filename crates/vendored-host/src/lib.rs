//! External collaborators of vendored
//!
//! [`SourceHost`] abstracts the code host (repository queries, file fetches,
//! pull requests) and [`SourceControl`] abstracts the local git checkout.
//! Production code uses [`GhCli`] and [`GitRepository`]; tests substitute
//! in-memory implementations.

pub mod error;
pub mod gh;
pub mod git;
pub mod host;
pub mod process;

pub use error::{Error, Result};
pub use gh::GhCli;
pub use git::{GitRepository, SourceControl};
pub use host::{PullRequest, PullRequestOutcome, SourceHost};
