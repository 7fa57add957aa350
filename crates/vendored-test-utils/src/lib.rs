//! Shared test fixtures for the vendored workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`git`]: git repository fixtures
//! - [`repo`]: [`TestRepo`](repo::TestRepo), a host repository with a control directory
//! - [`host`]: [`FakeHost`](host::FakeHost), an in-memory source host
//! - [`scm`]: [`FakeSourceControl`](scm::FakeSourceControl), a scripted checkout

pub mod git;
pub mod host;
pub mod repo;
pub mod scm;

pub use host::FakeHost;
pub use repo::TestRepo;
pub use scm::FakeSourceControl;
