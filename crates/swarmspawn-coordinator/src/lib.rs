//! swarmspawn-coordinator — the session lifecycle.
//!
//! [`SpawnCoordinator`] sequences topology refresh, placement, and
//! address resolution for each spawn, and implements the [`Spawner`]
//! trait that host frameworks program against.
//!
//! # Components
//!
//! - **`coordinator`** — [`SpawnCoordinator`], deadline and cancellation
//! - **`phase`** — the per-spawn [`SpawnAttempt`] state machine
//! - **`backoff`** — [`RetryPolicy`] and doubling [`Backoff`]
//! - **`spawner`** — the host-facing [`Spawner`] trait

pub mod backoff;
pub mod coordinator;
pub mod error;
pub mod phase;
pub mod spawner;

pub use backoff::{Backoff, RetryPolicy};
pub use coordinator::{SpawnCoordinator, SpawnSettings};
pub use error::{SpawnError, SpawnFailure};
pub use phase::{SpawnAttempt, SpawnPhase};
pub use spawner::{Spawner, SpawnerFuture};
